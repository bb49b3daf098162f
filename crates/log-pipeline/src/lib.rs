#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`level`]: 레벨 토큰 감지 ([`level::detect`]) 및 최소 레벨 필터 ([`LevelGate`])
//! - [`color`]: 레벨/접두사 → ANSI SGR 색상 매핑
//! - [`timefmt`]: 고정 폭 타임스탬프 포맷터
//! - [`caller`]: 호출 위치(파일:줄) 해석
//! - [`record`]: 레코드 조립 및 pretty/JSON 직렬화
//! - [`pool`]: 레코드 재사용 풀
//! - [`writer`]: 외부 바이트 싱크 계약을 구현하는 [`SinkWriter`]
//! - [`global`]: 프로세스 전역 기본 싱크와 로그 매크로
//! - [`layer`]: `tracing` 이벤트를 싱크로 보내는 [`SinkLayer`]
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! write(bytes) -> LevelDetector -> LevelGate -> RecordBuilder -> underlying sink
//!                                   (early exit)   |
//!                          TimeFormatter / CallerResolver / ColorResolver
//! ```

pub mod caller;
pub mod color;
pub mod error;
pub mod global;
pub mod layer;
pub mod level;
pub mod pool;
pub mod record;
pub mod timefmt;
pub mod writer;

// --- 주요 타입 re-export ---

// 싱크 라이터
pub use writer::{SinkWriter, SinkWriterBuilder};

// 에러
pub use error::SinkError;

// 레벨
pub use level::{Detection, LevelGate, Spelling};

// 색상
pub use color::ColorResolver;

// 레코드
pub use record::{CallSite, Record, RecordBuilder};

// 풀
pub use pool::{PooledRecord, RecordPool};

// tracing 연동
pub use layer::SinkLayer;

// core 타입
pub use loglet_core::{Color, CustomColor, Flags, Format, Level, Style, WriteErrorPolicy};
