//! 레벨 처리 모듈 -- 토큰 감지 및 최소 레벨 필터
//!
//! - [`detect`]: 메시지 앞부분의 `[LEVEL]` / `LEVEL ` 토큰을 찾아 떼어냅니다.
//! - [`LevelGate`]: 레벨 목록과 최소 레벨로 출력 여부를 결정합니다.
//!
//! # 사용 예시
//! ```
//! use loglet_pipeline::level::{detect, LevelGate};
//! use loglet_core::Level;
//!
//! let (detection, rest) = detect(b"[ERROR] disk full");
//! assert_eq!(detection.map(|d| d.level), Some(Level::Error));
//! assert_eq!(rest, b"disk full");
//!
//! let gate = LevelGate::with_min_level("INFO");
//! assert!(gate.allow(Some(Level::Error)));
//! assert!(!gate.allow(Some(Level::Debug)));
//! assert!(gate.allow(None));
//! ```

pub mod detect;
pub mod gate;

pub use detect::{Detection, Spelling, detect};
pub use gate::LevelGate;
