//! 레코드 조립 및 직렬화
//!
//! [`RecordBuilder`]는 한 번의 로그 호출을 다음 순서로 처리합니다.
//!
//! 1. 호출 지점에서 레벨을 지정하지 않았으면 [`detect`]로 토큰을 찾아 떼어냄
//! 2. [`LevelGate`]로 필터링 (거부되면 레코드를 풀에서 꺼내지도 않음)
//! 3. 호출 위치 플래그가 있으면 호출 위치 해석
//! 4. 타임스탬프 플래그가 있으면 현재 시각 기록
//! 5. pretty 또는 JSON으로 직렬화
//!
//! 직렬화는 실패하지 않습니다. 설정 오류는 설정 시점에 이미 보고됩니다.

mod json;

pub use json::escape_into;

use std::io::Write as _;
use std::panic::Location;

use chrono::{DateTime, Utc};

use loglet_core::{Flags, Format, Level};

use crate::caller;
use crate::color::{ColorResolver, ESCAPE_CLOSE};
use crate::level::{LevelGate, Spelling, detect};
use crate::pool::{PooledRecord, RecordPool};
use crate::timefmt::{append_decimal, append_timestamp};

/// 로그 호출 한 번에 대응하는 레코드
///
/// 풀에서 재사용되므로 모든 버퍼는 길이만 0으로 되돌리고 용량은 유지합니다.
#[derive(Debug, Default)]
pub struct Record {
    /// 직렬화된 출력 라인
    pub(crate) buf: Vec<u8>,
    /// 레벨 토큰을 제거한 메시지
    pub(crate) message: Vec<u8>,
    /// 감지되었거나 지정된 레벨
    pub(crate) level: Option<Level>,
    /// 레벨 토큰 표기 형태
    pub(crate) spelling: Option<Spelling>,
    /// 기록 시각 (`None`이면 zero value)
    pub(crate) time: Option<DateTime<Utc>>,
    /// 호출 위치 파일
    pub(crate) file: String,
    /// 호출 위치 줄
    pub(crate) line: u32,
    /// 호출 위치 필드 출력 여부
    pub(crate) has_caller: bool,
}

impl Record {
    /// 재사용을 위해 모든 필드를 비웁니다 (버퍼 용량은 유지).
    pub fn clear(&mut self) {
        self.buf.clear();
        self.message.clear();
        self.level = None;
        self.spelling = None;
        self.time = None;
        self.file.clear();
        self.line = 0;
        self.has_caller = false;
    }

    /// 직렬화된 출력 라인 (`\n` 포함)
    pub fn output(&self) -> &[u8] {
        &self.buf
    }

    /// 메시지 본문 (레벨 토큰 제거 후)
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// 레코드 레벨
    pub fn level(&self) -> Option<Level> {
        self.level
    }

    /// 호출 위치 (파일, 줄)
    pub fn caller(&self) -> Option<(&str, u32)> {
        self.has_caller.then_some((self.file.as_str(), self.line))
    }

    /// 풀 반환 여부 판단에 쓰는 가장 큰 버퍼 용량
    pub fn capacity(&self) -> usize {
        self.buf
            .capacity()
            .max(self.message.capacity())
            .max(self.file.capacity())
    }
}

/// 호출 위치를 얻는 방법
#[derive(Debug, Clone, Copy)]
pub enum CallSite<'a> {
    /// `#[track_caller]`로 전달된 위치
    Location(&'static Location<'static>),
    /// 이미 알고 있는 파일과 줄 (예: `tracing` 메타데이터)
    Source {
        /// 파일 경로
        file: &'a str,
        /// 줄 번호
        line: u32,
    },
    /// [`RecordBuilder`] 내부 프레임 기준으로 건너뛸 스택 프레임 수
    Walk(usize),
    /// 알 수 없음
    Unknown,
}

/// 레코드 조립기
///
/// 라이터의 현재 설정을 빌려 레코드를 채우고 직렬화합니다.
#[derive(Debug, Clone, Copy)]
pub struct RecordBuilder<'a> {
    /// 출력 형식
    pub format: Format,
    /// 필드 플래그
    pub flags: Flags,
    /// 색상 출력 여부 (JSON에서는 무시)
    pub color: bool,
    /// 최소 레벨 필터
    pub gate: &'a LevelGate,
    /// 색상 해석기
    pub colors: &'a ColorResolver,
    /// 현재 시각 공급자
    pub clock: fn() -> DateTime<Utc>,
}

impl<'a> RecordBuilder<'a> {
    /// 원시 메시지 바이트로 레코드를 만듭니다.
    ///
    /// `pinned`가 `None`이면 메시지 앞의 레벨 토큰을 감지합니다.
    /// 레벨 필터에 걸리면 풀에 손대지 않고 `None`을 반환합니다.
    #[inline(never)]
    pub fn build<'p>(
        &self,
        pool: &'p RecordPool,
        pinned: Option<Level>,
        message: &[u8],
        site: CallSite<'_>,
    ) -> Option<PooledRecord<'p>> {
        let (level, spelling, rest) = match pinned {
            Some(level) => (Some(level), Some(Spelling::Short), message),
            None => {
                let (detection, rest) = detect(message);
                (
                    detection.map(|d| d.level),
                    detection.map(|d| d.spelling),
                    rest,
                )
            }
        };

        if !self.gate.allow(level) {
            return None;
        }

        let mut record = pool.acquire();
        record.message.extend_from_slice(rest);
        self.finish(&mut record, level, spelling, site);
        Some(record)
    }

    /// 메시지를 레코드의 메시지 버퍼에 직접 채워 넣어 레코드를 만듭니다.
    ///
    /// 레벨이 지정된 경우 필터 검사를 먼저 하므로, 거부되면 `fill`은 호출되지 않습니다.
    /// 레벨이 지정되지 않았으면 채운 뒤에 토큰을 감지해 제자리에서 떼어냅니다.
    pub fn build_with<'p, F>(
        &self,
        pool: &'p RecordPool,
        pinned: Option<Level>,
        fill: F,
        site: CallSite<'_>,
    ) -> Option<PooledRecord<'p>>
    where
        F: FnOnce(&mut Vec<u8>),
    {
        if pinned.is_some() && !self.gate.allow(pinned) {
            return None;
        }

        let mut record = pool.acquire();
        fill(&mut record.message);
        self.build_filled(record, pinned, site)
    }

    /// 메시지 버퍼가 이미 채워진 레코드를 마무리합니다.
    ///
    /// 끝의 개행 하나를 떼어내고, 레벨이 지정되지 않았으면 토큰을 감지해
    /// 제자리에서 떼어낸 뒤 필터를 적용합니다. 거부된 레코드는 풀로 돌아갑니다.
    #[inline(never)]
    pub fn build_filled<'p>(
        &self,
        mut record: PooledRecord<'p>,
        pinned: Option<Level>,
        site: CallSite<'_>,
    ) -> Option<PooledRecord<'p>> {
        if record.message.last() == Some(&b'\n') {
            record.message.pop();
        }

        let (level, spelling) = match pinned {
            Some(level) => (Some(level), Some(Spelling::Short)),
            None => {
                let (detection, rest) = detect(&record.message);
                let offset = record.message.len() - rest.len();
                let found = (detection.map(|d| d.level), detection.map(|d| d.spelling));
                record.message.drain(..offset);
                found
            }
        };
        if !self.gate.allow(level) {
            return None;
        }

        self.finish(&mut record, level, spelling, site);
        Some(record)
    }

    /// 포맷 인자로 레코드를 만듭니다. 중간 `String`을 만들지 않습니다.
    pub fn build_formatted<'p>(
        &self,
        pool: &'p RecordPool,
        pinned: Option<Level>,
        args: std::fmt::Arguments<'_>,
        site: CallSite<'_>,
    ) -> Option<PooledRecord<'p>> {
        self.build_with(
            pool,
            pinned,
            |buf| {
                // Vec<u8>에 대한 쓰기는 실패하지 않는다
                let _ = buf.write_fmt(args);
            },
            site,
        )
    }

    /// 레벨, 호출 위치, 시각을 채우고 직렬화합니다.
    #[inline(never)]
    fn finish(
        &self,
        record: &mut Record,
        level: Option<Level>,
        spelling: Option<Spelling>,
        site: CallSite<'_>,
    ) {
        record.level = level;
        record.spelling = spelling;

        if self.flags.has_caller() {
            let short = self.flags.contains(Flags::SHORT_FILE);
            record.has_caller = true;
            match site {
                CallSite::Location(location) => {
                    let (file, line) = caller::from_location(location, short);
                    record.file.push_str(file);
                    record.line = line;
                }
                CallSite::Source { file, line } => {
                    record
                        .file
                        .push_str(if short { caller::shorten(file) } else { file });
                    record.line = line;
                }
                CallSite::Walk(skip) => {
                    let (file, line) = caller::resolve(skip, short);
                    record.file.push_str(&file);
                    record.line = line;
                }
                CallSite::Unknown => {
                    record.file.push_str(caller::UNKNOWN_FILE);
                    record.line = 0;
                }
            }
        }

        if self.flags.has_timestamp() {
            record.time = Some((self.clock)());
        }

        self.render(record);
    }

    /// 레코드를 현재 형식으로 직렬화합니다.
    ///
    /// 출력 버퍼를 비우고 처음부터 다시 쓰므로 같은 레코드를 두 번 직렬화해도
    /// 결과가 같습니다.
    pub fn render(&self, record: &mut Record) {
        match self.format {
            Format::Pretty => self.render_pretty(record),
            Format::Json => json::render(record, self.flags),
        }
    }

    fn render_pretty(&self, record: &mut Record) {
        let (level, spelling, time) = (record.level, record.spelling, record.time);
        let (line, has_caller) = (record.line, record.has_caller);
        let Record {
            buf, message, file, ..
        } = record;
        buf.clear();

        let opened = self.color
            && match level {
                Some(level) => {
                    self.colors.push_level_open(buf, level);
                    true
                }
                None => self.colors.push_prefix_open(buf, message),
            };
        let header_start = buf.len();

        if self.flags.has_timestamp() {
            append_timestamp(buf, time, self.flags);
        }

        if has_caller {
            push_separator(buf, header_start);
            buf.extend_from_slice(file.as_bytes());
            buf.push(b':');
            append_decimal(buf, line);
        }

        if let Some(level) = level {
            push_separator(buf, header_start);
            let tag = match spelling {
                Some(Spelling::Long) => level.long_name(),
                _ => level.short_name(),
            };
            buf.extend_from_slice(tag.as_bytes());
        }

        // 줄바꿈은 색상 닫기 뒤에 정확히 하나만 쓴다
        let body = trim_newlines(message);
        if let Some(&first) = body.first() {
            if first != b' ' {
                push_separator(buf, header_start);
            }
            buf.extend_from_slice(body);
        }

        if opened {
            buf.extend_from_slice(ESCAPE_CLOSE);
        }
        buf.push(b'\n');
    }
}

/// 메시지 끝의 줄바꿈을 모두 떼어낸 슬라이스를 반환합니다.
fn trim_newlines(message: &[u8]) -> &[u8] {
    let end = message
        .iter()
        .rposition(|&b| b != b'\n')
        .map_or(0, |idx| idx + 1);
    &message[..end]
}

/// 앞에 헤더 필드가 있고 공백으로 끝나지 않았으면 공백 하나를 씁니다.
fn push_separator(buf: &mut Vec<u8>, header_start: usize) {
    if buf.len() > header_start && buf.last() != Some(&b' ') {
        buf.push(b' ');
    }
}
