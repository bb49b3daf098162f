//! `tracing` 연동 레이어
//!
//! [`SinkLayer`]는 `tracing` 이벤트를 [`SinkWriter`]로 보냅니다.
//! 레벨은 이벤트 메타데이터에서 고정되며(TRACE, DEBUG는 Debug),
//! 호출 위치도 메타데이터의 파일과 줄을 사용합니다.
//!
//! 메시지 필드를 먼저 쓰고, 나머지 필드는 ` key=value` 형태로 뒤에 붙입니다.

use std::fmt;
use std::io::Write as _;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use loglet_core::Level;

use crate::record::CallSite;
use crate::writer::SinkWriter;

/// `tracing` 이벤트를 싱크 라이터로 보내는 레이어
#[derive(Debug, Clone)]
pub struct SinkLayer {
    writer: Arc<SinkWriter>,
}

impl SinkLayer {
    /// 라이터로 레이어를 생성합니다.
    pub fn new(writer: Arc<SinkWriter>) -> Self {
        Self { writer }
    }

    /// 대상 라이터를 반환합니다.
    pub fn writer(&self) -> &Arc<SinkWriter> {
        &self.writer
    }
}

/// `tracing` 레벨을 싱크 레벨로 변환합니다.
pub fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::ERROR => Level::Error,
    }
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = map_level(metadata.level());
        let site = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => CallSite::Source { file, line },
            _ => CallSite::Unknown,
        };

        // 쓰기 실패는 이벤트를 발생시킨 쪽으로 되돌릴 방법이 없다
        let _ = self.writer.log_with(Some(level), site, |buf| {
            event.record(&mut MessageVisitor { buf: &mut *buf });
            event.record(&mut FieldVisitor { buf: &mut *buf });
        });
    }
}

/// `message` 필드만 기록하는 방문자
struct MessageVisitor<'a> {
    buf: &'a mut Vec<u8>,
}

impl Visit for MessageVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.buf.extend_from_slice(value.as_bytes());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.buf, "{value:?}");
        }
    }
}

/// `message` 이외의 필드를 ` key=value`로 기록하는 방문자
struct FieldVisitor<'a> {
    buf: &'a mut Vec<u8>,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() != "message" {
            let _ = write!(self.buf, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() != "message" {
            let _ = write!(self.buf, " {}={:?}", field.name(), value);
        }
    }
}
