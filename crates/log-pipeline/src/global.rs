//! 프로세스 전역 기본 싱크
//!
//! 처음 사용할 때 표준 에러로 출력하는 [`SinkWriter`]를 만듭니다.
//! [`install`]은 새 전역 라이터를 쌓고 이전 라이터를 반환하며,
//! [`uninstall`]은 가장 최근에 설치한 라이터를 내려 이전 라이터를 복원합니다.
//!
//! 로그 매크로(`debug!`, `info!`, `warn!`, `error!`, `panic_log!`, `log!`)는
//! 모두 현재 전역 라이터로 기록하며, 쓰기 실패는 무시합니다.
//!
//! ```
//! use std::sync::Arc;
//! use loglet_pipeline::{global, Flags, SinkWriter};
//!
//! let writer = Arc::new(
//!     SinkWriter::builder()
//!         .output(Vec::new())
//!         .flags(Flags::empty())
//!         .build()
//!         .unwrap(),
//! );
//! let _previous = global::install(writer);
//! loglet_pipeline::info!("listening on {}", 8080);
//! global::uninstall();
//! ```

use std::fmt;
use std::panic::Location;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use loglet_core::Level;

use crate::error::SinkError;
use crate::record::CallSite;
use crate::writer::SinkWriter;

/// 설치된 전역 라이터 스택 (마지막이 현재)
static INSTALLED: RwLock<Vec<Arc<SinkWriter>>> = parking_lot::const_rwlock(Vec::new());

/// 아무것도 설치되지 않았을 때의 기본 라이터
static DEFAULT: OnceLock<Arc<SinkWriter>> = OnceLock::new();

/// 현재 전역 라이터를 반환합니다.
pub fn get() -> Arc<SinkWriter> {
    if let Some(current) = INSTALLED.read().last() {
        return Arc::clone(current);
    }
    fallback()
}

fn fallback() -> Arc<SinkWriter> {
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(SinkWriter::stderr())))
}

/// 새 전역 라이터를 설치하고 이전 전역 라이터를 반환합니다.
pub fn install(writer: Arc<SinkWriter>) -> Arc<SinkWriter> {
    let (previous, depth) = {
        let mut installed = INSTALLED.write();
        let previous = installed.last().cloned();
        installed.push(writer);
        (previous, installed.len())
    };
    tracing::debug!(depth, "global sink installed");
    previous.unwrap_or_else(fallback)
}

/// 가장 최근에 설치한 전역 라이터를 제거하고 반환합니다.
///
/// 설치된 라이터가 없으면 `None`이며, 기본 라이터는 제거되지 않습니다.
pub fn uninstall() -> Option<Arc<SinkWriter>> {
    let removed = INSTALLED.write().pop();
    if removed.is_some() {
        tracing::debug!("global sink uninstalled");
    }
    removed
}

/// 현재 전역 라이터에 레벨을 지정해 기록합니다.
#[track_caller]
pub fn log(level: Level, args: fmt::Arguments<'_>) -> Result<(), SinkError> {
    get().log(level, args)
}

/// 현재 전역 라이터에 레벨 없이 기록합니다. 메시지 앞의 레벨 토큰은 감지됩니다.
#[track_caller]
pub fn print(args: fmt::Arguments<'_>) -> Result<(), SinkError> {
    get().print(args)
}

/// 현재 전역 라이터에 PANIC 레벨로 기록한 뒤 같은 메시지로 패닉합니다.
#[track_caller]
pub fn panic(args: fmt::Arguments<'_>) -> ! {
    let location = Location::caller();
    let _ = get().log_with(Some(Level::Panic), CallSite::Location(location), |buf| {
        let _ = std::io::Write::write_fmt(buf, args);
    });
    std::panic::panic_any(args.to_string())
}

/// DEBUG 레벨로 전역 싱크에 기록합니다.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {{
        let _ = $crate::global::log($crate::Level::Debug, ::std::format_args!($($arg)+));
    }};
}

/// INFO 레벨로 전역 싱크에 기록합니다.
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {{
        let _ = $crate::global::log($crate::Level::Info, ::std::format_args!($($arg)+));
    }};
}

/// WARN 레벨로 전역 싱크에 기록합니다.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {{
        let _ = $crate::global::log($crate::Level::Warn, ::std::format_args!($($arg)+));
    }};
}

/// ERROR 레벨로 전역 싱크에 기록합니다.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {{
        let _ = $crate::global::log($crate::Level::Error, ::std::format_args!($($arg)+));
    }};
}

/// PANIC 레벨로 전역 싱크에 기록한 뒤 패닉합니다.
#[macro_export]
macro_rules! panic_log {
    ($($arg:tt)+) => {
        $crate::global::panic(::std::format_args!($($arg)+))
    };
}

/// 레벨 없이 전역 싱크에 기록합니다. 메시지 앞의 레벨 토큰은 감지됩니다.
#[macro_export]
macro_rules! log {
    ($($arg:tt)+) => {{
        let _ = $crate::global::print(::std::format_args!($($arg)+));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use loglet_core::Flags;
    use parking_lot::Mutex;
    use serial_test::serial;
    use std::io::Write;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(flags: Flags) -> (Arc<SinkWriter>, SharedBuf) {
        let sink = SharedBuf::default();
        let writer = SinkWriter::builder()
            .output(sink.clone())
            .flags(flags)
            .build()
            .unwrap();
        (Arc::new(writer), sink)
    }

    #[test]
    #[serial]
    fn default_writer_is_created_once() {
        let first = get();
        let second = get();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    #[serial]
    fn install_returns_previous_and_uninstall_restores_it() {
        let before = get();
        let (writer, _sink) = capture(Flags::empty());

        let previous = install(Arc::clone(&writer));
        assert!(Arc::ptr_eq(&previous, &before));
        assert!(Arc::ptr_eq(&get(), &writer));

        let removed = uninstall().unwrap();
        assert!(Arc::ptr_eq(&removed, &writer));
        assert!(Arc::ptr_eq(&get(), &before));
    }

    #[test]
    #[serial]
    fn nested_installs_unwind_in_order() {
        let (outer, _a) = capture(Flags::empty());
        let (inner, _b) = capture(Flags::empty());

        install(Arc::clone(&outer));
        let previous = install(Arc::clone(&inner));
        assert!(Arc::ptr_eq(&previous, &outer));

        uninstall();
        assert!(Arc::ptr_eq(&get(), &outer));
        uninstall();
    }

    #[test]
    #[serial]
    fn macros_write_to_installed_writer() {
        let (writer, sink) = capture(Flags::empty());
        install(writer);

        crate::debug!("cache {}", "miss");
        crate::info!("listening on {}", 8080);
        crate::warn!("low disk");
        crate::error!("failed: {}", "timeout");
        crate::log!("[ERROR] detected {}", 1);

        uninstall();
        assert_eq!(
            sink.contents(),
            "DBG cache miss\nINF listening on 8080\nWRN low disk\nERR failed: timeout\nERROR detected 1\n"
        );
    }

    #[test]
    #[serial]
    fn macros_capture_call_site() {
        let (writer, sink) = capture(Flags::SHORT_FILE);
        install(writer);

        let line = line!() + 1;
        crate::info!("here");

        uninstall();
        assert_eq!(sink.contents(), format!("global.rs:{line} INF here\n"));
    }

    #[test]
    #[serial]
    fn panic_log_writes_then_panics() {
        let (writer, sink) = capture(Flags::empty());
        install(writer);

        let result = std::panic::catch_unwind(|| {
            crate::panic_log!("fatal {}", 42);
        });

        uninstall();
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("fatal 42"));
        assert_eq!(sink.contents(), "PNC fatal 42\n");
    }
}
