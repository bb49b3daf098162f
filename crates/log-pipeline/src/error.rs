//! 싱크 라이터 에러 타입
//!
//! [`SinkError`]는 로그 한 줄을 처리해 하위 싱크에 쓰는 동안 발생하는 에러를 표현합니다.
//! `From<SinkError> for LogletError`와 `From<SinkError> for std::io::Error` 변환이
//! 구현되어 있어 상위 레이어와 `std::io::Write` 구현 양쪽에서 `?`로 전파할 수 있습니다.

use loglet_core::error::{ConfigError, LogletError};

/// 싱크 라이터 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 하위 싱크가 버퍼 일부만 기록함 (재시도하지 않음)
    #[error("short write: wrote {written} of {expected} bytes")]
    ShortWrite {
        /// 실제로 기록된 바이트 수
        written: usize,
        /// 기록해야 했던 바이트 수
        expected: usize,
    },

    /// 하위 싱크 I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 설정 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<SinkError> for LogletError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(e) => LogletError::Io(e),
            SinkError::Config(e) => LogletError::Config(e),
            short @ SinkError::ShortWrite { .. } => LogletError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                short.to_string(),
            )),
        }
    }
}

impl From<SinkError> for std::io::Error {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(e) => e,
            short @ SinkError::ShortWrite { .. } => {
                std::io::Error::new(std::io::ErrorKind::WriteZero, short.to_string())
            }
            SinkError::Config(e) => std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_write_display() {
        let err = SinkError::ShortWrite {
            written: 3,
            expected: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains("10"));
    }

    #[test]
    fn converts_to_loglet_error() {
        let err = SinkError::Config(ConfigError::UnknownLevel("TRACE".to_owned()));
        let loglet_err: LogletError = err.into();
        assert!(matches!(loglet_err, LogletError::Config(_)));
    }

    #[test]
    fn short_write_converts_to_write_zero() {
        let err = SinkError::ShortWrite {
            written: 0,
            expected: 5,
        };
        let io: std::io::Error = err.into();
        assert_eq!(io.kind(), std::io::ErrorKind::WriteZero);
    }

    #[test]
    fn io_error_passes_through() {
        let err = SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "closed",
        ));
        let io: std::io::Error = err.into();
        assert_eq!(io.kind(), std::io::ErrorKind::BrokenPipe);
    }
}
