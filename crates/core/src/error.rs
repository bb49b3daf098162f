//! 에러 타입 -- 도메인별 에러 정의

/// loglet 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogletError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
///
/// 설정 에러는 로그 호출 시점이 아니라 설정 시점에 즉시 보고됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 잘못된 사용자 정의 색상
    #[error("invalid custom color for '{key}': {reason}")]
    InvalidColor { key: String, reason: String },

    /// 레벨 목록에 없는 레벨 이름
    #[error("unknown level: {0}")]
    UnknownLevel(String),
}
