//! 설정 관리 -- loglet.toml 파싱 및 런타임 설정
//!
//! [`SinkConfig`]는 싱크 라이터 하나의 전체 설정(출력 형식, 필드 플래그,
//! 색상, 최소 레벨, 사용자 정의 색상)을 담는 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 코드에서 호출하는 setter (최고 우선)
//! 2. 환경변수 (`LOGLET_MIN_LEVEL=WARN` 형식)
//! 3. 설정 파일 (`loglet.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), loglet_core::error::LogletError> {
//! use loglet_core::config::SinkConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SinkConfig::load("loglet.toml")?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SinkConfig::parse("format = \"json\"\nmin_level = \"INFO\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogletError};
use crate::types::{CustomColor, Flags, Format, Level, WriteErrorPolicy};

/// 싱크 라이터 설정
///
/// `loglet.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// 출력 형식 (pretty, json)
    pub format: Format,
    /// 터미널 색상 출력 여부
    pub color: bool,
    /// 최소 레벨 (levels 목록 중 하나)
    pub min_level: String,
    /// 인식할 레벨 이름 목록 (심각도 오름차순)
    pub levels: Vec<String>,
    /// 타임스탬프 설정
    pub time: TimeConfig,
    /// 호출 위치 출력 방식
    pub caller: CallerMode,
    /// 싱크 쓰기 실패 처리 정책
    pub on_write_error: WriteErrorPolicy,
    /// 사용자 정의 색상 목록
    pub colors: Vec<ColorRule>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            format: Format::Pretty,
            color: true,
            min_level: Level::Debug.long_name().to_owned(),
            levels: Level::default_names(),
            time: TimeConfig::default(),
            caller: CallerMode::None,
            on_write_error: WriteErrorPolicy::Propagate,
            colors: Vec::new(),
        }
    }
}

impl SinkConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogletError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LogletError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogletError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogletError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogletError> {
        toml::from_str(toml_str).map_err(|e| {
            LogletError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGLET_{FIELD}`, 타임스탬프는 `LOGLET_TIME_{FIELD}`
    /// 예: `LOGLET_FORMAT=json`, `LOGLET_TIME_UTC=true`
    pub fn apply_env_overrides(&mut self) {
        override_parsed(&mut self.format, "LOGLET_FORMAT", Format::from_str_loose);
        override_bool(&mut self.color, "LOGLET_COLOR");
        override_string(&mut self.min_level, "LOGLET_MIN_LEVEL");
        override_csv(&mut self.levels, "LOGLET_LEVELS");
        override_parsed(&mut self.caller, "LOGLET_CALLER", CallerMode::from_str_loose);
        override_parsed(
            &mut self.on_write_error,
            "LOGLET_ON_WRITE_ERROR",
            |s| match s.to_lowercase().as_str() {
                "propagate" => Some(WriteErrorPolicy::Propagate),
                "report" => Some(WriteErrorPolicy::Report),
                _ => None,
            },
        );

        // Time
        override_bool(&mut self.time.date, "LOGLET_TIME_DATE");
        override_bool(&mut self.time.time, "LOGLET_TIME_TIME");
        override_bool(&mut self.time.microseconds, "LOGLET_TIME_MICROSECONDS");
        override_bool(&mut self.time.utc, "LOGLET_TIME_UTC");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogletError> {
        if self.levels.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "levels".to_owned(),
                reason: "level list must not be empty".to_owned(),
            }
            .into());
        }

        if self.levels.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "levels".to_owned(),
                reason: "level names must not be empty".to_owned(),
            }
            .into());
        }

        if !self.levels.contains(&self.min_level) {
            return Err(ConfigError::InvalidValue {
                field: "min_level".to_owned(),
                reason: format!("must be one of: {}", self.levels.join(", ")),
            }
            .into());
        }

        if self.time.microseconds && !self.time.time {
            return Err(ConfigError::InvalidValue {
                field: "time.microseconds".to_owned(),
                reason: "microseconds require time.time to be enabled".to_owned(),
            }
            .into());
        }

        for rule in &self.colors {
            if rule.prefix.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "colors.prefix".to_owned(),
                    reason: "prefix must not be empty".to_owned(),
                }
                .into());
            }
            rule.to_custom_color()?;
        }

        Ok(())
    }

    /// 설정에서 필드 플래그 비트마스크를 계산합니다.
    pub fn flags(&self) -> Flags {
        let mut flags = Flags::empty();
        flags.set(Flags::DATE, self.time.date);
        flags.set(Flags::TIME, self.time.time);
        flags.set(Flags::MICROSECONDS, self.time.microseconds);
        flags.set(Flags::UTC, self.time.utc);
        match self.caller {
            CallerMode::None => {}
            CallerMode::Short => flags |= Flags::SHORT_FILE,
            CallerMode::Long => flags |= Flags::LONG_FILE,
        }
        flags
    }

    /// 사용자 정의 색상 목록을 `(키, 색상)` 쌍으로 변환합니다.
    pub fn custom_colors(&self) -> Result<Vec<(String, CustomColor)>, ConfigError> {
        self.colors
            .iter()
            .map(|rule| Ok((rule.prefix.clone(), rule.to_custom_color()?)))
            .collect()
    }
}

/// 타임스탬프 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// 날짜 출력
    pub date: bool,
    /// 시각 출력
    pub time: bool,
    /// 마이크로초 출력 (time 필요)
    pub microseconds: bool,
    /// UTC 변환
    pub utc: bool,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            date: true,
            time: true,
            microseconds: false,
            utc: false,
        }
    }
}

/// 호출 위치 출력 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerMode {
    /// 출력하지 않음 (기본값)
    #[default]
    None,
    /// 파일 이름만
    Short,
    /// 전체 경로
    Long,
}

impl CallerMode {
    /// 문자열에서 호출 위치 모드를 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Some(Self::None),
            "short" => Some(Self::Short),
            "long" | "full" => Some(Self::Long),
            _ => None,
        }
    }
}

/// 사용자 정의 색상 규칙
///
/// ```toml
/// [[colors]]
/// prefix = "[ERROR]"
/// foreground = 61
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRule {
    /// 레벨 이름 또는 리터럴 접두사
    pub prefix: String,
    /// 전경색 팔레트 인덱스 (0~7, 60~67)
    pub foreground: i64,
    /// 배경색 팔레트 인덱스
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<i64>,
    /// 스타일 (0~9)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<i64>,
}

impl ColorRule {
    /// 규칙을 [`CustomColor`]로 변환합니다.
    pub fn to_custom_color(&self) -> Result<CustomColor, ConfigError> {
        let mut components = vec![self.foreground];
        match (self.background, self.style) {
            (Some(bg), Some(style)) => components.extend([bg, style]),
            (Some(bg), None) => components.push(bg),
            (None, Some(_)) => {
                return Err(ConfigError::InvalidColor {
                    key: self.prefix.clone(),
                    reason: "style requires a background component".to_owned(),
                });
            }
            (None, None) => {}
        }
        CustomColor::from_components(&self.prefix, &components)
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_parsed<T>(target: &mut T, env_key: &str, parse: impl Fn(&str) -> Option<T>) {
    if let Ok(val) = std::env::var(env_key) {
        match parse(&val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key,
                value = val.as_str(),
                "unrecognized value in env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}
