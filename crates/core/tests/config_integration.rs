//! loglet.toml 통합 설정 테스트
//!
//! - loglet.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use std::io::Write;

use loglet_core::config::{CallerMode, SinkConfig};
use loglet_core::error::{ConfigError, LogletError};
use loglet_core::{Color, CustomColor, Flags, Format, Style, WriteErrorPolicy};

// =============================================================================
// loglet.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../loglet.toml.example");
    let config = SinkConfig::parse(content).expect("example config should parse");

    assert_eq!(config.format, Format::Pretty);
    assert!(config.color);
    assert_eq!(config.min_level, "INFO");
    assert_eq!(config.levels, ["DEBUG", "INFO", "WARN", "ERROR", "PANIC"]);
    assert_eq!(config.caller, CallerMode::None);
    assert_eq!(config.on_write_error, WriteErrorPolicy::Propagate);
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../loglet.toml.example");
    let config = SinkConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_colors_resolve() {
    let content = include_str!("../../../loglet.toml.example");
    let config = SinkConfig::parse(content).expect("should parse");

    let colors = config.custom_colors().expect("colors should resolve");
    assert_eq!(colors.len(), 2);
    assert_eq!(colors[0].0, "[ERROR]");
    assert_eq!(colors[0].1, CustomColor::new(Color::HiRed));
    assert_eq!(colors[1].0, "WARN");
    assert_eq!(
        colors[1].1,
        CustomColor::new(Color::Yellow)
            .on(Color::Black)
            .with_style(Style::Bold)
    );
    assert_eq!(colors[1].1.fragment(), "1;33;40;");
}

#[test]
fn example_config_matches_code_defaults_except_min_level() {
    let content = include_str!("../../../loglet.toml.example");
    let example = SinkConfig::parse(content).expect("should parse");
    let defaults = SinkConfig::default();

    assert_eq!(example.format, defaults.format);
    assert_eq!(example.color, defaults.color);
    assert_eq!(example.levels, defaults.levels);
    assert_eq!(example.time, defaults.time);
    assert_eq!(example.caller, defaults.caller);
    assert_eq!(example.on_write_error, defaults.on_write_error);
    assert_eq!(defaults.min_level, "DEBUG");
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_format_only() {
    let config = SinkConfig::parse("format = \"json\"").expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.format, Format::Json);
    assert_eq!(config.min_level, "DEBUG");
    assert_eq!(config.flags(), Flags::STD);
}

#[test]
fn partial_config_time_section_only() {
    let toml = r#"
[time]
microseconds = true
utc = true
"#;
    let config = SinkConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert!(config.time.date);
    assert!(config.time.time);
    assert_eq!(
        config.flags(),
        Flags::STD | Flags::MICROSECONDS | Flags::UTC
    );
}

#[test]
fn partial_config_caller_long() {
    let config = SinkConfig::parse("caller = \"long\"").expect("should parse");
    assert_eq!(config.flags(), Flags::STD | Flags::LONG_FILE);
    assert!(config.flags().has_caller());
}

#[test]
fn partial_config_custom_levels() {
    let toml = r#"
levels = ["TRACE", "NOTICE", "ALERT"]
min_level = "NOTICE"
"#;
    let config = SinkConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");
    assert_eq!(config.levels, ["TRACE", "NOTICE", "ALERT"]);
}

#[test]
fn partial_config_all_fields_disabled() {
    let toml = r#"
color = false

[time]
date = false
time = false
"#;
    let config = SinkConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");
    assert!(config.flags().is_empty());
    assert!(!config.flags().has_timestamp());
}

// =============================================================================
// 검증 실패 테스트
// =============================================================================

#[test]
fn min_level_outside_levels_is_rejected() {
    let config = SinkConfig::parse("min_level = \"VERBOSE\"").expect("should parse");
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        LogletError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "min_level"
    ));
}

#[test]
fn empty_levels_are_rejected() {
    let config = SinkConfig::parse("levels = []").expect("should parse");
    assert!(config.validate().is_err());
}

#[test]
fn microseconds_without_time_are_rejected() {
    let toml = r#"
[time]
time = false
microseconds = true
"#;
    let config = SinkConfig::parse(toml).expect("should parse");
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("time.microseconds"));
}

#[test]
fn out_of_range_color_is_rejected() {
    let toml = r#"
[[colors]]
prefix = "[ERROR]"
foreground = 42
"#;
    let config = SinkConfig::parse(toml).expect("should parse");
    assert!(matches!(
        config.validate().unwrap_err(),
        LogletError::Config(ConfigError::InvalidColor { .. })
    ));
}

#[test]
fn style_without_background_is_rejected() {
    let toml = r#"
[[colors]]
prefix = "INFO"
foreground = 2
style = 1
"#;
    let config = SinkConfig::parse(toml).expect("should parse");
    assert!(config.validate().is_err());
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

/// 환경변수를 설정한 채로 클로저를 실행하고 원래 값을 복원합니다.
fn with_env<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    // SAFETY: 테스트는 serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var(key, value);
    }

    let result = f();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let config = with_env("LOGLET_MIN_LEVEL", "ERROR", || {
        let mut config = SinkConfig::parse("min_level = \"INFO\"").expect("should parse");
        config.apply_env_overrides();
        config
    });

    assert_eq!(config.min_level, "ERROR");
}

#[test]
#[serial_test::serial]
fn env_override_format_is_case_insensitive() {
    let config = with_env("LOGLET_FORMAT", "JSON", || {
        let mut config = SinkConfig::default();
        config.apply_env_overrides();
        config
    });

    assert_eq!(config.format, Format::Json);
}

#[test]
#[serial_test::serial]
fn env_override_csv_for_levels() {
    let config = with_env("LOGLET_LEVELS", "LOW, MID, HIGH", || {
        let mut config = SinkConfig::default();
        config.apply_env_overrides();
        config
    });

    assert_eq!(config.levels, ["LOW", "MID", "HIGH"]);
}

#[test]
#[serial_test::serial]
fn env_override_time_bool_field() {
    let config = with_env("LOGLET_TIME_UTC", "true", || {
        let mut config = SinkConfig::default();
        config.apply_env_overrides();
        config
    });

    assert!(config.time.utc);
    assert!(config.flags().contains(Flags::UTC));
}

#[test]
#[serial_test::serial]
fn env_override_invalid_value_keeps_toml_value() {
    let config = with_env("LOGLET_CALLER", "sideways", || {
        let mut config = SinkConfig::parse("caller = \"short\"").expect("should parse");
        config.apply_env_overrides();
        config
    });

    assert_eq!(config.caller, CallerMode::Short);
}

#[test]
#[serial_test::serial]
fn env_override_write_error_policy() {
    let config = with_env("LOGLET_ON_WRITE_ERROR", "Report", || {
        let mut config = SinkConfig::default();
        config.apply_env_overrides();
        config
    });

    assert_eq!(config.on_write_error, WriteErrorPolicy::Report);
}

#[test]
#[serial_test::serial]
fn env_override_missing_var_keeps_toml_value() {
    // SAFETY: 존재하지 않는 변수를 명시적으로 제거
    unsafe {
        std::env::remove_var("LOGLET_FORMAT");
    }

    let mut config = SinkConfig::parse("format = \"json\"").expect("should parse");
    config.apply_env_overrides();

    assert_eq!(config.format, Format::Json);
}

// =============================================================================
// 빈 파일 / 잘못된 형식 에러 테스트
// =============================================================================

#[test]
fn empty_string_parses_with_defaults() {
    let config = SinkConfig::parse("").expect("empty string should parse");
    config.validate().expect("should validate");

    assert_eq!(config.format, Format::Pretty);
    assert!(config.color);
    assert!(config.colors.is_empty());
}

#[test]
fn comments_only_parses_with_defaults() {
    let toml = r#"
# 이것은 주석입니다
# 모든 줄이 주석입니다
"#;
    let config = SinkConfig::parse(toml).expect("comments-only should parse");
    config.validate().expect("should validate");
    assert_eq!(config.min_level, "DEBUG");
}

#[test]
fn malformed_toml_returns_parse_error() {
    let err = SinkConfig::parse("[invalid toml").unwrap_err();
    assert!(matches!(
        err,
        LogletError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn invalid_enum_returns_parse_error() {
    let err = SinkConfig::parse("format = \"yaml\"").unwrap_err();
    assert!(matches!(
        err,
        LogletError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_returns_parse_error() {
    let err = SinkConfig::parse("color = \"yes\"").unwrap_err();
    assert!(matches!(
        err,
        LogletError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[test]
fn from_file_nonexistent_returns_file_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.toml");

    let err = SinkConfig::from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        LogletError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[test]
fn from_file_reads_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "format = \"json\"\nmin_level = \"WARN\"").expect("write");

    let config = SinkConfig::from_file(file.path()).expect("should load");
    assert_eq!(config.format, Format::Json);
    assert_eq!(config.min_level, "WARN");
}

#[test]
fn from_file_rejects_invalid_content() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "min_level = \"NOPE\"").expect("write");

    assert!(SinkConfig::from_file(file.path()).is_err());
}

#[test]
#[serial_test::serial]
fn load_applies_env_then_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "min_level = \"INFO\"").expect("write");

    let result = with_env("LOGLET_MIN_LEVEL", "VERBOSE", || {
        SinkConfig::load(file.path())
    });

    assert!(matches!(
        result.unwrap_err(),
        LogletError::Config(ConfigError::InvalidValue { .. })
    ));
}

// =============================================================================
// 직렬화 라운드트립 테스트
// =============================================================================

#[test]
fn serialize_and_reparse_roundtrip() {
    let content = include_str!("../../../loglet.toml.example");
    let original = SinkConfig::parse(content).expect("should parse");

    let serialized = toml::to_string(&original).expect("should serialize");
    let reparsed = SinkConfig::parse(&serialized).expect("should reparse");

    assert_eq!(reparsed.min_level, original.min_level);
    assert_eq!(reparsed.levels, original.levels);
    assert_eq!(reparsed.time, original.time);
    assert_eq!(reparsed.colors, original.colors);
}
