//! 도메인 타입 -- 로그 레벨, 출력 형식, 필드 플래그, ANSI 색상
//!
//! 파이프라인의 모든 단계가 공유하는 작은 값 타입들입니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 로그 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Debug < Info < Warn < Error < Panic`).
/// 각 레벨은 긴 표기(`DEBUG`)와 짧은 표기(`DBG`) 두 가지 이름을 가집니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// 디버그
    #[default]
    Debug,
    /// 정보
    Info,
    /// 경고
    Warn,
    /// 에러
    Error,
    /// 치명적 에러
    Panic,
}

impl Level {
    /// 심각도 오름차순의 모든 레벨
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Panic,
    ];

    /// 긴 표기 이름 (`DEBUG`, `INFO`, `WARN`, `ERROR`, `PANIC`)
    pub const fn long_name(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Panic => "PANIC",
        }
    }

    /// 짧은 표기 이름 (`DBG`, `INF`, `WRN`, `ERR`, `PNC`)
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warn => "WRN",
            Self::Error => "ERR",
            Self::Panic => "PNC",
        }
    }

    /// 긴 표기 또는 짧은 표기 이름과 정확히 일치하는 레벨을 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.long_name() == name || l.short_name() == name)
    }

    /// 문자열에서 레벨을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않으며 `warning`, `fatal` 같은 별칭도 허용합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" | "dbg" | "trace" => Some(Self::Debug),
            "info" | "inf" => Some(Self::Info),
            "warn" | "wrn" | "warning" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            "panic" | "pnc" | "fatal" => Some(Self::Panic),
            _ => None,
        }
    }

    /// 기본 레벨 목록 (긴 표기, 심각도 오름차순)
    pub fn default_names() -> Vec<String> {
        Self::ALL.iter().map(|l| l.long_name().to_owned()).collect()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name())
    }
}

/// 출력 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// 사람이 읽기 쉬운 한 줄 형식 (기본값)
    #[default]
    Pretty,
    /// JSON 객체 한 줄
    Json,
}

impl Format {
    /// 문자열에서 출력 형식을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 싱크 쓰기 실패 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteErrorPolicy {
    /// 호출자에게 에러를 그대로 반환 (기본값)
    #[default]
    Propagate,
    /// 표준 에러로 보고하고 호출자에게는 성공을 반환
    Report,
}

bitflags::bitflags! {
    /// 출력 필드 플래그
    ///
    /// 어떤 헤더 필드(날짜, 시각, 마이크로초, 호출 위치)를 출력할지 선택합니다.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// 날짜 `YYYY-MM-DD`
        const DATE = 1;
        /// 시각 `HH:MM:SS`
        const TIME = 1 << 1;
        /// 마이크로초 `.ffffff` (TIME 필요)
        const MICROSECONDS = 1 << 2;
        /// 전체 파일 경로와 줄 번호
        const LONG_FILE = 1 << 3;
        /// 파일 이름만과 줄 번호 (LONG_FILE보다 우선)
        const SHORT_FILE = 1 << 4;
        /// 포맷 전에 UTC로 변환
        const UTC = 1 << 5;

        /// 날짜 + 시각
        const STD = Self::DATE.bits() | Self::TIME.bits();
    }
}

impl Flags {
    /// 타임스탬프 관련 필드 중 하나라도 켜져 있는지 확인합니다.
    pub fn has_timestamp(self) -> bool {
        self.intersects(Self::DATE | Self::TIME | Self::MICROSECONDS)
    }

    /// 호출 위치 필드가 켜져 있는지 확인합니다.
    pub fn has_caller(self) -> bool {
        self.intersects(Self::LONG_FILE | Self::SHORT_FILE)
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::STD
    }
}

/// 터미널 색상 팔레트
///
/// 기본 팔레트 0~7, 고휘도 팔레트는 기본 인덱스에 60을 더합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    HiBlack = 60,
    HiRed = 61,
    HiGreen = 62,
    HiYellow = 63,
    HiBlue = 64,
    HiMagenta = 65,
    HiCyan = 66,
    HiWhite = 67,
}

impl Color {
    /// 팔레트 인덱스에서 색상을 찾습니다.
    pub fn from_code(code: i64) -> Option<Self> {
        let color = match code {
            0 => Self::Black,
            1 => Self::Red,
            2 => Self::Green,
            3 => Self::Yellow,
            4 => Self::Blue,
            5 => Self::Magenta,
            6 => Self::Cyan,
            7 => Self::White,
            60 => Self::HiBlack,
            61 => Self::HiRed,
            62 => Self::HiGreen,
            63 => Self::HiYellow,
            64 => Self::HiBlue,
            65 => Self::HiMagenta,
            66 => Self::HiCyan,
            67 => Self::HiWhite,
            _ => return None,
        };
        Some(color)
    }

    /// 전경색 SGR 값 (30~37, 90~97)
    pub const fn foreground(self) -> u8 {
        30 + self as u8
    }

    /// 배경색 SGR 값 (40~47, 100~107)
    pub const fn background(self) -> u8 {
        40 + self as u8
    }
}

/// 텍스트 스타일 (SGR 0~9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Style {
    Reset = 0,
    Bold = 1,
    Faint = 2,
    Italic = 3,
    Underline = 4,
    BlinkSlow = 5,
    BlinkRapid = 6,
    ReverseVideo = 7,
    Concealed = 8,
    CrossedOut = 9,
}

impl Style {
    /// SGR 값에서 스타일을 찾습니다.
    pub fn from_code(code: i64) -> Option<Self> {
        let style = match code {
            0 => Self::Reset,
            1 => Self::Bold,
            2 => Self::Faint,
            3 => Self::Italic,
            4 => Self::Underline,
            5 => Self::BlinkSlow,
            6 => Self::BlinkRapid,
            7 => Self::ReverseVideo,
            8 => Self::Concealed,
            9 => Self::CrossedOut,
            _ => return None,
        };
        Some(style)
    }

    /// SGR 값
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// 레벨 또는 접두사에 지정하는 사용자 정의 색상
///
/// 위치 순서 `[전경색, 배경색, 스타일]`을 명시적 필드로 표현합니다.
/// 전경색은 필수이므로 "인자 없음"은 타입 수준에서 표현할 수 없습니다.
///
/// # 사용 예시
/// ```
/// use loglet_core::{Color, CustomColor, Style};
///
/// let color = CustomColor::new(Color::HiBlue).on(Color::Black).with_style(Style::Bold);
/// assert_eq!(color.fragment(), "1;94;40;");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomColor {
    /// 전경색
    pub foreground: Color,
    /// 배경색
    pub background: Option<Color>,
    /// 스타일
    pub style: Option<Style>,
}

impl CustomColor {
    /// 전경색만 지정한 색상을 생성합니다.
    pub const fn new(foreground: Color) -> Self {
        Self {
            foreground,
            background: None,
            style: None,
        }
    }

    /// 배경색을 지정합니다.
    pub const fn on(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    /// 스타일을 지정합니다.
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    /// 정수 성분 목록 `[전경색, 배경색?, 스타일?]`에서 색상을 생성합니다.
    ///
    /// 성분이 없거나 3개를 넘거나, 값이 팔레트/스타일 범위를 벗어나면
    /// [`ConfigError::InvalidColor`]를 반환합니다.
    pub fn from_components(key: &str, components: &[i64]) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidColor {
            key: key.to_owned(),
            reason,
        };

        let (&first, rest) = components
            .split_first()
            .ok_or_else(|| invalid("at least one component is required".to_owned()))?;
        if rest.len() > 2 {
            return Err(invalid(format!(
                "expected at most 3 components, got {}",
                components.len()
            )));
        }

        let foreground = Color::from_code(first)
            .ok_or_else(|| invalid(format!("foreground {first} is not a color code")))?;
        let mut color = Self::new(foreground);

        if let Some(&bg) = rest.first() {
            let background = Color::from_code(bg)
                .ok_or_else(|| invalid(format!("background {bg} is not a color code")))?;
            color = color.on(background);
        }
        if let Some(&st) = rest.get(1) {
            let style =
                Style::from_code(st).ok_or_else(|| invalid(format!("style {st} is not 0-9")))?;
            color = color.with_style(style);
        }

        Ok(color)
    }

    /// SGR 파라미터 조각을 생성합니다.
    ///
    /// 성분 개수에 따라 `"<fg>;"`, `"<fg>;<bg>;"`, `"<style>;<fg>;<bg>;"` 형태가 됩니다.
    /// 배경색 없이 스타일만 지정한 경우 `"<style>;<fg>;"`입니다.
    pub fn fragment(&self) -> String {
        let fg = self.foreground.foreground();
        match (self.background, self.style) {
            (None, None) => format!("{fg};"),
            (Some(bg), None) => format!("{fg};{};", bg.background()),
            (Some(bg), Some(style)) => format!("{};{fg};{};", style.code(), bg.background()),
            (None, Some(style)) => format!("{};{fg};", style.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Panic);
    }

    #[test]
    fn level_names_resolve_to_same_level() {
        for level in Level::ALL {
            assert_eq!(Level::from_name(level.long_name()), Some(level));
            assert_eq!(Level::from_name(level.short_name()), Some(level));
        }
        assert_eq!(Level::from_name("info"), None);
    }

    #[test]
    fn level_from_str_loose() {
        assert_eq!(Level::from_str_loose("WARNING"), Some(Level::Warn));
        assert_eq!(Level::from_str_loose("err"), Some(Level::Error));
        assert_eq!(Level::from_str_loose("verbose"), None);
    }

    #[test]
    fn default_flags_are_date_and_time() {
        let flags = Flags::default();
        assert!(flags.contains(Flags::DATE | Flags::TIME));
        assert!(flags.has_timestamp());
        assert!(!flags.has_caller());
    }

    #[test]
    fn color_sgr_offsets() {
        assert_eq!(Color::Red.foreground(), 31);
        assert_eq!(Color::Red.background(), 41);
        assert_eq!(Color::HiRed.foreground(), 91);
        assert_eq!(Color::HiWhite.background(), 107);
    }

    #[test]
    fn fragment_by_arity() {
        assert_eq!(CustomColor::new(Color::HiRed).fragment(), "91;");
        assert_eq!(
            CustomColor::new(Color::Red).on(Color::White).fragment(),
            "31;47;"
        );
        assert_eq!(
            CustomColor::new(Color::HiBlue)
                .on(Color::Black)
                .with_style(Style::Bold)
                .fragment(),
            "1;94;40;"
        );
        assert_eq!(
            CustomColor::new(Color::Green)
                .with_style(Style::Underline)
                .fragment(),
            "4;32;"
        );
    }

    #[test]
    fn from_components_rejects_empty() {
        let err = CustomColor::from_components("[X]", &[]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColor { .. }));
    }

    #[test]
    fn from_components_rejects_bad_codes() {
        assert!(CustomColor::from_components("k", &[8]).is_err());
        assert!(CustomColor::from_components("k", &[1, 99]).is_err());
        assert!(CustomColor::from_components("k", &[1, 0, 10]).is_err());
        assert!(CustomColor::from_components("k", &[1, 0, 1, 1]).is_err());
    }

    #[test]
    fn from_components_positional() {
        let color = CustomColor::from_components("k", &[61, 0, 1]).unwrap();
        assert_eq!(color.foreground, Color::HiRed);
        assert_eq!(color.background, Some(Color::Black));
        assert_eq!(color.style, Some(Style::Bold));
    }
}
