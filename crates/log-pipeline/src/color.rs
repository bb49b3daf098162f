//! 색상 해석기 -- 레벨/접두사를 ANSI SGR 이스케이프로 변환합니다.
//!
//! [`ColorResolver`]는 키(레벨 이름 또는 리터럴 접두사)마다 미리 계산한
//! SGR 파라미터 조각을 보관합니다. 사용자 정의 색상은 쓰기 잠금 아래에서만
//! 등록되고, 로그 호출은 읽기 잠금으로 맵을 복사하지 않고 조회합니다.
//!
//! # 기본 팔레트
//! - debug: 고휘도 청록
//! - info: 고휘도 노랑
//! - warn: 고휘도 초록
//! - error, panic: 빨강

use parking_lot::RwLock;

use loglet_core::error::ConfigError;
use loglet_core::{Color, CustomColor, Level};

/// 이스케이프 시작 바이트열
pub const ESCAPE: &[u8] = b"\x1b[";

/// SGR 리셋 (`ESC[0m`)
pub const ESCAPE_CLOSE: &[u8] = b"\x1b[0m";

/// 레벨/접두사 색상 해석기
#[derive(Debug)]
pub struct ColorResolver {
    /// 사용자 정의 색상 (등록 순서대로 선형 탐색)
    overrides: RwLock<Vec<(String, String)>>,
    /// 레벨별 기본 SGR 조각 (`Level` 순서)
    defaults: [String; 5],
}

impl ColorResolver {
    /// 기본 팔레트로 해석기를 생성합니다.
    pub fn new() -> Self {
        Self {
            overrides: RwLock::new(Vec::new()),
            defaults: [
                CustomColor::new(Color::HiCyan).fragment(),
                CustomColor::new(Color::HiYellow).fragment(),
                CustomColor::new(Color::HiGreen).fragment(),
                CustomColor::new(Color::Red).fragment(),
                CustomColor::new(Color::Red).fragment(),
            ],
        }
    }

    /// 키에 등록된 SGR 조각을 반환합니다. 등록된 것이 없으면 빈 문자열입니다.
    pub fn define(&self, key: &str) -> String {
        self.overrides
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, fragment)| fragment.clone())
            .unwrap_or_default()
    }

    /// 레벨 또는 접두사에 사용자 정의 색상을 등록합니다.
    ///
    /// 같은 키가 이미 있으면 교체합니다.
    pub fn set_custom(&self, key: impl Into<String>, color: CustomColor) {
        let key = key.into();
        let fragment = color.fragment();
        let mut overrides = self.overrides.write();
        match overrides.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = fragment,
            None => overrides.push((key, fragment)),
        }
    }

    /// 정수 성분 `[전경색, 배경색?, 스타일?]`으로 사용자 정의 색상을 등록합니다.
    ///
    /// 성분이 비었거나 범위를 벗어나면 아무것도 등록하지 않고 에러를 반환합니다.
    pub fn set_custom_components(&self, key: &str, components: &[i64]) -> Result<(), ConfigError> {
        let color = CustomColor::from_components(key, components)?;
        self.set_custom(key, color);
        Ok(())
    }

    /// 등록된 사용자 정의 색상 수를 반환합니다.
    pub fn custom_count(&self) -> usize {
        self.overrides.read().len()
    }

    /// 레벨에 해당하는 여는 이스케이프를 버퍼에 씁니다.
    ///
    /// 레벨의 긴/짧은 표기 또는 대괄호로 감싼 표기로 등록된 사용자 정의 색상이
    /// 있으면 그것을, 없으면 기본 팔레트를 사용합니다.
    pub(crate) fn push_level_open(&self, buf: &mut Vec<u8>, level: Level) {
        let overrides = self.overrides.read();
        let fragment = overrides
            .iter()
            .find(|(k, _)| names_level(k, level))
            .map(|(_, fragment)| fragment.as_str())
            .unwrap_or(self.defaults[level as usize].as_str());
        push_escape(buf, fragment);
    }

    /// 메시지가 등록된 리터럴 접두사로 시작하면 여는 이스케이프를 쓰고 `true`를 반환합니다.
    pub(crate) fn push_prefix_open(&self, buf: &mut Vec<u8>, message: &[u8]) -> bool {
        let overrides = self.overrides.read();
        match overrides
            .iter()
            .find(|(k, _)| !k.is_empty() && message.starts_with(k.as_bytes()))
        {
            Some((_, fragment)) => {
                push_escape(buf, fragment);
                true
            }
            None => false,
        }
    }
}

impl Default for ColorResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// `ESC[<params>m` 이스케이프를 씁니다.
///
/// 저장된 조각은 `;`로 끝나므로 마지막 `;`를 떼어냅니다. 빈 파라미터는
/// 터미널에서 0(리셋)으로 해석됩니다.
fn push_escape(buf: &mut Vec<u8>, fragment: &str) {
    buf.extend_from_slice(ESCAPE);
    buf.extend_from_slice(fragment.trim_end_matches(';').as_bytes());
    buf.push(b'm');
}

/// 키가 레벨의 이름(`ERROR`, `ERR`, `[ERROR]`, `[ERR]`)인지 확인합니다.
fn names_level(key: &str, level: Level) -> bool {
    let bare = key
        .strip_prefix('[')
        .and_then(|k| k.strip_suffix(']'))
        .unwrap_or(key);
    bare == level.long_name() || bare == level.short_name()
}
