//! 최소 레벨 필터
//!
//! [`LevelGate`]는 심각도 오름차순 레벨 이름 목록과 최소 레벨로부터
//! "차단 집합"(목록에서 최소 레벨보다 앞에 있는 이름들)을 한 번만 계산합니다.
//! 계산은 처음 필요할 때 [`OnceLock`]으로 정확히 한 번 일어나며,
//! 목록이나 최소 레벨을 바꾸면 무효화되어 다시 계산됩니다.

use std::collections::HashSet;
use std::sync::OnceLock;

use loglet_core::Level;

/// 최소 레벨 필터
#[derive(Debug)]
pub struct LevelGate {
    /// 인식할 레벨 이름 목록 (심각도 오름차순)
    levels: Vec<String>,
    /// 최소 레벨 이름
    min: String,
    /// 지연 계산되는 차단 집합
    disallowed: OnceLock<HashSet<String>>,
}

impl LevelGate {
    /// 레벨 목록과 최소 레벨로 필터를 생성합니다.
    ///
    /// 최소 레벨이 목록에 없으면 목록의 모든 이름이 차단됩니다.
    /// 설정 단계에서는 [`SinkWriterBuilder`](crate::SinkWriterBuilder)가 이를 먼저 검증합니다.
    pub fn new(levels: Vec<String>, min: impl Into<String>) -> Self {
        Self {
            levels,
            min: min.into(),
            disallowed: OnceLock::new(),
        }
    }

    /// 기본 레벨 목록(`DEBUG`..`PANIC`)과 주어진 최소 레벨로 필터를 생성합니다.
    pub fn with_min_level(min: impl Into<String>) -> Self {
        Self::new(Level::default_names(), min)
    }

    /// 레벨 이름 목록을 반환합니다.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// 최소 레벨 이름을 반환합니다.
    pub fn min_level(&self) -> &str {
        &self.min
    }

    /// 이름이 레벨 목록에 있는지 확인합니다.
    pub fn knows(&self, name: &str) -> bool {
        self.levels.iter().any(|l| l == name)
    }

    /// 레벨 목록을 교체하고 차단 집합을 무효화합니다.
    pub fn set_levels(&mut self, levels: Vec<String>) {
        self.levels = levels;
        self.disallowed = OnceLock::new();
    }

    /// 최소 레벨을 교체하고 차단 집합을 무효화합니다.
    pub fn set_min_level(&mut self, min: impl Into<String>) {
        self.min = min.into();
        self.disallowed = OnceLock::new();
    }

    /// 감지된 레벨이 출력 가능한지 확인합니다.
    ///
    /// 레벨이 없는 메시지는 항상 통과합니다. 레벨이 있으면 긴 표기와 짧은
    /// 표기 중 어느 쪽도 차단 집합에 없어야 통과합니다.
    pub fn allow(&self, level: Option<Level>) -> bool {
        match level {
            None => true,
            Some(level) => {
                self.allow_name(level.long_name()) && self.allow_name(level.short_name())
            }
        }
    }

    /// 레벨 이름이 출력 가능한지 확인합니다. 빈 이름은 항상 통과합니다.
    pub fn allow_name(&self, name: &str) -> bool {
        name.is_empty() || !self.disallowed().contains(name)
    }

    /// 차단 집합을 반환합니다. 처음 호출 시 한 번만 계산됩니다.
    pub fn disallowed(&self) -> &HashSet<String> {
        self.disallowed.get_or_init(|| {
            self.levels
                .iter()
                .take_while(|name| **name != self.min)
                .cloned()
                .collect()
        })
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::with_min_level(Level::Debug.long_name())
    }
}

impl Clone for LevelGate {
    fn clone(&self) -> Self {
        Self::new(self.levels.clone(), self.min.clone())
    }
}
