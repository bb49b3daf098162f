//! 호출 위치 해석기
//!
//! 두 가지 경로로 로그 호출 위치(파일, 줄)를 얻습니다.
//!
//! - `#[track_caller]`로 전달된 [`Location`] (레벨 지정 호출, 매크로)
//! - 프레임 건너뛰기 수를 받아 호출 스택을 거슬러 올라가는 [`resolve`]
//!   (`std::io::Write` 경로처럼 호출 위치가 전달되지 않는 경우)
//!
//! 스택 탐색은 목표 프레임에 닿으면 멈추고, 심볼 해석은 그 프레임 하나에만 합니다.
//! 탐색이 실패하면 로그 호출 전체를 실패시키지 않고 [`UNKNOWN_FILE`]과
//! 줄 번호 0을 반환합니다. 기준 프레임을 찾지 못했거나 디버그 정보가 없으면
//! 이후 호출은 탐색 없이 바로 sentinel을 반환합니다.

use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};

/// 호출 위치를 알 수 없을 때의 파일 이름
pub const UNKNOWN_FILE: &str = "???";

/// 스택 탐색으로 위치를 얻을 수 없는 환경인지 여부
static UNAVAILABLE: AtomicBool = AtomicBool::new(false);

/// 호출 스택을 거슬러 올라가 호출 위치를 찾습니다.
///
/// `skip`이 0이면 이 함수를 직접 호출한 프레임의 위치를 반환합니다.
/// 파이프라인 내부 프레임 수와 사용자 호출 깊이를 더해서 넘겨야 합니다.
/// 스택 깊이를 넘거나 디버그 정보가 없으면 `("???", 0)`을 반환합니다.
#[inline(never)]
pub fn resolve(skip: usize, short: bool) -> (String, u32) {
    if UNAVAILABLE.load(Ordering::Relaxed) {
        return unknown();
    }

    let mut cursor = FrameCursor::new(resolve as usize, skip);
    let mut target = None;
    backtrace::trace(|frame| {
        if cursor.is_target(frame.symbol_address() as usize) {
            target = Some(frame.clone());
            return false;
        }
        true
    });

    let Some(frame) = target else {
        if !cursor.anchored {
            mark_unavailable("anchor frame not found");
        }
        return unknown();
    };

    let mut found = None;
    backtrace::resolve_frame(&frame, |symbol| {
        if found.is_some() {
            return;
        }
        if let (Some(path), Some(line)) = (symbol.filename(), symbol.lineno()) {
            let path = path.to_string_lossy();
            let file = if short { shorten(&path) } else { &path };
            found = Some((file.to_owned(), line));
        }
    });

    found.unwrap_or_else(|| {
        mark_unavailable("no debug info for caller frame");
        unknown()
    })
}

fn unknown() -> (String, u32) {
    (UNKNOWN_FILE.to_owned(), 0)
}

fn mark_unavailable(reason: &'static str) {
    if !UNAVAILABLE.swap(true, Ordering::Relaxed) {
        tracing::debug!(reason, "stack walk disabled, call sites render as ???:0");
    }
}

/// `#[track_caller]` 위치에서 파일과 줄을 꺼냅니다.
pub fn from_location<'a>(location: &'a Location<'a>, short: bool) -> (&'a str, u32) {
    let file = location.file();
    let file = if short { shorten(file) } else { file };
    (file, location.line())
}

/// 경로의 마지막 구분자 뒤 부분만 반환합니다.
pub fn shorten(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// 기준 프레임 뒤 `skip`번째 프레임을 찾는 커서
#[derive(Debug)]
struct FrameCursor {
    /// 기준 함수의 시작 주소
    anchor: usize,
    /// 기준 프레임 뒤로 더 건너뛸 프레임 수
    remaining: usize,
    /// 기준 프레임을 지났는지 여부
    anchored: bool,
}

impl FrameCursor {
    fn new(anchor: usize, skip: usize) -> Self {
        Self {
            anchor,
            remaining: skip,
            anchored: false,
        }
    }

    /// 심볼 시작 주소가 `symbol`인 프레임이 목표 프레임이면 `true`를 반환합니다.
    fn is_target(&mut self, symbol: usize) -> bool {
        if !self.anchored {
            self.anchored = symbol == self.anchor;
            return false;
        }
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 주소 목록에서 목표 프레임의 인덱스를 찾습니다.
    fn walk(symbols: &[usize], anchor: usize, skip: usize) -> (Option<usize>, bool) {
        let mut cursor = FrameCursor::new(anchor, skip);
        let index = symbols.iter().position(|&s| cursor.is_target(s));
        (index, cursor.anchored)
    }

    #[test]
    fn shorten_keeps_last_segment() {
        assert_eq!(shorten("/home/dev/app/src/main.rs"), "main.rs");
        assert_eq!(shorten("C:\\work\\app\\main.rs"), "main.rs");
        assert_eq!(shorten("main.rs"), "main.rs");
        assert_eq!(shorten("dir/"), "");
    }

    #[test]
    fn cursor_ignores_frames_above_anchor() {
        // 0x10, 0x20: 백트레이스 내부 프레임, 0x30: 기준 프레임
        let symbols = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60];
        assert_eq!(walk(&symbols, 0x30, 0), (Some(3), true));
        assert_eq!(walk(&symbols, 0x30, 2), (Some(5), true));
    }

    #[test]
    fn cursor_past_stack_depth_finds_nothing() {
        let symbols = [0x10, 0x30, 0x40];
        assert_eq!(walk(&symbols, 0x30, 5), (None, true));
    }

    #[test]
    fn cursor_without_anchor_finds_nothing() {
        let symbols = [0x10, 0x20, 0x40];
        assert_eq!(walk(&symbols, 0x30, 0), (None, false));
    }

    #[test]
    fn resolve_past_stack_depth_returns_sentinel() {
        let (file, line) = resolve(10_000, true);
        assert_eq!(file, UNKNOWN_FILE);
        assert_eq!(line, 0);
    }

    #[test]
    #[inline(never)]
    fn resolve_reports_immediate_caller() {
        let expected_line = line!() + 1;
        let (file, line) = resolve(0, true);
        // 디버그 정보가 없는 빌드에서는 sentinel이 나온다
        if file != UNKNOWN_FILE {
            assert_eq!(file, "caller.rs");
            assert_eq!(line, expected_line);
        }
    }

    #[test]
    fn long_path_is_kept_when_not_shortened() {
        let (file, _) = resolve(0, false);
        if file != UNKNOWN_FILE {
            assert!(file.ends_with("caller.rs"), "{file}");
        }
    }

    #[test]
    #[track_caller]
    fn from_location_uses_track_caller() {
        let location = Location::caller();
        let (file, line) = from_location(location, true);
        assert!(file.ends_with(".rs"));
        assert!(line > 0);
        let (long, _) = from_location(location, false);
        assert!(long.ends_with(file));
    }
}
