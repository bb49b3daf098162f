//! 레벨 토큰 감지기
//!
//! 메시지 맨 앞에서 대괄호 형태(`[ERROR]`) 또는 맨 형태(`ERROR `)의 레벨 토큰을
//! 찾습니다. 긴 표기(`DEBUG`, `INFO`, `WARN`, `ERROR`, `PANIC`)와 짧은 표기
//! (`DBG`, `INF`, `WRN`, `ERR`, `PNC`)는 같은 다섯 레벨로 해석됩니다.
//!
//! 모든 로그 호출마다 실행되므로 할당하지 않습니다. 토큰 제거는 빌린 슬라이스의
//! 시작 인덱스를 옮기는 것뿐입니다.

use loglet_core::Level;

/// 토큰 길이 후보 (짧은 표기 3바이트 ~ 긴 표기 5바이트)
const TOKEN_LENGTHS: [usize; 3] = [3, 4, 5];

/// 감지된 토큰의 표기 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spelling {
    /// `DBG`, `INF`, `WRN`, `ERR`, `PNC`
    Short,
    /// `DEBUG`, `INFO`, `WARN`, `ERROR`, `PANIC`
    Long,
}

/// 레벨 감지 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// 감지된 레벨
    pub level: Level,
    /// 메시지에 쓰여 있던 표기 형태
    pub spelling: Spelling,
    /// 대괄호로 감싸져 있었는지 여부
    pub bracketed: bool,
}

impl Detection {
    /// 메시지에 쓰여 있던 표기 그대로의 레벨 이름 (대괄호 제외)
    pub fn tag(&self) -> &'static str {
        match self.spelling {
            Spelling::Short => self.level.short_name(),
            Spelling::Long => self.level.long_name(),
        }
    }
}

/// 메시지 앞부분에서 레벨 토큰을 감지합니다.
///
/// 토큰이 있으면 감지 결과와 함께 토큰 및 구분자(닫는 대괄호, 공백 하나)를
/// 제거한 나머지 메시지를 반환합니다. 토큰이 없으면 `None`과 원래 메시지를
/// 그대로 반환합니다.
///
/// 선택적 여는 대괄호 뒤의 첫 바이트가 `D`, `I`, `W`, `E`, `P`가 아니면
/// 더 살펴보지 않고 바로 `None`을 반환합니다. 그렇지 않으면 3, 4, 5바이트
/// 창을 차례로 시도해 가장 짧은 일치를 사용합니다.
pub fn detect(message: &[u8]) -> (Option<Detection>, &[u8]) {
    let bracketed = message.first() == Some(&b'[');
    let start = usize::from(bracketed);

    match message.get(start) {
        Some(b'D' | b'I' | b'W' | b'E' | b'P') => {}
        _ => return (None, message),
    }

    for len in TOKEN_LENGTHS {
        let end = start + len;
        let Some(candidate) = message.get(start..end) else {
            break;
        };
        let Some((level, spelling)) = lookup(candidate) else {
            continue;
        };
        let Some(rest_start) = token_end(message, end, bracketed) else {
            continue;
        };

        let detection = Detection {
            level,
            spelling,
            bracketed,
        };
        return (Some(detection), &message[rest_start..]);
    }

    (None, message)
}

/// 토큰 바로 뒤의 종결자를 확인하고 나머지 메시지의 시작 위치를 반환합니다.
///
/// - 대괄호 형태: `]` 필수, 그 뒤 공백 하나는 함께 제거
/// - 맨 형태: 공백 하나 또는 메시지 끝
fn token_end(message: &[u8], end: usize, bracketed: bool) -> Option<usize> {
    if bracketed {
        if message.get(end) != Some(&b']') {
            return None;
        }
        let after = end + 1;
        if message.get(after) == Some(&b' ') {
            Some(after + 1)
        } else {
            Some(after)
        }
    } else {
        match message.get(end) {
            None => Some(end),
            Some(b' ') => Some(end + 1),
            Some(_) => None,
        }
    }
}

fn lookup(token: &[u8]) -> Option<(Level, Spelling)> {
    let found = match token {
        b"DBG" => (Level::Debug, Spelling::Short),
        b"INF" => (Level::Info, Spelling::Short),
        b"WRN" => (Level::Warn, Spelling::Short),
        b"ERR" => (Level::Error, Spelling::Short),
        b"PNC" => (Level::Panic, Spelling::Short),
        b"INFO" => (Level::Info, Spelling::Long),
        b"WARN" => (Level::Warn, Spelling::Long),
        b"DEBUG" => (Level::Debug, Spelling::Long),
        b"ERROR" => (Level::Error, Spelling::Long),
        b"PANIC" => (Level::Panic, Spelling::Long),
        _ => return None,
    };
    Some(found)
}
