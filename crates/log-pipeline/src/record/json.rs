//! JSON 직렬화
//!
//! 키 순서는 `time`, `file`, `line`, `level`, `message`로 고정이며,
//! 값이 없는 키는 생략합니다. `message`는 항상 출력됩니다.
//! JSON 출력에는 색상 이스케이프를 넣지 않습니다.

use loglet_core::Flags;

use super::Record;
use crate::timefmt::{append_decimal, append_timestamp};

/// 필드 사이 구분자
const FIELD_SEPARATOR: &[u8] = b", ";

/// 16진수 숫자 (`\u00XX` 이스케이프용)
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// 레코드를 JSON 객체 한 줄로 직렬화합니다.
pub(super) fn render(record: &mut Record, flags: Flags) {
    let Record {
        buf,
        message,
        level,
        time,
        file,
        line,
        has_caller,
        ..
    } = record;
    buf.clear();
    buf.push(b'{');

    if flags.has_timestamp() {
        push_key(buf, "time");
        buf.push(b'"');
        append_timestamp(buf, *time, flags);
        buf.push(b'"');
    }

    if *has_caller {
        push_key(buf, "file");
        buf.push(b'"');
        escape_into(buf, file.as_bytes());
        buf.push(b'"');

        push_key(buf, "line");
        append_decimal(buf, *line);
    }

    if let Some(level) = level {
        push_key(buf, "level");
        buf.push(b'"');
        buf.extend_from_slice(level.short_name().as_bytes());
        buf.push(b'"');
    }

    push_key(buf, "message");
    buf.push(b'"');
    escape_into(buf, message);
    buf.push(b'"');

    buf.extend_from_slice(b"}\n");
}

/// `"key": ` 를 쓰고, 첫 필드가 아니면 앞에 구분자를 붙입니다.
fn push_key(buf: &mut Vec<u8>, key: &str) {
    if buf.len() > 1 {
        buf.extend_from_slice(FIELD_SEPARATOR);
    }
    buf.push(b'"');
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(b"\": ");
}

/// JSON 문자열 값으로 쓸 수 있도록 바이트를 이스케이프해 덧붙입니다.
///
/// `"`, `\`, 제어 문자(0x00~0x1F)만 이스케이프하고 나머지 바이트는 그대로 복사합니다.
/// 이스케이프할 바이트가 없으면 한 번에 복사합니다.
pub fn escape_into(buf: &mut Vec<u8>, bytes: &[u8]) {
    if !bytes.iter().any(|&b| needs_escape(b)) {
        buf.extend_from_slice(bytes);
        return;
    }

    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if !needs_escape(b) {
            continue;
        }
        buf.extend_from_slice(&bytes[start..i]);
        match b {
            b'"' => buf.extend_from_slice(b"\\\""),
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            _ => {
                buf.extend_from_slice(b"\\u00");
                buf.push(HEX_DIGITS[usize::from(b >> 4)]);
                buf.push(HEX_DIGITS[usize::from(b & 0x0f)]);
            }
        }
        start = i + 1;
    }
    buf.extend_from_slice(&bytes[start..]);
}

#[inline]
fn needs_escape(b: u8) -> bool {
    b == b'"' || b == b'\\' || b < 0x20
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use loglet_core::Level;

    fn escaped(bytes: &[u8]) -> String {
        let mut buf = Vec::new();
        escape_into(&mut buf, bytes);
        String::from_utf8(buf).unwrap()
    }

    fn rendered(record: &mut Record, flags: Flags) -> String {
        render(record, flags);
        String::from_utf8(record.buf.clone()).unwrap()
    }

    #[test]
    fn level_and_message_only() {
        let mut record = Record {
            level: Some(Level::Info),
            message: b"starting".to_vec(),
            ..Record::default()
        };
        assert_eq!(
            rendered(&mut record, Flags::empty()),
            "{\"level\": \"INF\", \"message\": \"starting\"}\n"
        );
    }

    #[test]
    fn message_is_always_present() {
        let mut record = Record::default();
        assert_eq!(
            rendered(&mut record, Flags::empty()),
            "{\"message\": \"\"}\n"
        );
    }

    #[test]
    fn all_fields_in_fixed_order() {
        let mut record = Record {
            level: Some(Level::Error),
            message: b"boom".to_vec(),
            time: Some(Utc.with_ymd_and_hms(2024, 1, 5, 7, 8, 9).unwrap()),
            file: "main.rs".to_owned(),
            line: 12,
            has_caller: true,
            ..Record::default()
        };
        assert_eq!(
            rendered(&mut record, Flags::STD | Flags::UTC | Flags::SHORT_FILE),
            "{\"time\": \"2024-01-05 07:08:09\", \"file\": \"main.rs\", \"line\": 12, \
             \"level\": \"ERR\", \"message\": \"boom\"}\n"
        );
    }

    #[test]
    fn escapes_quotes_backslashes_and_controls() {
        assert_eq!(escaped(b"plain"), "plain");
        assert_eq!(escaped(b"say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escaped(b"C:\\dir"), "C:\\\\dir");
        assert_eq!(escaped(b"a\nb\tc\r"), "a\\nb\\tc\\r");
        assert_eq!(escaped(b"\x1b[0m"), "\\u001b[0m");
        assert_eq!(escaped(b"\x00"), "\\u0000");
    }

    #[test]
    fn non_ascii_is_copied_verbatim() {
        assert_eq!(escaped("한글 로그".as_bytes()), "한글 로그");
    }

    #[test]
    fn escaped_output_parses_back() {
        let mut record = Record {
            level: Some(Level::Warn),
            message: b"tab\there \"q\" \\ end".to_vec(),
            ..Record::default()
        };
        let line = rendered(&mut record, Flags::empty());
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["level"], "WRN");
        assert_eq!(value["message"], "tab\there \"q\" \\ end");
    }
}
