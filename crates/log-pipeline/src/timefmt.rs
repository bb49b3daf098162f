//! 고정 폭 타임스탬프 포맷터
//!
//! 범용 포맷 매크로 없이 두 개의 조회 테이블(십의 자리, 일의 자리)로
//! 숫자를 직접 버퍼에 씁니다.
//!
//! | 플래그 | 출력 |
//! |--------|------|
//! | `DATE` | `YYYY-MM-DD` |
//! | `TIME` | `HH:MM:SS` |
//! | `MICROSECONDS` | `.ffffff` (`TIME` 필요) |
//! | `UTC` | 포맷 전에 UTC로 변환 |

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeDelta, Timelike, Utc};

use loglet_core::Flags;

/// 0~99 각 값의 십의 자리 숫자
const DIGITS_TENS: &[u8; 100] = b"\
0000000000111111111122222222223333333333444444444455555555556666666666777777777788888888889999999999";

/// 0~99 각 값의 일의 자리 숫자
const DIGITS_ONES: &[u8; 100] = b"\
0123456789012345678901234567890123456789012345678901234567890123456789012345678901234567890123456789";

/// 타임스탬프가 없을 때(zero value) 출력하는 값
pub const ZERO_TIMESTAMP: &[u8] = b"0000-00-00 00:00:00";

/// 타임스탬프를 버퍼 끝에 덧붙입니다.
///
/// `timestamp`가 `None`(zero value)이면 플래그와 관계없이 [`ZERO_TIMESTAMP`]를 씁니다.
/// 마이크로초는 반올림을 위해 500나노초를 더한 뒤 잘라냅니다.
pub fn append_timestamp(buf: &mut Vec<u8>, timestamp: Option<DateTime<Utc>>, flags: Flags) {
    let Some(timestamp) = timestamp else {
        buf.extend_from_slice(ZERO_TIMESTAMP);
        return;
    };

    let timestamp = timestamp
        .checked_add_signed(TimeDelta::nanoseconds(500))
        .unwrap_or(timestamp);
    let t: NaiveDateTime = if flags.contains(Flags::UTC) {
        timestamp.naive_utc()
    } else {
        timestamp.with_timezone(&Local).naive_local()
    };

    let date = flags.contains(Flags::DATE);
    let time = flags.contains(Flags::TIME);

    if date {
        let year = t.year().clamp(0, 9999) as usize;
        push_two(buf, year / 100);
        push_two(buf, year % 100);
        buf.push(b'-');
        push_two(buf, t.month() as usize);
        buf.push(b'-');
        push_two(buf, t.day() as usize);
    }

    if time {
        if date {
            buf.push(b' ');
        }
        push_two(buf, t.hour() as usize);
        buf.push(b':');
        push_two(buf, t.minute() as usize);
        buf.push(b':');
        push_two(buf, t.second() as usize);

        if flags.contains(Flags::MICROSECONDS) {
            // 윤초 구간에서는 나노초가 1초를 넘을 수 있다
            let micro = (t.nanosecond() / 1000).min(999_999) as usize;
            buf.push(b'.');
            push_two(buf, micro / 10_000);
            push_two(buf, micro / 100 % 100);
            push_two(buf, micro % 100);
        }
    }
}

/// 부호 없는 정수를 10진수로 덧붙입니다.
pub fn append_decimal(buf: &mut Vec<u8>, mut n: u32) {
    let mut scratch = [0u8; 10];
    let mut pos = scratch.len();

    while n >= 100 {
        let pair = (n % 100) as usize;
        n /= 100;
        pos -= 2;
        scratch[pos] = DIGITS_TENS[pair];
        scratch[pos + 1] = DIGITS_ONES[pair];
    }

    let pair = n as usize;
    if pair >= 10 {
        pos -= 2;
        scratch[pos] = DIGITS_TENS[pair];
        scratch[pos + 1] = DIGITS_ONES[pair];
    } else {
        pos -= 1;
        scratch[pos] = DIGITS_ONES[pair];
    }

    buf.extend_from_slice(&scratch[pos..]);
}

#[inline]
fn push_two(buf: &mut Vec<u8>, value: usize) {
    buf.push(DIGITS_TENS[value]);
    buf.push(DIGITS_ONES[value]);
}
