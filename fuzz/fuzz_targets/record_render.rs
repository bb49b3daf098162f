#![no_main]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use loglet_core::{Flags, Format, Level};
use loglet_pipeline::SinkWriter;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    json: bool,
    color: bool,
    /// 필드 플래그 비트 (정의되지 않은 비트는 버림)
    flags: u8,
    /// 최소 레벨 인덱스 (0~4로 접음)
    min_level: u8,
    /// 쓰기 경로 대신 레벨 지정 호출을 사용할지 여부
    leveled: Option<u8>,
    message: Vec<u8>,
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fuzz_target!(|input: FuzzInput| {
    let sink = SharedBuf::default();
    let format = if input.json { Format::Json } else { Format::Pretty };
    let min = Level::ALL[usize::from(input.min_level) % Level::ALL.len()];

    let writer = SinkWriter::builder()
        .output(sink.clone())
        .format(format)
        .flags(Flags::from_bits_truncate(input.flags))
        .color(input.color)
        .min_level(min.long_name())
        .build()
        .unwrap();

    match input.leveled {
        Some(index) => {
            let level = Level::ALL[usize::from(index) % Level::ALL.len()];
            let text = String::from_utf8_lossy(&input.message);
            writer.log(level, format_args!("{text}")).unwrap();
        }
        None => {
            writer.write_bytes(&input.message).unwrap();
        }
    }

    let output = sink.0.lock().unwrap().clone();
    if output.is_empty() {
        return;
    }

    // 기록된 줄은 정확히 하나의 줄바꿈으로 끝난다
    assert_eq!(output.last(), Some(&b'\n'));

    if input.json && std::str::from_utf8(&input.message).is_ok() {
        let line = std::str::from_utf8(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert!(value.get("message").is_some());
    }
});
