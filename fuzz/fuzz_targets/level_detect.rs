#![no_main]

use libfuzzer_sys::fuzz_target;
use loglet_pipeline::level::detect;

fuzz_target!(|data: &[u8]| {
    let (detection, rest) = detect(data);

    // 나머지는 항상 입력의 접미사다
    assert!(data.ends_with(rest));

    match detection {
        Some(found) => {
            assert!(rest.len() < data.len());
            let token_start = usize::from(found.bracketed);
            assert!(data[token_start..].starts_with(found.tag().as_bytes()));
        }
        None => assert_eq!(rest.len(), data.len()),
    }
});
