//! Line pump: reads newline-delimited input and feeds each line to a writer.

use std::io::{BufRead, ErrorKind};

use anyhow::Context;

use loglet_pipeline::{SinkError, SinkWriter};

/// Feed every line of `input` through `writer`.
///
/// Returns the number of lines read. A closed downstream pipe ends the
/// pump early without an error.
pub fn pipe<R: BufRead>(mut input: R, writer: &SinkWriter) -> anyhow::Result<u64> {
    let mut line = Vec::with_capacity(256);
    let mut count = 0u64;

    loop {
        line.clear();
        let read = input
            .read_until(b'\n', &mut line)
            .context("failed to read input")?;
        if read == 0 {
            break;
        }
        count += 1;

        match writer.write_bytes(&line) {
            Ok(_) => {}
            Err(SinkError::Io(e)) if e.kind() == ErrorKind::BrokenPipe => {
                tracing::debug!(lines = count, "output closed, stopping");
                break;
            }
            Err(e) => return Err(e).with_context(|| format!("failed to write line {count}")),
        }
    }

    Ok(count)
}
