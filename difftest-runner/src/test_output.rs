// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Utilities for capturing the output of stage processes.

use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// The complete captured output of a child process: stdout and stderr, in the order the child
/// wrote them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CapturedOutput {
    /// The raw buffer.
    pub buf: Bytes,
}

impl CapturedOutput {
    /// Gets the output as a lossy UTF-8 string.
    #[inline]
    pub fn lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }
}

/// Accumulates output from a child process.
#[derive(Debug)]
pub struct OutputAccumulator {
    buf: BytesMut,
}

impl OutputAccumulator {
    /// Creates a new, empty accumulator.
    #[expect(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(CHUNK_SIZE),
        }
    }

    /// Appends bytes that didn't come from the child, such as an error message.
    pub fn push_str(&mut self, s: &str) {
        push_chunk(self, s.as_bytes());
    }

    /// Called once capturing is complete.
    pub fn freeze(self) -> CapturedOutput {
        CapturedOutput {
            buf: self.buf.freeze(),
        }
    }
}

/// The size of each buffered reader's buffer, and the size at which the combined buffer grows.
const CHUNK_SIZE: usize = 4 * 1024;

/// Reads the combined stdout and stderr of a child to the end into `acc`.
pub async fn collect_output<R>(reader: R, acc: &mut OutputAccumulator) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, reader);
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        let len = buf.len();
        push_chunk(acc, buf);
        reader.consume(len);
    }
}

#[inline]
fn push_chunk(acc: &mut OutputAccumulator, chunk: &[u8]) {
    if acc.buf.capacity() - acc.buf.len() < chunk.len() {
        acc.buf.reserve(CHUNK_SIZE.max(chunk.len()));
    }
    acc.buf.extend_from_slice(chunk);
}
