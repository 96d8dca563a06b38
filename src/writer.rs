// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{error::WriteError, string::StringTable, thread::ThreadTable, word_padding};
use std::io::Write;

/// A trace stream encoder. Each `add_*` method encodes one or more complete
/// records and hands their bytes to the sink in stream order; nothing is
/// buffered internally. The writer is not safe for concurrent use — callers
/// serialize access, or give each thread its own writer and sink.
#[derive(Debug)]
pub struct Writer<W> {
    sink: W,
    pub(crate) strings: StringTable,
    pub(crate) threads: ThreadTable,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, strings: StringTable::new(), threads: ThreadTable::new() }
    }

    /// Consumes the writer, returning the sink it was writing to.
    pub fn into_inner(self) -> W {
        self.sink
    }

    pub(crate) fn write_word(&mut self, word: u64) -> Result<(), WriteError> {
        self.sink.write_all(&word.to_le_bytes())?;
        Ok(())
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.sink.write_all(bytes)?;
        Ok(())
    }

    pub(crate) fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        const ZEROS: [u8; 8] = [0; 8];
        self.sink.write_all(&ZEROS[..count])?;
        Ok(())
    }

    /// Writes a byte payload followed by the zero padding that extends it to
    /// a word boundary.
    pub(crate) fn write_padded_bytes(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.write_bytes(bytes)?;
        match word_padding(bytes.len()) {
            0 => Ok(()),
            padding => self.write_zeros(padding),
        }
    }
}

#[cfg(test)]
impl Writer<Vec<u8>> {
    pub(crate) fn sink_len(&self) -> usize {
        self.sink.len()
    }
}
