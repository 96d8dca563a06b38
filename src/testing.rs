// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::header::TraceHeader;
use crate::word_padding;

/// Assembles the expected bytes of a single record: a header followed by
/// word-padded payload atoms. The header's size field is filled in at build
/// time from the accumulated payload length.
pub(crate) struct FxtBuilder<H> {
    header: H,
    buf: Vec<u8>,
}

impl<H: TraceHeader> FxtBuilder<H> {
    pub fn new(header: H) -> Self {
        Self { header, buf: Vec::new() }
    }

    /// Appends a payload atom, zero-padding it to a word boundary.
    pub fn atom(mut self, atom: impl AsRef<[u8]>) -> Self {
        let atom = atom.as_ref();
        self.buf.extend(atom);
        self.buf.extend(std::iter::repeat(0u8).take(word_padding(atom.len())));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.header.set_size_words(1 + (self.buf.len() / 8) as u16);
        let mut out = self.header.to_le_bytes().to_vec();
        out.extend(self.buf);
        out
    }
}
