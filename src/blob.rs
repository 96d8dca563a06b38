// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{bytes_to_words, error::WriteError, trace_header, writer::Writer, BLOB_RECORD_TYPE};
use std::io::Write;

pub(crate) const MAX_BLOB_LENGTH: usize = 0x7fffff;

/// What kind of payload a blob record carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlobType {
    Data = 1,
    LastBranch = 2,
    Perfetto = 3,
}

trace_header! {
    BlobHeader (BLOB_RECORD_TYPE) {
        u16, name_ref: 16, 31;
        u32, blob_size: 32, 46;
        u8, blob_type: 48, 55;
    }
}

impl<W: Write> Writer<W> {
    /// Attaches an opaque binary payload to the stream under an interned
    /// name.
    pub fn add_blob_record(
        &mut self,
        name: &str,
        data: &[u8],
        blob_type: BlobType,
    ) -> Result<(), WriteError> {
        if data.len() > MAX_BLOB_LENGTH {
            return Err(WriteError::DataTooLong { len: data.len() });
        }
        let name_ref = self.get_or_intern_string(name)?;

        let mut header = BlobHeader::empty();
        header.set_size_words(1 + bytes_to_words(data.len()) as u16);
        header.set_name_ref(name_ref.get());
        header.set_blob_size(data.len() as u32);
        header.set_blob_type(blob_type as u8);
        self.write_word(header.raw())?;
        self.write_padded_bytes(data)
    }
}
