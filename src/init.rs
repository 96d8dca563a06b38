// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{error::WriteError, trace_header, writer::Writer, INIT_RECORD_TYPE};
use std::io::Write;

trace_header! {
    InitHeader (INIT_RECORD_TYPE) {}
}

impl<W: Write> Writer<W> {
    /// Declares the tick rate for the timestamps of all subsequent event
    /// records, until replaced by another initialization record.
    pub fn add_initialization_record(&mut self, ticks_per_second: u64) -> Result<(), WriteError> {
        let mut header = InitHeader::empty();
        header.set_size_words(2);
        self.write_word(header.raw())?;
        self.write_word(ticks_per_second)
    }
}
