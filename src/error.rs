// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use thiserror::Error;

/// Reasons a record can fail to reach the output stream. A failure partway
/// through a record leaves the stream truncated; the bytes already handed to
/// the sink are not recalled.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write to the output stream")]
    Io(#[from] std::io::Error),

    #[error("string of {len} bytes exceeds the record's length field")]
    StringTooLong { len: usize },

    #[error("encoded {observed} argument words but expected {expected}, the stream is corrupt")]
    WriteLengthMismatch { expected: usize, observed: usize },

    #[error("blob of {len} bytes exceeds the blob size field")]
    DataTooLong { len: usize },

    #[error("outgoing thread state {state} does not fit in four bits")]
    InvalidOutgoingThreadState { state: u8 },

    #[error("record of {words} words exceeds the 12-bit size field")]
    RecordSizeTooLarge { words: usize },

    #[error("argument name of {len} bytes exceeds the inline string maximum")]
    ArgNameTooLong { len: usize },

    #[error("argument string value of {len} bytes exceeds the inline string maximum")]
    ArgValueTooLong { len: usize },

    #[error("{count} arguments exceed the 4-bit argument count field")]
    TooManyArgs { count: usize },
}
