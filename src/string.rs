// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{bytes_to_words, error::WriteError, trace_header, writer::Writer, STRING_RECORD_TYPE};
use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::io::Write;
use std::num::NonZeroU16;

pub(crate) const STRING_REF_INLINE_BIT: u16 = 0x8000;

/// Longest byte sequence an inline string reference can describe.
pub(crate) const MAX_INLINE_STRING_LENGTH: usize = 0x7fff;

/// Longest string a string record can bind to an index.
pub(crate) const MAX_STRING_RECORD_LENGTH: usize = 0x7ffe;

const STRING_TABLE_CAPACITY: usize = 512;

/// A string destined for an argument name or value, either interned through
/// the writer's string table or written inline in the referencing record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringRef<'a> {
    Interned(&'a str),
    Inline(&'a str),
}

impl<'a> From<&'a str> for StringRef<'a> {
    fn from(s: &'a str) -> Self {
        Self::Interned(s)
    }
}

/// Index bookkeeping for emitted string records. Only content hashes are
/// retained; an index is recycled once the table wraps, and the replacement
/// string record re-binds it in-stream before any record references it.
pub(crate) struct StringTable {
    hashes: [u64; STRING_TABLE_CAPACITY],
    next_index: u32,
}

impl StringTable {
    pub fn new() -> Self {
        Self { hashes: [0; STRING_TABLE_CAPACITY], next_index: 0 }
    }

    fn lookup(&self, hash: u64) -> Option<NonZeroU16> {
        let in_use = (self.next_index as usize).min(STRING_TABLE_CAPACITY);
        self.hashes[..in_use]
            .iter()
            .position(|&occupant| occupant == hash)
            .map(|slot| NonZeroU16::new(slot as u16 + 1).unwrap())
    }

    fn next_slot(&self) -> u16 {
        (self.next_index as usize % STRING_TABLE_CAPACITY) as u16
    }

    fn insert(&mut self, hash: u64) -> NonZeroU16 {
        let slot = self.next_slot();
        self.hashes[slot as usize] = hash;
        self.next_index += 1;
        NonZeroU16::new(slot + 1).unwrap()
    }
}

impl std::fmt::Debug for StringTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringTable").field("next_index", &self.next_index).finish_non_exhaustive()
    }
}

fn string_hash(s: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(s.as_bytes());
    hasher.finish()
}

trace_header! {
    StringHeader (STRING_RECORD_TYPE) {
        u16, string_index: 16, 30;
        u16, string_length: 32, 46;
    }
}

impl<W: Write> Writer<W> {
    /// Returns the string table index bound to `s`, emitting a string record
    /// that binds it first if the content isn't already in the table. The
    /// table holds hashes of the most recent 512 distinct strings; older
    /// bindings are replaced as it wraps.
    pub fn get_or_intern_string(&mut self, s: &str) -> Result<NonZeroU16, WriteError> {
        if s.len() > MAX_STRING_RECORD_LENGTH {
            return Err(WriteError::StringTooLong { len: s.len() });
        }
        let hash = string_hash(s);
        if let Some(index) = self.strings.lookup(hash) {
            return Ok(index);
        }
        let index = NonZeroU16::new(self.strings.next_slot() + 1).unwrap();
        self.add_string_record(index, s)?;
        Ok(self.strings.insert(hash))
    }

    fn add_string_record(&mut self, index: NonZeroU16, s: &str) -> Result<(), WriteError> {
        let mut header = StringHeader::empty();
        header.set_size_words(1 + bytes_to_words(s.len()) as u16);
        header.set_string_index(index.get());
        header.set_string_length(s.len() as u16);
        self.write_word(header.raw())?;
        self.write_padded_bytes(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FxtBuilder;
    use assert_matches::assert_matches;

    #[test]
    fn intern_emits_a_binding_record() {
        let mut writer = Writer::new(Vec::new());
        assert_eq!(writer.get_or_intern_string("foo").unwrap().get(), 1);

        let mut header = StringHeader::empty();
        header.set_string_index(1);
        header.set_string_length(3);
        assert_eq!(writer.into_inner(), FxtBuilder::new(header).atom("foo").build());
    }

    #[test]
    fn intern_is_idempotent() {
        let mut writer = Writer::new(Vec::new());
        let first = writer.get_or_intern_string("foo").unwrap();
        let len_after_first = writer.sink_len();
        let second = writer.get_or_intern_string("foo").unwrap();
        assert_eq!(first, second);
        assert_eq!(writer.sink_len(), len_after_first, "no second record for the same content");
    }

    #[test]
    fn distinct_strings_get_distinct_indices() {
        let mut writer = Writer::new(Vec::new());
        let foo = writer.get_or_intern_string("foo").unwrap();
        let bar = writer.get_or_intern_string("bar").unwrap();
        assert_eq!(foo.get(), 1);
        assert_eq!(bar.get(), 2);
    }

    #[test]
    fn table_wraps_back_to_the_first_index() {
        let mut writer = Writer::new(Vec::new());
        for n in 0..STRING_TABLE_CAPACITY {
            let index = writer.get_or_intern_string(&format!("str-{n}")).unwrap();
            assert_eq!(index.get() as usize, n + 1);
        }
        // One past capacity recycles slot 0, re-binding index 1 to new content.
        let index = writer.get_or_intern_string("one-more").unwrap();
        assert_eq!(index.get(), 1);
    }

    #[test]
    fn overlong_string_is_rejected_before_any_bytes() {
        let mut writer = Writer::new(Vec::new());
        let too_long = "x".repeat(MAX_STRING_RECORD_LENGTH + 1);
        assert_matches!(
            writer.get_or_intern_string(&too_long),
            Err(WriteError::StringTooLong { len }) if len == MAX_STRING_RECORD_LENGTH + 1
        );
        assert_eq!(writer.into_inner(), Vec::<u8>::new());
    }

    #[test]
    fn longest_permitted_string_is_accepted() {
        let mut writer = Writer::new(Vec::new());
        let longest = "x".repeat(MAX_STRING_RECORD_LENGTH);
        writer.get_or_intern_string(&longest).unwrap();
    }
}
