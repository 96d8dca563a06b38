// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{error::WriteError, trace_header, writer::Writer, THREAD_RECORD_TYPE};
use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::io::Write;
use std::num::NonZeroU8;

const THREAD_TABLE_CAPACITY: usize = 128;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ProcessKoid(pub u64);

impl From<u64> for ProcessKoid {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl PartialEq<u64> for ProcessKoid {
    fn eq(&self, other: &u64) -> bool {
        self.0.eq(other)
    }
}

impl std::fmt::Display for ProcessKoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ThreadKoid(pub u64);

impl From<u64> for ThreadKoid {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl PartialEq<u64> for ThreadKoid {
    fn eq(&self, other: &u64) -> bool {
        self.0.eq(other)
    }
}

impl std::fmt::Display for ThreadKoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index bookkeeping for emitted thread records, keyed by the hash of a
/// (process, thread) koid pair. Works like the string table with a smaller
/// capacity.
pub(crate) struct ThreadTable {
    hashes: [u64; THREAD_TABLE_CAPACITY],
    next_index: u32,
}

impl ThreadTable {
    pub fn new() -> Self {
        Self { hashes: [0; THREAD_TABLE_CAPACITY], next_index: 0 }
    }

    fn lookup(&self, hash: u64) -> Option<NonZeroU8> {
        let in_use = (self.next_index as usize).min(THREAD_TABLE_CAPACITY);
        self.hashes[..in_use]
            .iter()
            .position(|&occupant| occupant == hash)
            .map(|slot| NonZeroU8::new(slot as u8 + 1).unwrap())
    }

    fn next_slot(&self) -> u8 {
        (self.next_index as usize % THREAD_TABLE_CAPACITY) as u8
    }

    fn insert(&mut self, hash: u64) -> NonZeroU8 {
        let slot = self.next_slot();
        self.hashes[slot as usize] = hash;
        self.next_index += 1;
        NonZeroU8::new(slot + 1).unwrap()
    }
}

impl std::fmt::Debug for ThreadTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadTable").field("next_index", &self.next_index).finish_non_exhaustive()
    }
}

fn thread_hash(process: ProcessKoid, thread: ThreadKoid) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(process.0);
    hasher.write_u64(thread.0);
    hasher.finish()
}

trace_header! {
    ThreadHeader (THREAD_RECORD_TYPE) {
        u8, thread_index: 16, 23;
    }
}

impl<W: Write> Writer<W> {
    /// Returns the thread table index bound to the koid pair, emitting a
    /// thread record that binds it first if the pair isn't already in the
    /// table.
    pub fn get_or_intern_thread(
        &mut self,
        process: ProcessKoid,
        thread: ThreadKoid,
    ) -> Result<NonZeroU8, WriteError> {
        let hash = thread_hash(process, thread);
        if let Some(index) = self.threads.lookup(hash) {
            return Ok(index);
        }
        let index = NonZeroU8::new(self.threads.next_slot() + 1).unwrap();
        self.add_thread_record(index, process, thread)?;
        Ok(self.threads.insert(hash))
    }

    fn add_thread_record(
        &mut self,
        index: NonZeroU8,
        process: ProcessKoid,
        thread: ThreadKoid,
    ) -> Result<(), WriteError> {
        let mut header = ThreadHeader::empty();
        header.set_size_words(3); // header, process koid, thread koid
        header.set_thread_index(index.get());
        self.write_word(header.raw())?;
        self.write_word(process.0)?;
        self.write_word(thread.0)
    }
}
