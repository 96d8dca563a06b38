// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    args::{args_size_words, Arg},
    error::WriteError,
    thread::ThreadKoid,
    trace_header,
    writer::Writer,
    MAX_RECORD_WORDS, SCHEDULING_RECORD_TYPE,
};
use std::io::Write;

const CONTEXT_SWITCH_EVENT_TYPE: u8 = 1;
const THREAD_WAKEUP_EVENT_TYPE: u8 = 2;

const MAX_OUTGOING_THREAD_STATE: u8 = 0xf;

trace_header! {
    ContextSwitchHeader (SCHEDULING_RECORD_TYPE) {
        u8, arg_count: 16, 19;
        u16, cpu_number: 20, 35;
        u8, outgoing_thread_state: 36, 39;
        u8, event_type: 60, 63;
    }
}

trace_header! {
    ThreadWakeupHeader (SCHEDULING_RECORD_TYPE) {
        u8, arg_count: 16, 19;
        u16, cpu_number: 20, 35;
        u8, event_type: 60, 63;
    }
}

impl<W: Write> Writer<W> {
    /// Records a cpu switching between threads. Callers may attach Int32
    /// arguments named "incoming_weight" and "outgoing_weight" by convention
    /// to describe the relative weights of the two threads.
    pub fn add_context_switch_record(
        &mut self,
        cpu_number: u16,
        outgoing_thread_state: u8,
        outgoing_thread: ThreadKoid,
        incoming_thread: ThreadKoid,
        timestamp: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        if outgoing_thread_state > MAX_OUTGOING_THREAD_STATE {
            return Err(WriteError::InvalidOutgoingThreadState { state: outgoing_thread_state });
        }

        let processed = self.preprocess_args(args)?;
        let size_words = 1 + 3 + args_size_words(&processed);
        if size_words > MAX_RECORD_WORDS {
            return Err(WriteError::RecordSizeTooLarge { words: size_words });
        }

        let mut header = ContextSwitchHeader::empty();
        header.set_size_words(size_words as u16);
        header.set_event_type(CONTEXT_SWITCH_EVENT_TYPE);
        header.set_arg_count(args.len() as u8);
        header.set_cpu_number(cpu_number);
        header.set_outgoing_thread_state(outgoing_thread_state);
        self.write_word(header.raw())?;
        self.write_word(timestamp)?;
        self.write_word(outgoing_thread.0)?;
        self.write_word(incoming_thread.0)?;
        self.emit_args(args, &processed)
    }

    /// Records a thread becoming runnable on a cpu. Callers may attach an
    /// Int32 argument named "weight" by convention.
    pub fn add_thread_wakeup_record(
        &mut self,
        cpu_number: u16,
        waking_thread: ThreadKoid,
        timestamp: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let processed = self.preprocess_args(args)?;
        let size_words = 1 + 2 + args_size_words(&processed);
        if size_words > MAX_RECORD_WORDS {
            return Err(WriteError::RecordSizeTooLarge { words: size_words });
        }

        let mut header = ThreadWakeupHeader::empty();
        header.set_size_words(size_words as u16);
        header.set_event_type(THREAD_WAKEUP_EVENT_TYPE);
        header.set_arg_count(args.len() as u8);
        header.set_cpu_number(cpu_number);
        self.write_word(header.raw())?;
        self.write_word(timestamp)?;
        self.write_word(waking_thread.0)?;
        self.emit_args(args, &processed)
    }
}
