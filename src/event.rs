// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    args::{args_size_words, Arg},
    error::WriteError,
    thread::{ProcessKoid, ThreadKoid},
    trace_header,
    writer::Writer,
    EVENT_RECORD_TYPE, MAX_RECORD_WORDS,
};
use std::io::Write;

const INSTANT_EVENT_TYPE: u8 = 0;
const COUNTER_EVENT_TYPE: u8 = 1;
const DURATION_BEGIN_EVENT_TYPE: u8 = 2;
const DURATION_END_EVENT_TYPE: u8 = 3;
const DURATION_COMPLETE_EVENT_TYPE: u8 = 4;
const ASYNC_BEGIN_EVENT_TYPE: u8 = 5;
const ASYNC_INSTANT_EVENT_TYPE: u8 = 6;
const ASYNC_END_EVENT_TYPE: u8 = 7;
const FLOW_BEGIN_EVENT_TYPE: u8 = 8;
const FLOW_STEP_EVENT_TYPE: u8 = 9;
const FLOW_END_EVENT_TYPE: u8 = 10;

/// Discriminates the event subtypes and carries the extra trailing word some
/// of them append after the argument data.
#[derive(Clone, Copy, Debug, PartialEq)]
enum EventPayload {
    Instant,
    Counter { counter_id: u64 },
    DurationBegin,
    DurationEnd,
    DurationComplete { end_timestamp: u64 },
    AsyncBegin { id: u64 },
    AsyncInstant { id: u64 },
    AsyncEnd { id: u64 },
    FlowBegin { id: u64 },
    FlowStep { id: u64 },
    FlowEnd { id: u64 },
}

impl EventPayload {
    fn event_type(&self) -> u8 {
        match self {
            Self::Instant => INSTANT_EVENT_TYPE,
            Self::Counter { .. } => COUNTER_EVENT_TYPE,
            Self::DurationBegin => DURATION_BEGIN_EVENT_TYPE,
            Self::DurationEnd => DURATION_END_EVENT_TYPE,
            Self::DurationComplete { .. } => DURATION_COMPLETE_EVENT_TYPE,
            Self::AsyncBegin { .. } => ASYNC_BEGIN_EVENT_TYPE,
            Self::AsyncInstant { .. } => ASYNC_INSTANT_EVENT_TYPE,
            Self::AsyncEnd { .. } => ASYNC_END_EVENT_TYPE,
            Self::FlowBegin { .. } => FLOW_BEGIN_EVENT_TYPE,
            Self::FlowStep { .. } => FLOW_STEP_EVENT_TYPE,
            Self::FlowEnd { .. } => FLOW_END_EVENT_TYPE,
        }
    }

    fn extra_word(&self) -> Option<u64> {
        match *self {
            Self::Instant | Self::DurationBegin | Self::DurationEnd => None,
            Self::Counter { counter_id } => Some(counter_id),
            Self::DurationComplete { end_timestamp } => Some(end_timestamp),
            Self::AsyncBegin { id }
            | Self::AsyncInstant { id }
            | Self::AsyncEnd { id }
            | Self::FlowBegin { id }
            | Self::FlowStep { id }
            | Self::FlowEnd { id } => Some(id),
        }
    }
}

trace_header! {
    EventHeader (EVENT_RECORD_TYPE) {
        u8, event_type: 16, 19;
        u8, arg_count: 20, 23;
        u8, thread_ref: 24, 31;
        u16, category_ref: 32, 47;
        u16, name_ref: 48, 63;
    }
}

impl<W: Write> Writer<W> {
    pub fn add_instant_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        self.add_event(category, name, process, thread, timestamp, EventPayload::Instant, args)
    }

    pub fn add_counter_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        counter_id: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let payload = EventPayload::Counter { counter_id };
        self.add_event(category, name, process, thread, timestamp, payload, args)
    }

    pub fn add_duration_begin_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        self.add_event(category, name, process, thread, timestamp, EventPayload::DurationBegin, args)
    }

    pub fn add_duration_end_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        self.add_event(category, name, process, thread, timestamp, EventPayload::DurationEnd, args)
    }

    /// A whole span in one record: `timestamp` is when the span began,
    /// `end_timestamp` when it finished.
    pub fn add_duration_complete_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        end_timestamp: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let payload = EventPayload::DurationComplete { end_timestamp };
        self.add_event(category, name, process, thread, timestamp, payload, args)
    }

    pub fn add_async_begin_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        async_id: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let payload = EventPayload::AsyncBegin { id: async_id };
        self.add_event(category, name, process, thread, timestamp, payload, args)
    }

    pub fn add_async_instant_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        async_id: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let payload = EventPayload::AsyncInstant { id: async_id };
        self.add_event(category, name, process, thread, timestamp, payload, args)
    }

    pub fn add_async_end_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        async_id: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let payload = EventPayload::AsyncEnd { id: async_id };
        self.add_event(category, name, process, thread, timestamp, payload, args)
    }

    pub fn add_flow_begin_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        flow_id: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let payload = EventPayload::FlowBegin { id: flow_id };
        self.add_event(category, name, process, thread, timestamp, payload, args)
    }

    pub fn add_flow_step_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        flow_id: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let payload = EventPayload::FlowStep { id: flow_id };
        self.add_event(category, name, process, thread, timestamp, payload, args)
    }

    pub fn add_flow_end_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        flow_id: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let payload = EventPayload::FlowEnd { id: flow_id };
        self.add_event(category, name, process, thread, timestamp, payload, args)
    }

    /// All event subtypes share a layout: header, timestamp, arguments, then
    /// the subtype's extra word if it has one. Category, name, and thread
    /// identity are interned before the header is assembled so their indices
    /// can be packed into it.
    fn add_event(
        &mut self,
        category: &str,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        timestamp: u64,
        payload: EventPayload,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let category_ref = self.get_or_intern_string(category)?;
        let name_ref = self.get_or_intern_string(name)?;
        let thread_ref = self.get_or_intern_thread(process, thread)?;

        let processed = self.preprocess_args(args)?;
        let arg_words = args_size_words(&processed);
        let extra = payload.extra_word();
        let size_words = 1 + 1 + arg_words + extra.map_or(0, |_| 1);
        if size_words > MAX_RECORD_WORDS {
            return Err(WriteError::RecordSizeTooLarge { words: size_words });
        }

        let mut header = EventHeader::empty();
        header.set_size_words(size_words as u16);
        header.set_event_type(payload.event_type());
        header.set_arg_count(args.len() as u8);
        header.set_thread_ref(thread_ref.get());
        header.set_category_ref(category_ref.get());
        header.set_name_ref(name_ref.get());
        self.write_word(header.raw())?;
        self.write_word(timestamp)?;
        self.emit_args(args, &processed)?;
        if let Some(extra) = extra {
            self.write_word(extra)?;
        }
        Ok(())
    }
}
