// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    args::{args_size_words, Arg, ArgValue},
    error::WriteError,
    thread::{ProcessKoid, ThreadKoid},
    trace_header,
    writer::Writer,
    KERNEL_OBJ_RECORD_TYPE, MAX_RECORD_WORDS, USERSPACE_OBJ_RECORD_TYPE,
};
use std::io::Write;

const PROCESS_OBJ_TYPE: u8 = 1;
const THREAD_OBJ_TYPE: u8 = 2;

trace_header! {
    UserspaceObjHeader (USERSPACE_OBJ_RECORD_TYPE) {
        u8, thread_ref: 16, 23;
        u16, name_ref: 24, 39;
        u8, arg_count: 40, 43;
    }
}

trace_header! {
    KernelObjHeader (KERNEL_OBJ_RECORD_TYPE) {
        u8, obj_type: 16, 23;
        u16, name_ref: 24, 39;
        u8, arg_count: 40, 43;
    }
}

impl<W: Write> Writer<W> {
    /// Names a pointer-identified object within the given thread's process.
    pub fn add_userspace_object_record(
        &mut self,
        name: &str,
        process: ProcessKoid,
        thread: ThreadKoid,
        pointer: u64,
        args: &[Arg<'_>],
    ) -> Result<(), WriteError> {
        let name_ref = self.get_or_intern_string(name)?;
        let thread_ref = self.get_or_intern_thread(process, thread)?;

        let processed = self.preprocess_args(args)?;
        let size_words = 1 + 1 + args_size_words(&processed);
        if size_words > MAX_RECORD_WORDS {
            return Err(WriteError::RecordSizeTooLarge { words: size_words });
        }

        let mut header = UserspaceObjHeader::empty();
        header.set_size_words(size_words as u16);
        header.set_thread_ref(thread_ref.get());
        header.set_name_ref(name_ref.get());
        header.set_arg_count(args.len() as u8);
        self.write_word(header.raw())?;
        self.write_word(pointer)?;
        self.emit_args(args, &processed)
    }

    /// Gives a process koid a human-readable name.
    pub fn set_process_name(
        &mut self,
        process: ProcessKoid,
        name: &str,
    ) -> Result<(), WriteError> {
        let name_ref = self.get_or_intern_string(name)?;

        let mut header = KernelObjHeader::empty();
        header.set_size_words(2); // header, process koid
        header.set_obj_type(PROCESS_OBJ_TYPE);
        header.set_name_ref(name_ref.get());
        header.set_arg_count(0);
        self.write_word(header.raw())?;
        self.write_word(process.0)
    }

    /// Gives a thread koid a human-readable name. The owning process rides
    /// along as a koid argument so readers can scope the thread correctly.
    pub fn set_thread_name(
        &mut self,
        process: ProcessKoid,
        thread: ThreadKoid,
        name: &str,
    ) -> Result<(), WriteError> {
        let name_ref = self.get_or_intern_string(name)?;
        let process_arg = Arg::new("process", ArgValue::KernelObj(process.0));
        let processed = self.preprocess_arg(&process_arg)?;

        let size_words = 2 + processed.size_words();
        if size_words > MAX_RECORD_WORDS {
            return Err(WriteError::RecordSizeTooLarge { words: size_words });
        }

        let mut header = KernelObjHeader::empty();
        header.set_size_words(size_words as u16);
        header.set_obj_type(THREAD_OBJ_TYPE);
        header.set_name_ref(name_ref.get());
        header.set_arg_count(1);
        self.write_word(header.raw())?;
        self.write_word(thread.0)?;

        let expected = processed.size_words();
        let observed = self.emit_arg(&process_arg, &processed)?;
        if observed != expected {
            return Err(WriteError::WriteLengthMismatch { expected, observed });
        }
        Ok(())
    }
}
