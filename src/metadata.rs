// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{bytes_to_words, error::WriteError, trace_header, writer::Writer, METADATA_RECORD_TYPE};
use std::io::Write;

const PROVIDER_INFO_METADATA_TYPE: u8 = 1;
const PROVIDER_SECTION_METADATA_TYPE: u8 = 2;
const PROVIDER_EVENT_METADATA_TYPE: u8 = 3;
const TRACE_INFO_METADATA_TYPE: u8 = 4;

const MAGIC_NUMBER_TRACE_INFO_TYPE: u8 = 0;
const MAGIC_NUMBER: u32 = 0x16547846;

const MAX_PROVIDER_NAME_LENGTH: usize = 0xff;

/// Out-of-band events a trace provider can report about itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    BufferFull,
}

impl ProviderEvent {
    fn event_id(&self) -> u8 {
        match self {
            Self::BufferFull => 0,
        }
    }
}

macro_rules! metadata_header {
    ($name:ident { $($record_specific:tt)* }) => {
        trace_header! {
            $name (METADATA_RECORD_TYPE) {
                $($record_specific)*
                u8, metadata_type: 16, 19;
            }
        }
    };
}

metadata_header! {
    ProviderInfoMetadataHeader {
        u32, provider_id: 20, 51;
        u8, name_len: 52, 59;
    }
}

metadata_header! {
    ProviderSectionMetadataHeader {
        u32, provider_id: 20, 51;
    }
}

metadata_header! {
    ProviderEventMetadataHeader {
        u32, provider_id: 20, 51;
        u8, event_id: 52, 55;
    }
}

metadata_header! {
    MagicNumberHeader {
        u8, trace_info_type: 20, 23;
        u32, magic_number: 24, 55;
    }
}

impl<W: Write> Writer<W> {
    /// Emits the stream-identifying magic number record. Readers expect this
    /// to be the first record of a stream.
    pub fn write_magic_number_record(&mut self) -> Result<(), WriteError> {
        let mut header = MagicNumberHeader::empty();
        header.set_size_words(1);
        header.set_metadata_type(TRACE_INFO_METADATA_TYPE);
        header.set_trace_info_type(MAGIC_NUMBER_TRACE_INFO_TYPE);
        header.set_magic_number(MAGIC_NUMBER);
        self.write_word(header.raw())
    }

    /// Declares a provider id and its human-readable name. Subsequent records
    /// are attributed to this provider until another declaration.
    pub fn add_provider_info_record(
        &mut self,
        provider_id: u32,
        name: &str,
    ) -> Result<(), WriteError> {
        if name.len() > MAX_PROVIDER_NAME_LENGTH {
            return Err(WriteError::StringTooLong { len: name.len() });
        }
        let mut header = ProviderInfoMetadataHeader::empty();
        header.set_size_words(1 + bytes_to_words(name.len()) as u16);
        header.set_metadata_type(PROVIDER_INFO_METADATA_TYPE);
        header.set_provider_id(provider_id);
        header.set_name_len(name.len() as u8);
        self.write_word(header.raw())?;
        self.write_padded_bytes(name.as_bytes())
    }

    /// Marks the following records as belonging to a previously declared
    /// provider.
    pub fn add_provider_section_record(&mut self, provider_id: u32) -> Result<(), WriteError> {
        let mut header = ProviderSectionMetadataHeader::empty();
        header.set_size_words(1);
        header.set_metadata_type(PROVIDER_SECTION_METADATA_TYPE);
        header.set_provider_id(provider_id);
        self.write_word(header.raw())
    }

    pub fn add_provider_event_record(
        &mut self,
        provider_id: u32,
        event: ProviderEvent,
    ) -> Result<(), WriteError> {
        let mut header = ProviderEventMetadataHeader::empty();
        header.set_size_words(1);
        header.set_metadata_type(PROVIDER_EVENT_METADATA_TYPE);
        header.set_provider_id(provider_id);
        header.set_event_id(event.event_id());
        self.write_word(header.raw())
    }
}
