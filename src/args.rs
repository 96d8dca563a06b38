// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    bytes_to_words,
    error::WriteError,
    string::{StringRef, MAX_INLINE_STRING_LENGTH, STRING_REF_INLINE_BIT},
    trace_header,
    writer::Writer,
};
use std::io::Write;

const NULL_ARG_TYPE: u8 = 0;
const INT32_ARG_TYPE: u8 = 1;
const UINT32_ARG_TYPE: u8 = 2;
const INT64_ARG_TYPE: u8 = 3;
const UINT64_ARG_TYPE: u8 = 4;
const DOUBLE_ARG_TYPE: u8 = 5;
const STRING_ARG_TYPE: u8 = 6;
const POINTER_ARG_TYPE: u8 = 7;
const KOID_ARG_TYPE: u8 = 8;
const BOOL_ARG_TYPE: u8 = 9;

/// Most arguments a single record can carry, the maximum of its 4-bit
/// argument count field.
pub(crate) const MAX_ARG_COUNT: usize = 15;

/// A name/value pair attached to a record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arg<'a> {
    pub(crate) name: StringRef<'a>,
    pub(crate) value: ArgValue<'a>,
}

impl<'a> Arg<'a> {
    pub fn new(name: impl Into<StringRef<'a>>, value: impl Into<ArgValue<'a>>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ArgValue<'a> {
    Null,
    Signed32(i32),
    Unsigned32(u32),
    Signed64(i64),
    Unsigned64(u64),
    Double(f64),
    String(StringValue<'a>),
    Pointer(u64),
    KernelObj(u64),
    Boolean(bool),
}

/// How a string argument's value reaches the stream: through the string
/// table, inline in the argument, or hex-rendered from raw bytes (two
/// lowercase digits per byte, always inline).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringValue<'a> {
    Interned(&'a str),
    Inline(&'a str),
    Hex(&'a [u8]),
}

macro_rules! arg_value_from {
    ($(($type:ty, $variant:ident)),* $(,)?) => {
        $(
            impl<'a> From<$type> for ArgValue<'a> {
                fn from(value: $type) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

arg_value_from!(
    (i32, Signed32),
    (u32, Unsigned32),
    (i64, Signed64),
    (u64, Unsigned64),
    (f64, Double),
    (bool, Boolean),
);

impl<'a> From<()> for ArgValue<'a> {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl<'a> From<&'a str> for ArgValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::String(StringValue::Interned(value))
    }
}

impl<'a> From<StringValue<'a>> for ArgValue<'a> {
    fn from(value: StringValue<'a>) -> Self {
        Self::String(value)
    }
}

impl ArgValue<'_> {
    fn raw_type(&self) -> u8 {
        match self {
            Self::Null => NULL_ARG_TYPE,
            Self::Signed32(_) => INT32_ARG_TYPE,
            Self::Unsigned32(_) => UINT32_ARG_TYPE,
            Self::Signed64(_) => INT64_ARG_TYPE,
            Self::Unsigned64(_) => UINT64_ARG_TYPE,
            Self::Double(_) => DOUBLE_ARG_TYPE,
            Self::String(_) => STRING_ARG_TYPE,
            Self::Pointer(_) => POINTER_ARG_TYPE,
            Self::KernelObj(_) => KOID_ARG_TYPE,
            Self::Boolean(_) => BOOL_ARG_TYPE,
        }
    }
}

trace_header! {
    ArgHeader (NULL_ARG_TYPE) {
        u16, name_ref: 16, 31;
        u32, value: 32, 63;
    }
}

/// String references and word counts resolved ahead of emission, so a
/// record's total size is known before its header is written.
#[derive(Debug)]
pub(crate) struct ProcessedArg {
    name_ref: u16,
    value_ref: u16,
    name_words: usize,
    header_and_value_words: usize,
}

impl ProcessedArg {
    pub fn size_words(&self) -> usize {
        self.name_words + self.header_and_value_words
    }
}

pub(crate) fn args_size_words(processed: &[ProcessedArg]) -> usize {
    processed.iter().map(|p| p.size_words()).sum()
}

impl<W: Write> Writer<W> {
    /// Resolves an argument's string references, interning where requested,
    /// and computes how many words its encoding will occupy.
    pub(crate) fn preprocess_arg(&mut self, arg: &Arg<'_>) -> Result<ProcessedArg, WriteError> {
        let (name_ref, name_words) = match arg.name {
            StringRef::Interned(name) => (self.get_or_intern_string(name)?.get(), 0),
            StringRef::Inline(name) => {
                if name.len() > MAX_INLINE_STRING_LENGTH {
                    return Err(WriteError::ArgNameTooLong { len: name.len() });
                }
                (STRING_REF_INLINE_BIT | name.len() as u16, bytes_to_words(name.len()))
            }
        };
        let (value_ref, header_and_value_words) = match arg.value {
            ArgValue::Null
            | ArgValue::Signed32(_)
            | ArgValue::Unsigned32(_)
            | ArgValue::Boolean(_) => (0, 1),
            ArgValue::Signed64(_)
            | ArgValue::Unsigned64(_)
            | ArgValue::Double(_)
            | ArgValue::Pointer(_)
            | ArgValue::KernelObj(_) => (0, 2),
            ArgValue::String(StringValue::Interned(value)) => {
                (self.get_or_intern_string(value)?.get(), 1)
            }
            ArgValue::String(StringValue::Inline(value)) => {
                if value.len() > MAX_INLINE_STRING_LENGTH {
                    return Err(WriteError::ArgValueTooLong { len: value.len() });
                }
                (STRING_REF_INLINE_BIT | value.len() as u16, 1 + bytes_to_words(value.len()))
            }
            ArgValue::String(StringValue::Hex(bytes)) => {
                let rendered_len = bytes.len() * 2;
                if rendered_len > MAX_INLINE_STRING_LENGTH {
                    return Err(WriteError::ArgValueTooLong { len: rendered_len });
                }
                (STRING_REF_INLINE_BIT | rendered_len as u16, 1 + bytes_to_words(rendered_len))
            }
        };
        Ok(ProcessedArg { name_ref, value_ref, name_words, header_and_value_words })
    }

    /// Emits one argument: packed header, inline name bytes if any, then the
    /// value payload. Returns the number of words actually written so the
    /// caller can cross-check the precomputed record size.
    pub(crate) fn emit_arg(
        &mut self,
        arg: &Arg<'_>,
        processed: &ProcessedArg,
    ) -> Result<usize, WriteError> {
        let mut header = ArgHeader::empty();
        header.set_raw_type(arg.value.raw_type());
        header.set_size_words(processed.size_words() as u16);
        header.set_name_ref(processed.name_ref);
        match arg.value {
            ArgValue::Signed32(n) => header.set_value(n as u32),
            ArgValue::Unsigned32(n) => header.set_value(n),
            ArgValue::Boolean(b) => header.set_value(b as u32),
            ArgValue::String(_) => header.set_value(processed.value_ref as u32),
            // 64-bit payloads ride in a trailing word, not the header.
            ArgValue::Null
            | ArgValue::Signed64(_)
            | ArgValue::Unsigned64(_)
            | ArgValue::Double(_)
            | ArgValue::Pointer(_)
            | ArgValue::KernelObj(_) => {}
        }
        self.write_word(header.raw())?;
        let mut words_written = 1;

        if let StringRef::Inline(name) = arg.name {
            self.write_padded_bytes(name.as_bytes())?;
            words_written += bytes_to_words(name.len());
        }

        match arg.value {
            ArgValue::Signed64(n) => {
                self.write_word(n as u64)?;
                words_written += 1;
            }
            ArgValue::Unsigned64(n) => {
                self.write_word(n)?;
                words_written += 1;
            }
            ArgValue::Double(d) => {
                self.write_word(d.to_bits())?;
                words_written += 1;
            }
            ArgValue::Pointer(p) => {
                self.write_word(p)?;
                words_written += 1;
            }
            ArgValue::KernelObj(koid) => {
                self.write_word(koid)?;
                words_written += 1;
            }
            ArgValue::String(StringValue::Inline(value)) => {
                self.write_padded_bytes(value.as_bytes())?;
                words_written += bytes_to_words(value.len());
            }
            ArgValue::String(StringValue::Hex(bytes)) => {
                let rendered = hex::encode(bytes);
                self.write_padded_bytes(rendered.as_bytes())?;
                words_written += bytes_to_words(rendered.len());
            }
            ArgValue::Null
            | ArgValue::Signed32(_)
            | ArgValue::Unsigned32(_)
            | ArgValue::Boolean(_)
            | ArgValue::String(StringValue::Interned(_)) => {}
        }

        Ok(words_written)
    }

    /// Phase one over a whole argument list, enforcing the count cap.
    pub(crate) fn preprocess_args(
        &mut self,
        args: &[Arg<'_>],
    ) -> Result<Vec<ProcessedArg>, WriteError> {
        if args.len() > MAX_ARG_COUNT {
            return Err(WriteError::TooManyArgs { count: args.len() });
        }
        args.iter().map(|arg| self.preprocess_arg(arg)).collect()
    }

    /// Phase two over a whole argument list, verifying that the words
    /// emitted match the precomputed total.
    pub(crate) fn emit_args(
        &mut self,
        args: &[Arg<'_>],
        processed: &[ProcessedArg],
    ) -> Result<(), WriteError> {
        let expected = args_size_words(processed);
        let mut observed = 0;
        for (arg, p) in args.iter().zip(processed) {
            observed += self.emit_arg(arg, p)?;
        }
        if observed != expected {
            return Err(WriteError::WriteLengthMismatch { expected, observed });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Preprocesses and emits a single argument, returning its bytes. The
    /// names used here are the writer's first interned strings, so interned
    /// name references count up from 1.
    fn encoded(arg: Arg<'_>) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new());
        let processed = writer.preprocess_arg(&arg).unwrap();
        let preamble = writer.sink_len();
        let words = writer.emit_arg(&arg, &processed).unwrap();
        assert_eq!(words, processed.size_words());
        writer.into_inner().split_off(preamble)
    }

    fn header_word(bytes: &[u8]) -> u64 {
        u64::from_le_bytes(bytes[..8].try_into().unwrap())
    }

    #[test]
    fn null_arg() {
        let bytes = encoded(Arg::new("key", ()));
        assert_eq!(bytes.len(), 8);
        // type 0, one word, name index 1
        assert_eq!(header_word(&bytes), (1 << 16) | (1 << 4));
    }

    #[test]
    fn signed32_arg() {
        let bytes = encoded(Arg::new("key", -2i32));
        assert_eq!(bytes.len(), 8);
        assert_eq!(
            header_word(&bytes),
            ((-2i32 as u32 as u64) << 32) | (1 << 16) | (1 << 4) | INT32_ARG_TYPE as u64
        );
    }

    #[test]
    fn unsigned32_arg() {
        let bytes = encoded(Arg::new("key", 984u32));
        assert_eq!(header_word(&bytes), (984u64 << 32) | (1 << 16) | (1 << 4) | 2);
    }

    #[test]
    fn signed64_arg_payload_rides_in_a_trailing_word() {
        let bytes = encoded(Arg::new("key", -851i64));
        assert_eq!(bytes.len(), 16);
        assert_eq!(header_word(&bytes), (1 << 16) | (2 << 4) | 3);
        assert_eq!(u64::from_le_bytes(bytes[8..].try_into().unwrap()), -851i64 as u64);
    }

    #[test]
    fn unsigned64_arg() {
        let bytes = encoded(Arg::new("key", 35u64));
        assert_eq!(bytes.len(), 16);
        assert_eq!(header_word(&bytes), (1 << 16) | (2 << 4) | 4);
        assert_eq!(u64::from_le_bytes(bytes[8..].try_into().unwrap()), 35);
    }

    #[test]
    fn double_arg_is_raw_bits() {
        let bytes = encoded(Arg::new("key", 1.0f64));
        assert_eq!(bytes.len(), 16);
        assert_eq!(header_word(&bytes), (1 << 16) | (2 << 4) | 5);
        assert_eq!(u64::from_le_bytes(bytes[8..].try_into().unwrap()), 1.0f64.to_bits());
    }

    #[test]
    fn interned_string_arg() {
        // "key" interns to 1, "value" to 2; neither is written inline.
        let bytes = encoded(Arg::new("key", "value"));
        assert_eq!(bytes.len(), 8);
        assert_eq!(header_word(&bytes), (2 << 32) | (1 << 16) | (1 << 4) | 6);
    }

    #[test]
    fn inline_string_arg() {
        let bytes = encoded(Arg::new("key", StringValue::Inline("str_value")));
        assert_eq!(bytes.len(), 24);
        let value_ref = (STRING_REF_INLINE_BIT | 9) as u64;
        assert_eq!(header_word(&bytes), (value_ref << 32) | (1 << 16) | (3 << 4) | 6);
        assert_eq!(&bytes[8..24], b"str_value\0\0\0\0\0\0\0");
    }

    #[test]
    fn hex_string_arg() {
        let bytes = encoded(Arg::new("key", StringValue::Hex(&[0xde, 0xad, 0xbe, 0xef])));
        assert_eq!(bytes.len(), 16);
        let value_ref = (STRING_REF_INLINE_BIT | 8) as u64;
        assert_eq!(header_word(&bytes), (value_ref << 32) | (1 << 16) | (2 << 4) | 6);
        assert_eq!(&bytes[8..16], b"deadbeef");
    }

    #[test]
    fn pointer_arg() {
        let bytes = encoded(Arg::new("key", ArgValue::Pointer(0x67890)));
        assert_eq!(bytes.len(), 16);
        assert_eq!(header_word(&bytes), (1 << 16) | (2 << 4) | 7);
        assert_eq!(u64::from_le_bytes(bytes[8..].try_into().unwrap()), 0x67890);
    }

    #[test]
    fn koid_arg() {
        let bytes = encoded(Arg::new("key", ArgValue::KernelObj(3)));
        assert_eq!(bytes.len(), 16);
        assert_eq!(header_word(&bytes), (1 << 16) | (2 << 4) | 8);
        assert_eq!(u64::from_le_bytes(bytes[8..].try_into().unwrap()), 3);
    }

    #[test]
    fn bool_arg_value_is_a_single_bit() {
        let bytes = encoded(Arg::new("key", true));
        assert_eq!(header_word(&bytes), (1u64 << 32) | (1 << 16) | (1 << 4) | 9);
        let bytes = encoded(Arg::new("key", false));
        assert_eq!(header_word(&bytes), (1 << 16) | (1 << 4) | 9);
    }

    #[test]
    fn inline_name_follows_the_header() {
        let bytes = encoded(Arg::new(StringRef::Inline("inline_name"), 7u32));
        assert_eq!(bytes.len(), 24);
        let name_ref = (STRING_REF_INLINE_BIT | 11) as u64;
        assert_eq!(header_word(&bytes), (7u64 << 32) | (name_ref << 16) | (3 << 4) | 2);
        assert_eq!(&bytes[8..24], b"inline_name\0\0\0\0\0");
    }

    #[test]
    fn inline_name_and_inline_value_are_ordered_name_first() {
        let bytes =
            encoded(Arg::new(StringRef::Inline("name"), StringValue::Inline("value")));
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[8..16], b"name\0\0\0\0");
        assert_eq!(&bytes[16..24], b"value\0\0\0");
    }

    #[test]
    fn longest_inline_value_is_accepted() {
        let value = "v".repeat(MAX_INLINE_STRING_LENGTH);
        let arg = Arg::new("key", StringValue::Inline(&value));
        let mut writer = Writer::new(Vec::new());
        let processed = writer.preprocess_arg(&arg).unwrap();
        assert_eq!(processed.size_words(), 1 + bytes_to_words(MAX_INLINE_STRING_LENGTH));
    }

    #[test]
    fn overlong_inline_value_is_rejected() {
        let value = "v".repeat(MAX_INLINE_STRING_LENGTH + 1);
        let arg = Arg::new("key", StringValue::Inline(&value));
        let mut writer = Writer::new(Vec::new());
        assert_matches!(
            writer.preprocess_arg(&arg),
            Err(WriteError::ArgValueTooLong { len }) if len == MAX_INLINE_STRING_LENGTH + 1
        );
    }

    #[test]
    fn overlong_hex_value_counts_rendered_digits() {
        // 0x4000 input bytes render to 0x8000 digits, one past the limit.
        let data = vec![0u8; 0x4000];
        let arg = Arg::new("key", StringValue::Hex(&data));
        let mut writer = Writer::new(Vec::new());
        assert_matches!(
            writer.preprocess_arg(&arg),
            Err(WriteError::ArgValueTooLong { len: 0x8000 })
        );
    }

    #[test]
    fn overlong_inline_name_is_rejected() {
        let name = "n".repeat(MAX_INLINE_STRING_LENGTH + 1);
        let arg = Arg::new(StringRef::Inline(&name), ());
        let mut writer = Writer::new(Vec::new());
        assert_matches!(
            writer.preprocess_arg(&arg),
            Err(WriteError::ArgNameTooLong { len }) if len == MAX_INLINE_STRING_LENGTH + 1
        );
    }

    #[test]
    fn sixteen_args_are_too_many() {
        let args: Vec<Arg<'_>> = (0..16).map(|_| Arg::new("key", ())).collect();
        let mut writer = Writer::new(Vec::new());
        assert_matches!(
            writer.preprocess_args(&args),
            Err(WriteError::TooManyArgs { count: 16 })
        );
    }
}
