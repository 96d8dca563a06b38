// Copyright 2023 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

#[macro_export]
macro_rules! trace_header {
    ($name:ident ($header_ty:expr) {
        $($field_ty:ty, $getter:ident: $start_bit:literal, $end_bit:literal;)*
    }) => {
        // We invoke the bitfield macros ourselves here so we can use derives on the type.
        #[derive(Clone, Copy, Eq, PartialEq)]
        pub(crate) struct $name(u64);

        bitfield::bitfield_bitrange! { struct $name(u64) }

        // NB: bitfield macros flip the start and end bits compared to ours.
        impl std::fmt::Debug for $name {
            bitfield::bitfield_debug! {
                struct $name;
                u8, raw_type, _: 3, 0;
                u16, size_words, _: 15, 4;
                $($field_ty, $getter, _: $end_bit, $start_bit;)*
            }
        }

        #[allow(dead_code)]
        impl $name {
            paste::paste! { bitfield::bitfield_fields! {
                u64;
                pub u8, raw_type, set_raw_type: 3, 0;
                pub u16, size_words, set_size_words: 15, 4;
                $(pub $field_ty, $getter, [<set_ $getter>]: $end_bit, $start_bit;)*
            }}

            pub(crate) fn empty() -> Self {
                let mut header = Self(0);
                header.set_raw_type($header_ty);
                header
            }

            pub(crate) fn raw(&self) -> u64 {
                self.0
            }
        }

        #[cfg(test)]
        impl $crate::header::TraceHeader for $name {
            fn set_size_words(&mut self, n: u16) {
                self.set_size_words(n);
            }
            fn to_le_bytes(&self) -> [u8; 8] {
                self.0.to_le_bytes()
            }
        }
    };
}

#[cfg(test)]
pub(crate) trait TraceHeader {
    fn set_size_words(&mut self, n: u16);
    fn to_le_bytes(&self) -> [u8; 8];
}
