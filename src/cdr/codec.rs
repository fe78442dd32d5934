// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Stateful CDR serializer/deserializer over a growable buffer.
//!
//! The codec tracks two cursors:
//! - `offset`: current read/write position in the buffer
//! - `origin`: alignment anchor (buffer start, reset by encapsulation ops)
//!
//! Key concept: CDR alignment is calculated as `(offset - origin) % width`,
//! not `offset % width`, so primitives are aligned relative to the start of
//! the encapsulated payload rather than the start of the buffer.
//!
//! Every operation is transactional: on error the cursor, the alignment
//! anchor, the swap flag and the last-data-size record are exactly what
//! they were before the call. Multi-step operations (strings, sequences,
//! encapsulation, byte-order overrides) snapshot state on entry and
//! restore it on any failure path.
//!
//! # Example
//!
//! ```rust
//! use cdrcodec::{CdrBuffer, CdrCodec, CdrFlavor, Endianness};
//!
//! # fn main() -> cdrcodec::Result<()> {
//! let mut buffer = CdrBuffer::with_capacity(64);
//! let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Dds);
//! codec.serialize_encapsulation()?;
//! codec.serialize_u32(42)?;
//! codec.serialize_string("hello")?;
//! # Ok(())
//! # }
//! ```

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::trace;

use super::buffer::CdrBuffer;
use crate::core::{CdrFlavor, CodecError, Endianness, PlFlag, Result};

/// Encapsulation kind bit 0: stream endianness (0 = big, 1 = little).
const ENDIANNESS_BIT: u8 = 0x01;

/// Payload width of the extended-precision float.
const F128_WIDTH: usize = 16;

/// Extended-precision floats align to 8 bytes despite their 16-byte width.
const F128_ALIGNMENT: usize = 8;

/// Opaque snapshot of the codec's mutable cursor state.
///
/// Captures exactly the fields rolled back on a failed operation:
/// data cursor, alignment anchor, swap flag and last-data-size record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdrState {
    pub offset: usize,
    pub(crate) origin: usize,
    pub(crate) swap: bool,
    pub(crate) last_data_size: usize,
}

/// Stateful CDR codec over a borrowed [`CdrBuffer`].
///
/// Serialize operations grow the buffer on demand; deserialize operations
/// never grow it and fail when the populated region is exhausted. The
/// flavor is fixed at construction; the byte order may be changed per
/// call, per stream ([`read_encapsulation`](Self::read_encapsulation)) or
/// explicitly ([`change_endianness`](Self::change_endianness)).
#[derive(Debug)]
pub struct CdrCodec<'a> {
    /// Backing byte region
    buffer: &'a mut CdrBuffer,
    /// Plain CDR or DDS-CDR; immutable after construction
    flavor: CdrFlavor,
    /// Declared stream byte order
    endianness: Endianness,
    /// Whether multi-byte payloads are byte-reversed relative to the host
    swap: bool,
    /// DDS parameter-list flag (DDS-CDR only)
    pl_flag: PlFlag,
    /// DDS-CDR options header field
    options: u16,
    /// Current read/write position
    offset: usize,
    /// Origin offset for alignment calculation
    origin: usize,
    /// Width of the most recently serialized/deserialized primitive
    last_data_size: usize,
}

/// Generates the serialize/deserialize surface of one multi-byte
/// primitive: scalar and array forms, each with a default and a
/// byte-order-override variant. Payload bytes go through `byteorder`
/// dispatched on the effective stream endianness.
macro_rules! impl_cdr_primitive {
    ($ty:ty, $width:expr, $align:expr,
     $serialize:ident, $serialize_endian:ident,
     $deserialize:ident, $deserialize_endian:ident,
     $serialize_array:ident, $serialize_array_endian:ident,
     $deserialize_array:ident, $deserialize_array_endian:ident,
     $write:ident, $read:ident, $write_into:ident, $read_into:ident) => {
        #[doc = concat!("Serialize a `", stringify!($ty), "`, padding to its CDR alignment first.")]
        pub fn $serialize(&mut self, value: $ty) -> Result<&mut Self> {
            let padding = self.alignment_for($align);
            self.ensure_space(padding + $width)?;
            self.last_data_size = $width;
            self.write_padding(padding);

            let stream = self.stream_endianness();
            let start = self.offset;
            let dst = &mut self.buffer.as_mut_slice()[start..start + $width];
            match stream {
                Endianness::Big => BigEndian::$write(dst, value),
                Endianness::Little => LittleEndian::$write(dst, value),
            }
            self.offset = start + $width;
            Ok(self)
        }

        #[doc = concat!("Serialize a `", stringify!($ty), "` in the given byte order.")]
        pub fn $serialize_endian(&mut self, value: $ty, endianness: Endianness) -> Result<&mut Self> {
            let saved_swap = self.override_swap(endianness);
            let result = self.$serialize(value).map(|_| ());
            self.swap = saved_swap;
            result?;
            Ok(self)
        }

        #[doc = concat!("Deserialize a `", stringify!($ty), "`, skipping alignment padding first.")]
        pub fn $deserialize(&mut self) -> Result<$ty> {
            let padding = self.alignment_for($align);
            self.check_space(padding + $width)?;
            self.last_data_size = $width;
            self.offset += padding;

            let stream = self.stream_endianness();
            let src = &self.buffer.as_slice()[self.offset..self.offset + $width];
            let value = match stream {
                Endianness::Big => BigEndian::$read(src),
                Endianness::Little => LittleEndian::$read(src),
            };
            self.offset += $width;
            Ok(value)
        }

        #[doc = concat!("Deserialize a `", stringify!($ty), "` in the given byte order.")]
        pub fn $deserialize_endian(&mut self, endianness: Endianness) -> Result<$ty> {
            let saved_swap = self.override_swap(endianness);
            let result = self.$deserialize();
            self.swap = saved_swap;
            result
        }

        #[doc = concat!("Serialize a `", stringify!($ty), "` array: one alignment, then packed elements.")]
        pub fn $serialize_array(&mut self, values: &[$ty]) -> Result<&mut Self> {
            if values.is_empty() {
                return Ok(self);
            }

            let padding = self.alignment_for($align);
            let total = values.len() * $width;
            self.ensure_space(padding + total)?;
            self.last_data_size = $width;
            self.write_padding(padding);

            let stream = self.stream_endianness();
            let start = self.offset;
            let dst = &mut self.buffer.as_mut_slice()[start..start + total];
            match stream {
                Endianness::Big => BigEndian::$write_into(values, dst),
                Endianness::Little => LittleEndian::$write_into(values, dst),
            }
            self.offset = start + total;
            Ok(self)
        }

        #[doc = concat!("Serialize a `", stringify!($ty), "` array in the given byte order.")]
        pub fn $serialize_array_endian(
            &mut self,
            values: &[$ty],
            endianness: Endianness,
        ) -> Result<&mut Self> {
            let saved_swap = self.override_swap(endianness);
            let result = self.$serialize_array(values).map(|_| ());
            self.swap = saved_swap;
            result?;
            Ok(self)
        }

        #[doc = concat!("Deserialize a `", stringify!($ty), "` array into `out`.")]
        pub fn $deserialize_array(&mut self, out: &mut [$ty]) -> Result<()> {
            if out.is_empty() {
                return Ok(());
            }

            let padding = self.alignment_for($align);
            let total = out.len() * $width;
            self.check_space(padding + total)?;
            self.last_data_size = $width;
            self.offset += padding;

            let stream = self.stream_endianness();
            let src = &self.buffer.as_slice()[self.offset..self.offset + total];
            match stream {
                Endianness::Big => BigEndian::$read_into(src, out),
                Endianness::Little => LittleEndian::$read_into(src, out),
            }
            self.offset += total;
            Ok(())
        }

        #[doc = concat!("Deserialize a `", stringify!($ty), "` array in the given byte order.")]
        pub fn $deserialize_array_endian(
            &mut self,
            out: &mut [$ty],
            endianness: Endianness,
        ) -> Result<()> {
            let saved_swap = self.override_swap(endianness);
            let result = self.$deserialize_array(out);
            self.swap = saved_swap;
            result
        }
    };
}

/// Generates the surface of a single-byte primitive: no alignment, no
/// swapping, bulk copies for arrays.
macro_rules! impl_cdr_byte {
    ($ty:ty,
     $serialize:ident, $serialize_endian:ident,
     $deserialize:ident, $deserialize_endian:ident,
     $serialize_array:ident, $serialize_array_endian:ident,
     $deserialize_array:ident, $deserialize_array_endian:ident) => {
        #[doc = concat!("Serialize a `", stringify!($ty), "`.")]
        pub fn $serialize(&mut self, value: $ty) -> Result<&mut Self> {
            self.ensure_space(1)?;
            self.last_data_size = 1;
            self.buffer.as_mut_slice()[self.offset] = value as u8;
            self.offset += 1;
            Ok(self)
        }

        #[doc = concat!("Serialize a `", stringify!($ty), "` in the given byte order (single byte, order is moot).")]
        pub fn $serialize_endian(&mut self, value: $ty, endianness: Endianness) -> Result<&mut Self> {
            let saved_swap = self.override_swap(endianness);
            let result = self.$serialize(value).map(|_| ());
            self.swap = saved_swap;
            result?;
            Ok(self)
        }

        #[doc = concat!("Deserialize a `", stringify!($ty), "`.")]
        pub fn $deserialize(&mut self) -> Result<$ty> {
            self.check_space(1)?;
            self.last_data_size = 1;
            let value = self.buffer.as_slice()[self.offset] as $ty;
            self.offset += 1;
            Ok(value)
        }

        #[doc = concat!("Deserialize a `", stringify!($ty), "` in the given byte order (single byte, order is moot).")]
        pub fn $deserialize_endian(&mut self, endianness: Endianness) -> Result<$ty> {
            let saved_swap = self.override_swap(endianness);
            let result = self.$deserialize();
            self.swap = saved_swap;
            result
        }

        #[doc = concat!("Serialize a `", stringify!($ty), "` array as a bulk copy.")]
        pub fn $serialize_array(&mut self, values: &[$ty]) -> Result<&mut Self> {
            if values.is_empty() {
                return Ok(self);
            }

            self.ensure_space(values.len())?;
            self.last_data_size = 1;
            let start = self.offset;
            let dst = &mut self.buffer.as_mut_slice()[start..start + values.len()];
            for (d, v) in dst.iter_mut().zip(values) {
                *d = *v as u8;
            }
            self.offset = start + values.len();
            Ok(self)
        }

        #[doc = concat!("Serialize a `", stringify!($ty), "` array in the given byte order.")]
        pub fn $serialize_array_endian(
            &mut self,
            values: &[$ty],
            endianness: Endianness,
        ) -> Result<&mut Self> {
            let saved_swap = self.override_swap(endianness);
            let result = self.$serialize_array(values).map(|_| ());
            self.swap = saved_swap;
            result?;
            Ok(self)
        }

        #[doc = concat!("Deserialize a `", stringify!($ty), "` array into `out`.")]
        pub fn $deserialize_array(&mut self, out: &mut [$ty]) -> Result<()> {
            if out.is_empty() {
                return Ok(());
            }

            self.check_space(out.len())?;
            self.last_data_size = 1;
            let src = &self.buffer.as_slice()[self.offset..self.offset + out.len()];
            for (d, s) in out.iter_mut().zip(src) {
                *d = *s as $ty;
            }
            self.offset += out.len();
            Ok(())
        }

        #[doc = concat!("Deserialize a `", stringify!($ty), "` array in the given byte order.")]
        pub fn $deserialize_array_endian(
            &mut self,
            out: &mut [$ty],
            endianness: Endianness,
        ) -> Result<()> {
            let saved_swap = self.override_swap(endianness);
            let result = self.$deserialize_array(out);
            self.swap = saved_swap;
            result
        }
    };
}

impl<'a> CdrCodec<'a> {
    /// Create a codec over `buffer` with the given stream byte order and
    /// encapsulation flavor.
    pub fn new(buffer: &'a mut CdrBuffer, endianness: Endianness, flavor: CdrFlavor) -> Self {
        Self {
            buffer,
            flavor,
            endianness,
            swap: endianness != Endianness::NATIVE,
            pl_flag: PlFlag::WithoutPl,
            options: 0,
            offset: 0,
            origin: 0,
            last_data_size: 0,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current cursor position, as an offset from the buffer start.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Remaining bytes between the cursor and the end of the buffer.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.capacity() - self.offset
    }

    /// The declared stream byte order.
    #[must_use]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The encapsulation flavor fixed at construction.
    #[must_use]
    pub fn flavor(&self) -> CdrFlavor {
        self.flavor
    }

    /// Width in bytes of the most recently serialized or deserialized
    /// primitive. Callers emitting XCDR parameter lists use this to
    /// compute per-parameter padding.
    #[must_use]
    pub fn last_data_size(&self) -> usize {
        self.last_data_size
    }

    /// The DDS-CDR options header field.
    #[must_use]
    pub fn options(&self) -> u16 {
        self.options
    }

    /// Set the DDS-CDR options header field.
    pub fn set_options(&mut self, options: u16) {
        self.options = options;
    }

    /// The DDS parameter-list flag.
    #[must_use]
    pub fn pl_flag(&self) -> PlFlag {
        self.pl_flag
    }

    /// Set the DDS parameter-list flag.
    pub fn set_pl_flag(&mut self, pl_flag: PlFlag) {
        self.pl_flag = pl_flag;
    }

    /// View the whole usable buffer region.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// View the bytes written so far (buffer start up to the cursor).
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.offset]
    }

    // ------------------------------------------------------------------
    // State and cursor utilities
    // ------------------------------------------------------------------

    /// Snapshot the mutable cursor state.
    #[must_use]
    pub fn get_state(&self) -> CdrState {
        CdrState {
            offset: self.offset,
            origin: self.origin,
            swap: self.swap,
            last_data_size: self.last_data_size,
        }
    }

    /// Restore a snapshot taken with [`get_state`](Self::get_state).
    pub fn set_state(&mut self, state: CdrState) {
        self.offset = state.offset;
        self.origin = state.origin;
        self.swap = state.swap;
        self.last_data_size = state.last_data_size;
    }

    /// Return both cursors to the buffer start and recompute `swap` from
    /// the declared byte order.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.origin = 0;
        self.swap = self.endianness != Endianness::NATIVE;
        self.last_data_size = 0;
    }

    /// Anchor subsequent alignment at the current cursor position.
    ///
    /// Invoked implicitly by the encapsulation operations.
    pub fn reset_alignment(&mut self) {
        self.origin = self.offset;
    }

    /// Advance the cursor by `num_bytes`, growing the buffer if needed.
    ///
    /// Returns `false` (cursor unchanged) if the buffer cannot grow.
    pub fn jump(&mut self, num_bytes: usize) -> bool {
        if self.remaining() >= num_bytes || self.buffer.grow(num_bytes) {
            self.offset += num_bytes;
            true
        } else {
            false
        }
    }

    /// Advance the alignment anchor by `num_bytes`, growing the buffer if
    /// needed. Used by callers emitting parameter-list sub-streams.
    ///
    /// Returns `false` (anchor unchanged) if the buffer cannot grow.
    pub fn move_alignment_forward(&mut self, num_bytes: usize) -> bool {
        if self.buffer.capacity() - self.origin >= num_bytes || self.buffer.grow(num_bytes) {
            self.origin += num_bytes;
            true
        } else {
            false
        }
    }

    /// Change the declared byte order, toggling `swap` if it differs from
    /// the current one.
    pub fn change_endianness(&mut self, endianness: Endianness) {
        if self.endianness != endianness {
            self.swap = !self.swap;
            self.endianness = endianness;
        }
    }

    // ------------------------------------------------------------------
    // Encapsulation
    // ------------------------------------------------------------------

    /// Write the encapsulation header and anchor alignment after it.
    ///
    /// DDS-CDR writes `00 | kind | options`; plain CDR writes the kind
    /// byte alone. The kind byte carries the endianness bit and, for
    /// DDS-CDR, the parameter-list bit.
    pub fn serialize_encapsulation(&mut self) -> Result<&mut Self> {
        let state = self.get_state();

        let result = (|| -> Result<()> {
            if self.flavor.is_dds() {
                self.serialize_u8(0)?;
            }

            let kind = self.pl_flag.bits() | self.endianness.bit();
            self.serialize_u8(kind)?;

            if self.flavor.is_dds() {
                let options = self.options;
                self.serialize_u16(options)?;
            }
            Ok(())
        })();

        if let Err(err) = result {
            self.set_state(state);
            return Err(err);
        }

        self.reset_alignment();
        Ok(self)
    }

    /// Read the encapsulation header, adopting the stream's byte order
    /// and parameter-list flag, and anchor alignment after it.
    ///
    /// A set parameter-list bit is only valid for DDS-CDR; under plain
    /// CDR it is a bad-parameter error and the codec state (including the
    /// negotiated byte order) is rolled back.
    pub fn read_encapsulation(&mut self) -> Result<&mut Self> {
        let state = self.get_state();
        let saved_endianness = self.endianness;
        let saved_pl_flag = self.pl_flag;

        let result = (|| -> Result<()> {
            if self.flavor.is_dds() {
                self.deserialize_u8()?;
            }

            let kind = self.deserialize_u8()?;

            let stream = if kind & ENDIANNESS_BIT != 0 {
                Endianness::Little
            } else {
                Endianness::Big
            };
            if stream != self.endianness {
                trace!(negotiated = %stream, "stream byte order differs from codec");
                self.swap = !self.swap;
                self.endianness = stream;
            }

            if kind & PlFlag::WithPl.bits() != 0 {
                if self.flavor.is_dds() {
                    self.pl_flag = PlFlag::WithPl;
                } else {
                    return Err(CodecError::bad_parameter(
                        "read_encapsulation",
                        "parameter-list bit set in a plain CDR stream",
                    ));
                }
            }

            if self.flavor.is_dds() {
                self.options = self.deserialize_u16()?;
            }
            Ok(())
        })();

        if let Err(err) = result {
            self.set_state(state);
            self.endianness = saved_endianness;
            self.pl_flag = saved_pl_flag;
            return Err(err);
        }

        self.reset_alignment();
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    impl_cdr_byte!(
        u8,
        serialize_u8, serialize_u8_endian,
        deserialize_u8, deserialize_u8_endian,
        serialize_u8_array, serialize_u8_array_endian,
        deserialize_u8_array, deserialize_u8_array_endian
    );

    impl_cdr_byte!(
        i8,
        serialize_i8, serialize_i8_endian,
        deserialize_i8, deserialize_i8_endian,
        serialize_i8_array, serialize_i8_array_endian,
        deserialize_i8_array, deserialize_i8_array_endian
    );

    impl_cdr_primitive!(
        u16, 2, 2,
        serialize_u16, serialize_u16_endian,
        deserialize_u16, deserialize_u16_endian,
        serialize_u16_array, serialize_u16_array_endian,
        deserialize_u16_array, deserialize_u16_array_endian,
        write_u16, read_u16, write_u16_into, read_u16_into
    );

    impl_cdr_primitive!(
        i16, 2, 2,
        serialize_i16, serialize_i16_endian,
        deserialize_i16, deserialize_i16_endian,
        serialize_i16_array, serialize_i16_array_endian,
        deserialize_i16_array, deserialize_i16_array_endian,
        write_i16, read_i16, write_i16_into, read_i16_into
    );

    impl_cdr_primitive!(
        u32, 4, 4,
        serialize_u32, serialize_u32_endian,
        deserialize_u32, deserialize_u32_endian,
        serialize_u32_array, serialize_u32_array_endian,
        deserialize_u32_array, deserialize_u32_array_endian,
        write_u32, read_u32, write_u32_into, read_u32_into
    );

    impl_cdr_primitive!(
        i32, 4, 4,
        serialize_i32, serialize_i32_endian,
        deserialize_i32, deserialize_i32_endian,
        serialize_i32_array, serialize_i32_array_endian,
        deserialize_i32_array, deserialize_i32_array_endian,
        write_i32, read_i32, write_i32_into, read_i32_into
    );

    impl_cdr_primitive!(
        u64, 8, 8,
        serialize_u64, serialize_u64_endian,
        deserialize_u64, deserialize_u64_endian,
        serialize_u64_array, serialize_u64_array_endian,
        deserialize_u64_array, deserialize_u64_array_endian,
        write_u64, read_u64, write_u64_into, read_u64_into
    );

    impl_cdr_primitive!(
        i64, 8, 8,
        serialize_i64, serialize_i64_endian,
        deserialize_i64, deserialize_i64_endian,
        serialize_i64_array, serialize_i64_array_endian,
        deserialize_i64_array, deserialize_i64_array_endian,
        write_i64, read_i64, write_i64_into, read_i64_into
    );

    impl_cdr_primitive!(
        f32, 4, 4,
        serialize_f32, serialize_f32_endian,
        deserialize_f32, deserialize_f32_endian,
        serialize_f32_array, serialize_f32_array_endian,
        deserialize_f32_array, deserialize_f32_array_endian,
        write_f32, read_f32, write_f32_into, read_f32_into
    );

    impl_cdr_primitive!(
        f64, 8, 8,
        serialize_f64, serialize_f64_endian,
        deserialize_f64, deserialize_f64_endian,
        serialize_f64_array, serialize_f64_array_endian,
        deserialize_f64_array, deserialize_f64_array_endian,
        write_f64, read_f64, write_f64_into, read_f64_into
    );

    // Extended-precision float: the `u128` carries the raw 16-byte
    // pattern. Alignment is 8 even though the payload is 16 bytes.
    impl_cdr_primitive!(
        u128, F128_WIDTH, F128_ALIGNMENT,
        serialize_f128, serialize_f128_endian,
        deserialize_f128, deserialize_f128_endian,
        serialize_f128_array, serialize_f128_array_endian,
        deserialize_f128_array, deserialize_f128_array_endian,
        write_u128, read_u128, write_u128_into, read_u128_into
    );

    // ------------------------------------------------------------------
    // Booleans
    // ------------------------------------------------------------------

    /// Serialize a `bool` as a single `0x00`/`0x01` byte.
    pub fn serialize_bool(&mut self, value: bool) -> Result<&mut Self> {
        self.ensure_space(1)?;
        self.last_data_size = 1;
        self.buffer.as_mut_slice()[self.offset] = value as u8;
        self.offset += 1;
        Ok(self)
    }

    /// Serialize a `bool` in the given byte order (single byte, order is moot).
    pub fn serialize_bool_endian(&mut self, value: bool, endianness: Endianness) -> Result<&mut Self> {
        let saved_swap = self.override_swap(endianness);
        let result = self.serialize_bool(value).map(|_| ());
        self.swap = saved_swap;
        result?;
        Ok(self)
    }

    /// Deserialize a `bool`.
    ///
    /// Any byte other than `0x00` or `0x01` is a bad-parameter error; the
    /// value is inspected before the cursor moves, so state is unchanged.
    pub fn deserialize_bool(&mut self) -> Result<bool> {
        self.check_space(1)?;
        let raw = self.buffer.as_slice()[self.offset];
        let value = match raw {
            0 => false,
            1 => true,
            _ => {
                return Err(CodecError::bad_parameter(
                    "deserialize_bool",
                    format!("unexpected byte value {raw:#04x}, expected 0 or 1"),
                ))
            }
        };
        self.last_data_size = 1;
        self.offset += 1;
        Ok(value)
    }

    /// Deserialize a `bool` in the given byte order (single byte, order is moot).
    pub fn deserialize_bool_endian(&mut self, endianness: Endianness) -> Result<bool> {
        let saved_swap = self.override_swap(endianness);
        let result = self.deserialize_bool();
        self.swap = saved_swap;
        result
    }

    /// Serialize a `bool` array: one byte per element, no padding.
    pub fn serialize_bool_array(&mut self, values: &[bool]) -> Result<&mut Self> {
        if values.is_empty() {
            return Ok(self);
        }

        self.ensure_space(values.len())?;
        self.last_data_size = 1;
        let start = self.offset;
        let dst = &mut self.buffer.as_mut_slice()[start..start + values.len()];
        for (d, v) in dst.iter_mut().zip(values) {
            *d = *v as u8;
        }
        self.offset = start + values.len();
        Ok(self)
    }

    /// Deserialize a `bool` array into `out`.
    ///
    /// A byte outside `{0, 1}` rolls the whole operation back.
    pub fn deserialize_bool_array(&mut self, out: &mut [bool]) -> Result<()> {
        if out.is_empty() {
            return Ok(());
        }

        let state = self.get_state();
        self.check_space(out.len())?;
        self.last_data_size = 1;
        for slot in out.iter_mut() {
            let raw = self.buffer.as_slice()[self.offset];
            match raw {
                0 | 1 => {
                    *slot = raw == 1;
                    self.offset += 1;
                }
                _ => {
                    self.set_state(state);
                    return Err(CodecError::bad_parameter(
                        "deserialize_bool_array",
                        format!("unexpected byte value {raw:#04x}, expected 0 or 1"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Serialize a `bool` sequence: u32 count, then packed element bytes.
    pub fn serialize_bool_sequence(&mut self, values: &[bool]) -> Result<&mut Self> {
        let state = self.get_state();

        let result = (|| -> Result<()> {
            self.serialize_u32(values.len() as u32)?;
            self.serialize_bool_array(values)?;
            Ok(())
        })();

        if let Err(err) = result {
            self.set_state(state);
            return Err(err);
        }
        Ok(self)
    }

    /// Deserialize a `bool` sequence.
    pub fn deserialize_bool_sequence(&mut self) -> Result<Vec<bool>> {
        let state = self.get_state();

        let result = (|| -> Result<Vec<bool>> {
            let count = self.deserialize_u32()? as usize;
            if self.remaining() < count {
                return Err(CodecError::not_enough_space(
                    count,
                    self.remaining(),
                    self.offset,
                ));
            }
            let mut out = vec![false; count];
            self.deserialize_bool_array(&mut out)?;
            Ok(out)
        })();

        match result {
            Ok(out) => Ok(out),
            Err(err) => {
                self.set_state(state);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Wide characters
    // ------------------------------------------------------------------

    /// Serialize a wide character as a 32-bit code unit.
    pub fn serialize_wchar(&mut self, value: char) -> Result<&mut Self> {
        self.serialize_u32(value as u32).map(|_| ())?;
        Ok(self)
    }

    /// Serialize a wide character in the given byte order.
    pub fn serialize_wchar_endian(&mut self, value: char, endianness: Endianness) -> Result<&mut Self> {
        let saved_swap = self.override_swap(endianness);
        let result = self.serialize_wchar(value).map(|_| ());
        self.swap = saved_swap;
        result?;
        Ok(self)
    }

    /// Deserialize a wide character from a 32-bit code unit.
    ///
    /// A pattern that is not a Unicode scalar value is a bad-parameter
    /// error and the cursor is rolled back.
    pub fn deserialize_wchar(&mut self) -> Result<char> {
        let state = self.get_state();
        let code = self.deserialize_u32()?;
        match char::from_u32(code) {
            Some(c) => Ok(c),
            None => {
                self.set_state(state);
                Err(CodecError::bad_parameter(
                    "deserialize_wchar",
                    format!("{code:#010x} is not a Unicode scalar value"),
                ))
            }
        }
    }

    /// Deserialize a wide character in the given byte order.
    pub fn deserialize_wchar_endian(&mut self, endianness: Endianness) -> Result<char> {
        let saved_swap = self.override_swap(endianness);
        let result = self.deserialize_wchar();
        self.swap = saved_swap;
        result
    }

    /// Serialize a wide-character array, delegating element by element to
    /// the 32-bit primitive.
    pub fn serialize_wchar_array(&mut self, values: &[char]) -> Result<&mut Self> {
        if values.is_empty() {
            return Ok(self);
        }

        let state = self.get_state();
        for &c in values {
            if let Err(err) = self.serialize_u32(c as u32).map(|_| ()) {
                self.set_state(state);
                return Err(err);
            }
        }
        Ok(self)
    }

    /// Serialize a wide-character array in the given byte order.
    pub fn serialize_wchar_array_endian(
        &mut self,
        values: &[char],
        endianness: Endianness,
    ) -> Result<&mut Self> {
        let saved_swap = self.override_swap(endianness);
        let result = self.serialize_wchar_array(values).map(|_| ());
        self.swap = saved_swap;
        result?;
        Ok(self)
    }

    /// Deserialize a wide-character array into `out`.
    pub fn deserialize_wchar_array(&mut self, out: &mut [char]) -> Result<()> {
        if out.is_empty() {
            return Ok(());
        }

        let state = self.get_state();
        for slot in out.iter_mut() {
            match self.deserialize_wchar() {
                Ok(c) => *slot = c,
                Err(err) => {
                    self.set_state(state);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Deserialize a wide-character array in the given byte order.
    pub fn deserialize_wchar_array_endian(
        &mut self,
        out: &mut [char],
        endianness: Endianness,
    ) -> Result<()> {
        let saved_swap = self.override_swap(endianness);
        let result = self.deserialize_wchar_array(out);
        self.swap = saved_swap;
        result
    }

    // ------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------

    /// Serialize a string: aligned u32 length (terminator included), the
    /// bytes, then a NUL terminator.
    pub fn serialize_string(&mut self, value: &str) -> Result<&mut Self> {
        self.write_string_payload(value.as_bytes())?;
        Ok(self)
    }

    /// Serialize a string in the given byte order (the length prefix is
    /// byte-order sensitive).
    pub fn serialize_string_endian(&mut self, value: &str, endianness: Endianness) -> Result<&mut Self> {
        let saved_swap = self.override_swap(endianness);
        let result = self.write_string_payload(value.as_bytes());
        self.swap = saved_swap;
        result?;
        Ok(self)
    }

    /// Serialize raw string bytes with an explicit payload length.
    ///
    /// The length prefix is `bytes.len() + 1`; the codec appends the
    /// terminator itself.
    pub fn serialize_string_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.write_string_payload(bytes)?;
        Ok(self)
    }

    fn write_string_payload(&mut self, bytes: &[u8]) -> Result<()> {
        let length = bytes.len() as u32 + 1;
        let state = self.get_state();

        self.serialize_u32(length).map(|_| ())?;

        let total = length as usize;
        if self.remaining() < total && !self.buffer.grow(total) {
            let err = CodecError::not_enough_space(total, self.remaining(), self.offset);
            self.set_state(state);
            return Err(err);
        }

        self.last_data_size = 1;
        let start = self.offset;
        let dst = &mut self.buffer.as_mut_slice()[start..start + bytes.len()];
        dst.copy_from_slice(bytes);
        self.buffer.as_mut_slice()[start + bytes.len()] = 0;
        self.offset = start + total;
        Ok(())
    }

    /// Deserialize a string.
    ///
    /// A zero length yields the empty string. A trailing NUL is stripped;
    /// a payload that is not valid UTF-8 is a bad-parameter error and the
    /// operation is rolled back.
    pub fn deserialize_string(&mut self) -> Result<String> {
        let state = self.get_state();

        let length = self.deserialize_u32()? as usize;
        self.last_data_size = 1;
        if length == 0 {
            return Ok(String::new());
        }

        if self.remaining() < length {
            let err = CodecError::not_enough_space(length, self.remaining(), self.offset);
            self.set_state(state);
            return Err(err);
        }

        let start = self.offset;
        self.offset += length;

        let data = self.buffer.as_slice();
        let mut end = start + length;
        if data[end - 1] == 0 {
            end -= 1;
        }
        match std::str::from_utf8(&data[start..end]) {
            Ok(s) => Ok(s.to_string()),
            Err(err) => {
                self.set_state(state);
                Err(CodecError::bad_parameter(
                    "deserialize_string",
                    format!("payload is not valid UTF-8: {err}"),
                ))
            }
        }
    }

    /// Deserialize a string in the given byte order.
    pub fn deserialize_string_endian(&mut self, endianness: Endianness) -> Result<String> {
        let saved_swap = self.override_swap(endianness);
        let result = self.deserialize_string();
        self.swap = saved_swap;
        result
    }

    /// Read a string without copying it out of the buffer.
    ///
    /// Returns the whole `length`-byte region verbatim plus the logical
    /// character count: `length - 1` when the final byte is the NUL
    /// terminator, `length` otherwise.
    pub fn read_string(&mut self) -> Result<(&[u8], u32)> {
        let state = self.get_state();

        let length = self.deserialize_u32()?;
        self.last_data_size = 1;
        if length == 0 {
            return Ok((&[], 0));
        }

        let len = length as usize;
        if self.remaining() < len {
            let err = CodecError::not_enough_space(len, self.remaining(), self.offset);
            self.set_state(state);
            return Err(err);
        }

        let start = self.offset;
        self.offset += len;

        let bytes = &self.buffer.as_slice()[start..start + len];
        let logical = if bytes[len - 1] == 0 {
            length - 1
        } else {
            length
        };
        Ok((bytes, logical))
    }

    /// Serialize a string array: each element per the string rules, no
    /// count prefix.
    pub fn serialize_string_array<S: AsRef<str>>(&mut self, values: &[S]) -> Result<&mut Self> {
        if values.is_empty() {
            return Ok(self);
        }

        let state = self.get_state();
        for v in values {
            if let Err(err) = self.write_string_payload(v.as_ref().as_bytes()) {
                self.set_state(state);
                return Err(err);
            }
        }
        Ok(self)
    }

    /// Deserialize a string array into `out`.
    pub fn deserialize_string_array(&mut self, out: &mut [String]) -> Result<()> {
        if out.is_empty() {
            return Ok(());
        }

        let state = self.get_state();
        for slot in out.iter_mut() {
            match self.deserialize_string() {
                Ok(s) => *slot = s,
                Err(err) => {
                    self.set_state(state);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Serialize a string sequence: u32 count, then string array rules.
    pub fn serialize_string_sequence<S: AsRef<str>>(&mut self, values: &[S]) -> Result<&mut Self> {
        let state = self.get_state();

        let result = (|| -> Result<()> {
            self.serialize_u32(values.len() as u32)?;
            self.serialize_string_array(values)?;
            Ok(())
        })();

        if let Err(err) = result {
            self.set_state(state);
            return Err(err);
        }
        Ok(self)
    }

    /// Deserialize a string sequence.
    ///
    /// Partially built strings are dropped before state is restored on
    /// any failure.
    pub fn deserialize_string_sequence(&mut self) -> Result<Vec<String>> {
        let state = self.get_state();

        let result = (|| -> Result<Vec<String>> {
            let count = self.deserialize_u32()? as usize;
            // Each element carries at least its own length prefix, so a
            // count the stream cannot possibly satisfy fails before the
            // slots are allocated.
            if count.saturating_mul(4) > self.remaining() {
                return Err(CodecError::not_enough_space(
                    count.saturating_mul(4),
                    self.remaining(),
                    self.offset,
                ));
            }
            let mut out = vec![String::new(); count];
            self.deserialize_string_array(&mut out)?;
            Ok(out)
        })();

        match result {
            Ok(out) => Ok(out),
            Err(err) => {
                self.set_state(state);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Padding needed before a primitive of width `width`, relative to
    /// the alignment anchor.
    #[inline]
    fn alignment_for(&self, width: usize) -> usize {
        let misalignment = (self.offset - self.origin) % width;
        if misalignment > 0 {
            width - misalignment
        } else {
            0
        }
    }

    /// Ensure `required` bytes exist past the cursor, growing if needed.
    fn ensure_space(&mut self, required: usize) -> Result<()> {
        if self.remaining() >= required || self.buffer.grow(required) {
            Ok(())
        } else {
            Err(CodecError::not_enough_space(
                required,
                self.remaining(),
                self.offset,
            ))
        }
    }

    /// Ensure `required` bytes exist past the cursor; reads never grow.
    #[inline]
    fn check_space(&self, required: usize) -> Result<()> {
        if self.remaining() >= required {
            Ok(())
        } else {
            Err(CodecError::not_enough_space(
                required,
                self.remaining(),
                self.offset,
            ))
        }
    }

    /// Write `count` zero padding bytes and advance the cursor.
    fn write_padding(&mut self, count: usize) {
        if count > 0 {
            let end = self.offset + count;
            self.buffer.as_mut_slice()[self.offset..end].fill(0);
            self.offset = end;
        }
    }

    /// Set `swap` for a byte-order-override call, returning the value to
    /// restore: swap iff the requested order differs from the host's.
    #[inline]
    fn override_swap(&mut self, endianness: Endianness) -> bool {
        let saved = self.swap;
        self.swap = endianness != Endianness::NATIVE;
        saved
    }

    /// Effective byte order of the payload bytes being produced or
    /// consumed, derived from `swap`.
    #[inline]
    fn stream_endianness(&self) -> Endianness {
        if self.swap {
            Endianness::NATIVE.opposite()
        } else {
            Endianness::NATIVE
        }
    }
}
