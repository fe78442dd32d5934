// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # cdrcodec
//!
//! Buffer-backed CDR (Common Data Representation) codec as used by the
//! OMG DDS / RTPS wire formats.
//!
//! The library serializes and deserializes scalar values, fixed-size
//! arrays and length-prefixed strings to and from a growable byte
//! buffer, honoring CDR alignment and configurable byte order.
//!
//! ## Architecture
//!
//! - [`cdr::CdrBuffer`] - a contiguous, optionally growable byte region
//! - [`cdr::CdrCodec`] - the stateful codec: two cursors (data position
//!   and alignment anchor), a byte-order state, and the encapsulation
//!   header state machine
//! - [`core`] - error types and the foundational enums
//!
//! Alignment is measured relative to the encapsulation anchor, not the
//! buffer start; reading or writing an encapsulation header re-anchors
//! it. All operations are transactional: a failed call leaves the codec
//! state exactly as it found it.
//!
//! ## Example: encode, then decode
//!
//! ```rust
//! use cdrcodec::{CdrBuffer, CdrCodec, CdrFlavor, Endianness};
//!
//! # fn main() -> cdrcodec::Result<()> {
//! let mut buffer = CdrBuffer::with_capacity(64);
//! let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Dds);
//! codec.serialize_encapsulation()?;
//! codec.serialize_i32(-42)?;
//! codec.serialize_string("hello")?;
//! let bytes = codec.data().to_vec();
//!
//! let mut received = CdrBuffer::from_vec(bytes);
//! let mut reader = CdrCodec::new(&mut received, Endianness::Big, CdrFlavor::Dds);
//! reader.read_encapsulation()?;
//! assert_eq!(reader.deserialize_i32()?, -42);
//! assert_eq!(reader.deserialize_string()?, "hello");
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{CdrFlavor, CodecError, Endianness, PlFlag, Result};

// The codec itself
pub mod cdr;

pub use cdr::{CdrBuffer, CdrCodec, CdrState};
