// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR (Common Data Representation) codec.
//!
//! Provides the stateful serializer/deserializer and its backing buffer.

pub mod buffer;
pub mod codec;

pub use buffer::CdrBuffer;
pub use codec::{CdrCodec, CdrState};
