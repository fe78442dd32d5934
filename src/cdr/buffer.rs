// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Growable byte region backing a CDR codec.
//!
//! The buffer owns a contiguous region and hands the codec a slice view.
//! Cursors live in the codec as offsets from byte 0, so a grow never
//! invalidates them even though the underlying allocation may move.

use tracing::trace;

/// Default initial capacity for a freshly created buffer.
const DEFAULT_CAPACITY: usize = 16;

/// A contiguous, optionally growable byte region.
///
/// Created in one of two modes:
/// - growable: [`CdrBuffer::new`], [`CdrBuffer::with_capacity`],
///   [`CdrBuffer::from_vec`] - `grow` expands the region, at least
///   doubling it each time
/// - fixed: [`CdrBuffer::fixed`] - `grow` always refuses, which a codec
///   reports as a "not enough space" error
#[derive(Debug)]
pub struct CdrBuffer {
    /// The byte region; `data.len()` is the usable capacity
    data: Vec<u8>,
    /// Whether `grow` may expand the region
    growable: bool,
}

impl CdrBuffer {
    /// Create an empty growable buffer with a small default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a growable buffer with `capacity` usable zeroed bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            growable: true,
        }
    }

    /// Create a growable buffer seeded with existing bytes.
    ///
    /// The usable region is exactly `data`; typically used to decode a
    /// received payload.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data,
            growable: true,
        }
    }

    /// Create a fixed-size buffer that refuses to grow.
    #[must_use]
    pub fn fixed(data: Vec<u8>) -> Self {
        Self {
            data,
            growable: false,
        }
    }

    /// Usable capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Check if the usable region is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Expand the usable region by at least `min_extra` bytes.
    ///
    /// Existing contents are preserved and the new tail is zeroed.
    /// Returns `false` if the buffer is fixed; the region is unchanged
    /// in that case.
    pub fn grow(&mut self, min_extra: usize) -> bool {
        if !self.growable {
            return false;
        }

        let current = self.data.len();
        let new_capacity = std::cmp::max(current * 2, current + min_extra);
        self.data.resize(new_capacity, 0);
        trace!(min_extra, new_capacity, "grew CDR buffer");
        true
    }

    /// View the usable region.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutably view the usable region.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return the underlying bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Default for CdrBuffer {
    fn default() -> Self {
        Self::new()
    }
}
