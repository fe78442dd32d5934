// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for cdrcodec.
//!
//! The codec surfaces exactly two error kinds:
//! - buffer space exhausted (writes that cannot grow, reads past the end)
//! - contract violations in the decoded bytes (bad booleans, bad headers)

use std::fmt;

/// Errors that can occur during CDR serialization or deserialization.
#[derive(Debug, Clone)]
pub enum CodecError {
    /// A write could not grow the buffer, or a read would pass the end
    /// of the populated region.
    NotEnoughSpace {
        /// Requested bytes (padding included)
        requested: usize,
        /// Available bytes
        available: usize,
        /// Cursor position when the error occurred
        position: usize,
    },

    /// A byte value violated the wire contract.
    BadParameter {
        /// Operation that rejected the value
        context: String,
        /// Violation message
        message: String,
    },
}

impl CodecError {
    /// Create a "not enough space" error.
    pub fn not_enough_space(requested: usize, available: usize, position: usize) -> Self {
        CodecError::NotEnoughSpace {
            requested,
            available,
            position,
        }
    }

    /// Create a bad parameter error.
    pub fn bad_parameter(context: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::BadParameter {
            context: context.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::NotEnoughSpace {
                requested,
                available,
                position,
            } => write!(
                f,
                "Not enough space: requested {requested} bytes at position {position}, but only {available} bytes available"
            ),
            CodecError::BadParameter { context, message } => {
                write!(f, "Bad parameter in {context}: {message}")
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Result type for cdrcodec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
