// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for border marking and extraction.
//!
//! [`BorderError`] covers all failure modes from option validation through
//! header recovery and Reed-Solomon decoding.

use core::fmt;

use super::ecc::RsDecodeError;

/// Errors that can occur while embedding or extracting a border payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorderError {
    /// The payload is longer than 1023 bytes.
    InvalidContent,
    /// The options cannot describe a valid marking scheme.
    InvalidOptions(&'static str),
    /// The image has zero area, an unsupported channel count, or a buffer
    /// that does not match its dimensions.
    InvalidGeometry(&'static str),
    /// More than 16 Reed-Solomon chunks would be needed at this redundancy.
    EccTooWide { chunks: usize },
    /// The encoded payload does not fit the border of this image.
    ContentTooLong { required: usize, capacity: usize },
    /// The header replicas could not be reconciled.
    HeaderUnrecoverable,
    /// At least one chunk had more errors than its parity can correct.
    PayloadCorrupted,
}

impl BorderError {
    /// True for decode outcomes caused by damaged or unmarked pixels, as
    /// opposed to invalid arguments.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::HeaderUnrecoverable | Self::PayloadCorrupted)
    }
}

impl fmt::Display for BorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidContent => write!(f, "content too long (max 1023 bytes)"),
            Self::InvalidOptions(msg) => write!(f, "invalid options: {msg}"),
            Self::InvalidGeometry(msg) => write!(f, "invalid image geometry: {msg}"),
            Self::EccTooWide { chunks } => {
                write!(f, "ECC redundancy too high ({chunks} chunks, max 16)")
            }
            Self::ContentTooLong { required, capacity } => write!(
                f,
                "content too long to encode ({required} words needed, {capacity} available)"
            ),
            Self::HeaderUnrecoverable => write!(f, "border header replicas disagree"),
            Self::PayloadCorrupted => write!(f, "payload corrupted beyond ECC repair"),
        }
    }
}

impl std::error::Error for BorderError {}

impl From<RsDecodeError> for BorderError {
    fn from(_: RsDecodeError) -> Self {
        Self::PayloadCorrupted
    }
}
