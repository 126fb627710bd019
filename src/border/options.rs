// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Marking options and payload validation.

use super::error::BorderError;
use super::protocol::PROTOCOL;

/// Tunables shared by [`embed`](super::embed) and [`extract`](super::extract).
///
/// The decoder must be given the same `color_diff` and `block_size` the
/// image was marked with (or use [`extract_auto`](super::extract_auto)).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkOptions {
    /// Per-bit brightness push; sentinels use twice this. 1..=63.
    pub color_diff: u8,
    /// Parity-to-data ratio is `2 * ecc_redundancy`.
    pub ecc_redundancy: f64,
    /// Marker block edge in pixels.
    pub block_size: usize,
    /// Grow the canvas by one block per side before marking.
    pub expand_border: bool,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self { color_diff: 24, ecc_redundancy: 0.5, block_size: 3, expand_border: true }
    }
}

impl MarkOptions {
    pub fn with_color_diff(mut self, color_diff: u8) -> Self {
        self.color_diff = color_diff;
        self
    }

    pub fn with_ecc_redundancy(mut self, ecc_redundancy: f64) -> Self {
        self.ecc_redundancy = ecc_redundancy;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_expand_border(mut self, expand_border: bool) -> Self {
        self.expand_border = expand_border;
        self
    }

    /// Check that the options describe a usable marking scheme.
    ///
    /// # Errors
    /// [`BorderError::InvalidOptions`] naming the offending field.
    pub fn validate(&self) -> Result<(), BorderError> {
        if self.color_diff == 0 {
            return Err(BorderError::InvalidOptions("color_diff must be at least 1"));
        }
        if self.color_diff > PROTOCOL.max_color_diff {
            return Err(BorderError::InvalidOptions("color_diff must be at most 63"));
        }
        if !self.ecc_redundancy.is_finite() || self.ecc_redundancy < 0.0 {
            return Err(BorderError::InvalidOptions(
                "ecc_redundancy must be finite and non-negative",
            ));
        }
        if self.block_size == 0 {
            return Err(BorderError::InvalidOptions("block_size must be at least 1"));
        }
        Ok(())
    }
}

/// A payload known to fit the header's 10-bit length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload<'a>(&'a [u8]);

impl<'a> Payload<'a> {
    /// # Errors
    /// [`BorderError::InvalidContent`] for more than 1023 bytes.
    pub fn new(bytes: &'a [u8]) -> Result<Self, BorderError> {
        if bytes.len() > PROTOCOL.max_content_len {
            return Err(BorderError::InvalidContent);
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> TryFrom<&'a [u8]> for Payload<'a> {
    type Error = BorderError;

    fn try_from(bytes: &'a [u8]) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl<'a> TryFrom<&'a str> for Payload<'a> {
    type Error = BorderError;

    fn try_from(text: &'a str) -> Result<Self, Self::Error> {
        Self::new(text.as_bytes())
    }
}
