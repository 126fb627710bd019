// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Protocol constants shared by the encoder and the decoder.
//!
//! Both directions read the in-pixel layout from [`PROTOCOL`]; nothing in
//! the marker, layout or header code hardcodes these numbers.

/// Immutable description of the border bit layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Protocol {
    /// Value bits per word (MSB first).
    pub word_bits: usize,
    /// Marker cells per word: value bits plus the dark/bright sentinel pair.
    pub word_cells: usize,
    /// Sentinel magnitude as a multiple of the per-bit colour difference.
    pub sentinel_factor: u16,
    /// Header words at the start of every half-edge.
    pub header_words: usize,
    /// Upper bound on words per half-edge (the count is sent in one byte).
    pub max_axis_words: usize,
    /// Word value placed between repeated copies of the symbol stream.
    pub separator: u16,
    /// Longest accepted payload.
    pub max_content_len: usize,
    /// Most Reed-Solomon chunks a payload may be split into.
    pub max_chunks: usize,
    /// Reed-Solomon codeword ceiling (data + parity symbols).
    pub max_codeword: usize,
    /// Added before truncating the parity estimate.
    pub parity_bias: f64,
    /// Smoothing FWHM and half-axis word stride, in marker blocks.
    pub band_span: usize,
    /// Largest colour difference for which the 2x sentinels stay inside 0..=255.
    pub max_color_diff: u8,
}

/// The one protocol definition in use.
pub const PROTOCOL: Protocol = Protocol {
    word_bits: 10,
    word_cells: 12,
    sentinel_factor: 2,
    header_words: 4,
    max_axis_words: 255,
    separator: 257,
    max_content_len: 1023,
    max_chunks: 16,
    max_codeword: 255,
    parity_bias: 0.95,
    band_span: 24,
    max_color_diff: 63,
};

impl Protocol {
    /// Number of half-edges carrying words (two per side).
    pub const HALF_EDGES: usize = 8;

    /// Pixel length of one word along its edge.
    pub const fn word_span(&self, block: usize) -> usize {
        self.word_cells * block
    }

    /// Split a word value into its value bits, MSB first.
    pub fn word_to_bits(&self, value: u16) -> Vec<bool> {
        (0..self.word_bits)
            .map(|i| (value >> (self.word_bits - 1 - i)) & 1 == 1)
            .collect()
    }

    /// Assemble value bits (MSB first) into a word value.
    pub fn bits_to_word(&self, bits: &[bool]) -> u16 {
        bits.iter().fold(0u16, |acc, &b| (acc << 1) | b as u16)
    }
}
