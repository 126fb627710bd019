// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Brightness markers: writing and reading single words.
//!
//! A bit is a marker block pushed brighter (1) or darker (0) by the colour
//! difference. When the block is already too close to the clipping limit
//! in the requested direction, the push is lengthened so the block ends at
//! least one colour difference away from the limit:
//!
//! - brighter: `level = max(m + v, 2v)`, capped at 255
//! - darker:   `level = min(m - v, 255 - 2v)`, floored at 0
//!
//! Each word ends with a dark and a bright sentinel at twice the colour
//! difference. The reader inverts the two formulas on the sentinel pair to
//! recover the background level and places the bit threshold halfway
//! between the predicted dark and bright levels for that background.

use crate::raster::{Raster, Rect};

use super::layout::{block_rect, BorderLayout, Side, Slot};
use super::protocol::PROTOCOL;

/// Tolerance for deciding that a sentinel sits on a clipping plateau.
const PLATEAU_TOLERANCE: f64 = 1.0;

/// Minimum sentinel contrast, in colour differences, for a readable word.
const MIN_SENTINEL_CONTRAST: f64 = 2.0;

/// Push size for one channel with current block mean `mean`.
pub fn push_amount(mean: f64, value: f64, brighten: bool) -> f64 {
    if brighten {
        value + (value - mean).max(0.0)
    } else {
        -(value + (mean - (255.0 - value)).max(0.0))
    }
}

/// Level a uniform block of brightness `mean` ends at after marking.
pub fn marked_level(mean: f64, value: f64, brighten: bool) -> f64 {
    (mean + push_amount(mean, value, brighten)).clamp(0.0, 255.0)
}

/// Mark one block on `side` at `coord` (row for vertical sides, column for
/// horizontal ones). Every channel is pushed based on its own mean.
pub fn mark_block(
    image: &mut Raster,
    side: Side,
    block: usize,
    coord: usize,
    value: f64,
    brighten: bool,
) {
    let rect = block_rect(image.width(), image.height(), block, side, coord);
    mark_rect(image, rect, value, brighten);
}

pub(crate) fn mark_rect(image: &mut Raster, rect: Rect, value: f64, brighten: bool) {
    for c in 0..image.channels().count() {
        let mean = image.region_mean(rect, c);
        image.offset_region(rect, c, push_amount(mean, value, brighten));
    }
}

/// Write one word: value bits MSB first, then the sentinel pair.
pub fn mark_word(image: &mut Raster, layout: &BorderLayout, slot: Slot, color_diff: u8, word: u16) {
    let cells = layout.word_cells(slot);
    let value = color_diff as f64;
    let sentinel = value * PROTOCOL.sentinel_factor as f64;
    let bits = PROTOCOL.word_to_bits(word);

    for (cell, &bit) in cells.iter().zip(&bits) {
        mark_rect(image, *cell, value, bit);
    }
    let n = PROTOCOL.word_bits;
    mark_rect(image, cells[n], sentinel, false);
    mark_rect(image, cells[n + 1], sentinel, true);
}

/// Darken the four corner blocks.
pub fn mark_corners(image: &mut Raster, layout: &BorderLayout, color_diff: u8) {
    for rect in layout.corner_cells() {
        mark_rect(image, rect, color_diff as f64, false);
    }
}

/// Soft reading of one word.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftWord {
    /// Per value bit: positive means 1, magnitude in colour differences.
    pub llrs: Vec<f64>,
    /// Bright minus dark sentinel, averaged over channels.
    pub sentinel_contrast: f64,
}

impl SoftWord {
    /// An unreadable word: all bits undecided.
    pub fn erased() -> Self {
        Self { llrs: vec![0.0; PROTOCOL.word_bits], sentinel_contrast: 0.0 }
    }

    pub fn is_erased(&self) -> bool {
        self.llrs.iter().all(|&l| l == 0.0)
    }

    /// Hard decision on the word value.
    pub fn value(&self) -> u16 {
        let bits: Vec<bool> = self.llrs.iter().map(|&l| l > 0.0).collect();
        PROTOCOL.bits_to_word(&bits)
    }
}

/// Bit threshold for a channel given its dark and bright sentinel means.
pub fn bit_threshold(dark: f64, bright: f64, color_diff: f64) -> f64 {
    let sv = color_diff * PROTOCOL.sentinel_factor as f64;
    let tol = PLATEAU_TOLERANCE;

    // Outside the plateaus each sentinel is background -/+ sv.
    let from_dark = (dark > tol && dark < 255.0 - 2.0 * sv - tol).then(|| dark + sv);
    let from_bright = (bright > 2.0 * sv + tol && bright < 255.0 - tol).then(|| bright - sv);

    let background = match (from_dark, from_bright) {
        (Some(a), Some(b)) => 0.5 * (a + b),
        (Some(a), None) | (None, Some(a)) => a,
        // Both on plateaus: the background is within one sentinel step of a
        // limit, and bits sit in [0, v] vs [2v, 3v] (or mirrored).
        (None, None) => {
            return if dark + bright < 255.0 {
                1.5 * color_diff
            } else {
                255.0 - 1.5 * color_diff
            };
        }
    };

    0.5 * (marked_level(background, color_diff, true) + marked_level(background, color_diff, false))
}

/// Read a word at `slot`.
///
/// Words whose sentinel contrast is below twice the colour difference are
/// returned erased.
pub fn read_word(image: &Raster, layout: &BorderLayout, slot: Slot, color_diff: u8) -> SoftWord {
    let cells = layout.word_cells(slot);
    let nc = image.channels().count();
    let cd = color_diff as f64;
    let n = PROTOCOL.word_bits;

    let mut llrs = vec![0.0; n];
    let mut contrast = 0.0;
    for c in 0..nc {
        let dark = image.region_mean(cells[n], c);
        let bright = image.region_mean(cells[n + 1], c);
        contrast += bright - dark;
        let threshold = bit_threshold(dark, bright, cd);
        for (llr, cell) in llrs.iter_mut().zip(&cells[..n]) {
            *llr += (image.region_mean(*cell, c) - threshold) / cd;
        }
    }
    contrast /= nc as f64;

    if contrast < MIN_SENTINEL_CONTRAST * cd {
        return SoftWord { sentinel_contrast: contrast, ..SoftWord::erased() };
    }
    for llr in &mut llrs {
        *llr /= nc as f64;
    }
    SoftWord { llrs, sentinel_contrast: contrast }
}
