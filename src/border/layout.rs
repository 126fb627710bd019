// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Capacity planning and word routing.
//!
//! Every side of the marked canvas is split into two halves. Words in the
//! first half run from the leading corner forward, words in the second half
//! from the trailing corner backward. Each half-edge starts with the header
//! words; the remaining slots are filled from the symbol stream by a
//! proportional round-robin between the vertical and horizontal axes.

use crate::raster::Rect;

use super::error::BorderError;
use super::protocol::{Protocol, PROTOCOL};

/// A side of the canvas. The discriminant is the protocol's side index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left = 0,
    Top = 1,
    Right = 2,
    Bottom = 3,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Top, Side::Right, Side::Bottom];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Left and right run along the image height.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// One of the eight word runs: a side plus which half of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HalfEdge {
    pub side: Side,
    pub second: bool,
}

impl HalfEdge {
    /// Protocol order: left-first, left-second, top-first, ..., bottom-second.
    pub const ALL: [HalfEdge; Protocol::HALF_EDGES] = [
        HalfEdge { side: Side::Left, second: false },
        HalfEdge { side: Side::Left, second: true },
        HalfEdge { side: Side::Top, second: false },
        HalfEdge { side: Side::Top, second: true },
        HalfEdge { side: Side::Right, second: false },
        HalfEdge { side: Side::Right, second: true },
        HalfEdge { side: Side::Bottom, second: false },
        HalfEdge { side: Side::Bottom, second: true },
    ];

    pub const fn index(self) -> usize {
        self.side.index() * 2 + self.second as usize
    }
}

/// One word position: a half-edge and the word number within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub half: HalfEdge,
    pub word: usize,
}

/// Pixel rectangle of the marker block at `coord` along `side`.
///
/// `coord` is a row for the vertical sides and a column for the horizontal
/// ones; the block sits flush against the canvas edge.
pub fn block_rect(width: usize, height: usize, block: usize, side: Side, coord: usize) -> Rect {
    match side {
        Side::Left => Rect::new(0, coord, block, block),
        Side::Right => Rect::new(width - block, coord, block, block),
        Side::Top => Rect::new(coord, 0, block, block),
        Side::Bottom => Rect::new(coord, height - block, block, block),
    }
}

/// Word capacity of a marked canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderLayout {
    /// Canvas width (after any expansion).
    pub width: usize,
    /// Canvas height (after any expansion).
    pub height: usize,
    /// Marker block edge in pixels.
    pub block: usize,
    /// Words per half of each vertical side.
    pub words_y: usize,
    /// Words per half of each horizontal side.
    pub words_x: usize,
}

impl BorderLayout {
    /// Plan the layout for a canvas of the given (already expanded) size.
    pub fn new(width: usize, height: usize, block: usize) -> Result<Self, BorderError> {
        if block == 0 {
            return Err(BorderError::InvalidOptions("block size must be at least 1"));
        }
        if block > width / 2 || block > height / 2 {
            return Err(BorderError::InvalidGeometry("canvas narrower than two marker blocks"));
        }
        let span = PROTOCOL.band_span.saturating_mul(block);
        let words_y = ((height - 2 * block) / span).min(PROTOCOL.max_axis_words);
        let words_x = ((width - 2 * block) / span).min(PROTOCOL.max_axis_words);
        Ok(Self { width, height, block, words_y, words_x })
    }

    /// Words per half-edge on the axis of `side`.
    pub fn axis_words(&self, side: Side) -> usize {
        if side.is_vertical() {
            self.words_y
        } else {
            self.words_x
        }
    }

    /// True when both axes can hold their header words.
    pub fn has_header_room(&self) -> bool {
        let h = PROTOCOL.header_words;
        self.words_y >= h && self.words_x >= h
    }

    /// Payload word slots: `4 * (words_y + words_x - 8)`, or 0 when an axis
    /// cannot hold its header.
    pub fn capacity(&self) -> usize {
        if !self.has_header_room() {
            return 0;
        }
        4 * (self.words_y + self.words_x - 2 * PROTOCOL.header_words)
    }

    /// Fail unless `symbols` words fit.
    pub fn ensure_fits(&self, symbols: usize) -> Result<(), BorderError> {
        let capacity = self.capacity();
        if !self.has_header_room() || symbols > capacity {
            return Err(BorderError::ContentTooLong { required: symbols, capacity });
        }
        Ok(())
    }

    /// Length of a side in pixels.
    fn side_len(&self, side: Side) -> usize {
        if side.is_vertical() {
            self.height
        } else {
            self.width
        }
    }

    /// The twelve marker blocks of a word, in writing order: value bits
    /// (MSB first), dark sentinel, bright sentinel.
    pub fn word_cells(&self, slot: Slot) -> Vec<Rect> {
        let b = self.block;
        let side = slot.half.side;
        let stride = PROTOCOL.word_span(b);
        (0..PROTOCOL.word_cells)
            .map(|k| {
                let coord = if slot.half.second {
                    self.side_len(side) - 2 * b - slot.word * stride - k * b
                } else {
                    b + slot.word * stride + k * b
                };
                block_rect(self.width, self.height, b, side, coord)
            })
            .collect()
    }

    /// The four corner blocks.
    pub fn corner_cells(&self) -> [Rect; 4] {
        let (w, h, b) = (self.width, self.height, self.block);
        [
            block_rect(w, h, b, Side::Left, 0),
            block_rect(w, h, b, Side::Left, h - b),
            block_rect(w, h, b, Side::Right, 0),
            block_rect(w, h, b, Side::Right, h - b),
        ]
    }

    /// Payload slots in stream order.
    ///
    /// Two accumulators, one per axis, are each advanced by the other axis's
    /// payload word count. The smaller one wins the round and its four
    /// half-edges each take one word, so both axes run out together.
    pub fn payload_slots(&self) -> Vec<Slot> {
        if !self.has_header_room() {
            return Vec::new();
        }
        let header = PROTOCOL.header_words;
        let mut left_y = self.words_y - header;
        let mut left_x = self.words_x - header;
        let (step_y, step_x) = (left_x as f64, left_y as f64);
        let mut acc_y = 0.5 * step_y;
        let mut acc_x = 0.5 * step_x;
        let mut next = [header; Protocol::HALF_EDGES];

        let y_halves = [HalfEdge::ALL[0], HalfEdge::ALL[1], HalfEdge::ALL[4], HalfEdge::ALL[5]];
        let x_halves = [HalfEdge::ALL[2], HalfEdge::ALL[3], HalfEdge::ALL[6], HalfEdge::ALL[7]];

        let mut slots = Vec::with_capacity(self.capacity());
        while left_y > 0 || left_x > 0 {
            let take_y = left_y > 0 && (left_x == 0 || acc_y <= acc_x);
            let halves = if take_y { &y_halves } else { &x_halves };
            for &half in halves {
                let i = half.index();
                slots.push(Slot { half, word: next[i] });
                next[i] += 1;
            }
            if take_y {
                acc_y += step_y;
                left_y -= 1;
            } else {
                acc_x += step_x;
                left_x -= 1;
            }
        }
        slots
    }
}
