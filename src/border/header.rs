// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Header words and replica voting.
//!
//! Every half-edge starts with the same four header words:
//!
//! | word | content |
//! |------|---------|
//! | 0 | `side + 4 * (chunks - 1) + 64 * (content_len / 256)` |
//! | 1 | words per half-edge on this axis |
//! | 2 | `content_len % 256` |
//! | 3 | parity symbols per chunk |
//!
//! The eight replicas are soft-combined field by field. The combined header
//! is accepted only when a strict majority of the readable replicas decode
//! to exactly the same fields on their own.

use super::chunking::ChunkPlan;
use super::error::BorderError;
use super::layout::{BorderLayout, HalfEdge, Side, Slot};
use super::marker::SoftWord;
use super::protocol::{Protocol, PROTOCOL};

/// Logical header content shared by all replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub chunks: usize,
    pub content_len: usize,
    pub parity_len: usize,
}

/// Outcome of header voting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderVote {
    pub header: Header,
    pub plan: ChunkPlan,
    /// Replicas that decoded to the accepted header on their own.
    pub agreeing: usize,
    /// Replicas with all four words readable.
    pub readable: usize,
}

impl Header {
    pub fn from_plan(plan: &ChunkPlan) -> Self {
        Self { chunks: plan.chunks, content_len: plan.content_len, parity_len: plan.parity_len }
    }

    /// Word 0 for `side`.
    pub fn side_marker(&self, side: Side) -> u16 {
        (side.index() + 4 * (self.chunks - 1) + 64 * (self.content_len / 256)) as u16
    }

    /// The four header words of a half-edge on `side`.
    pub fn words(&self, side: Side, axis_words: usize) -> [u16; 4] {
        [
            self.side_marker(side),
            axis_words as u16,
            (self.content_len % 256) as u16,
            self.parity_len as u16,
        ]
    }

    /// Rebuild from word 0 (without its side bits), word 2 and word 3.
    fn from_fields(marker: u16, len_lo: u16, parity: u16) -> Self {
        let chunks = ((marker >> 2) & 0x0F) as usize + 1;
        let len_hi = (marker >> 6) as usize;
        Self { chunks, content_len: len_hi * 256 + len_lo as usize, parity_len: parity as usize }
    }
}

/// Slots of the header words of `half`.
pub fn header_slots(half: HalfEdge) -> impl Iterator<Item = Slot> {
    (0..PROTOCOL.header_words).map(move |word| Slot { half, word })
}

/// Sum soft bits of several readings of one field into a hard value.
fn combine<'a>(readings: impl Iterator<Item = &'a SoftWord>) -> u16 {
    let mut totals = vec![0.0f64; PROTOCOL.word_bits];
    for word in readings {
        for (t, llr) in totals.iter_mut().zip(&word.llrs) {
            *t += llr;
        }
    }
    let bits: Vec<bool> = totals.iter().map(|&t| t > 0.0).collect();
    PROTOCOL.bits_to_word(&bits)
}

/// Vote the header out of the words read at every half-edge.
///
/// `replicas[h]` holds the header words of `HalfEdge::ALL[h]`.
///
/// # Errors
/// [`BorderError::HeaderUnrecoverable`] when no strict majority of readable
/// replicas agrees, when the axis counts contradict the layout, or when the
/// fields do not describe a chunk plan that fits the layout.
pub fn vote_header(
    replicas: &[[SoftWord; 4]; Protocol::HALF_EDGES],
    layout: &BorderLayout,
) -> Result<HeaderVote, BorderError> {
    let readable: Vec<usize> = (0..Protocol::HALF_EDGES)
        .filter(|&h| replicas[h].iter().all(|w| !w.is_erased()))
        .collect();
    if readable.is_empty() {
        tracing::warn!("no readable header replica");
        return Err(BorderError::HeaderUnrecoverable);
    }

    // Side bits differ per replica; mask them off before combining.
    let marker = combine(readable.iter().map(|&h| &replicas[h][0])) & !0x03;
    let len_lo = combine(readable.iter().map(|&h| &replicas[h][2]));
    let parity = combine(readable.iter().map(|&h| &replicas[h][3]));
    let header = Header::from_fields(marker, len_lo, parity);

    for vertical in [true, false] {
        let on_axis: Vec<usize> = readable
            .iter()
            .copied()
            .filter(|&h| HalfEdge::ALL[h].side.is_vertical() == vertical)
            .collect();
        if on_axis.is_empty() {
            continue;
        }
        let count = combine(on_axis.iter().map(|&h| &replicas[h][1])) as usize;
        let expected = if vertical {
            layout.words_y
        } else {
            layout.words_x
        };
        if count != expected {
            tracing::warn!(vertical, count, expected, "header axis count contradicts layout");
            return Err(BorderError::HeaderUnrecoverable);
        }
    }

    let agreeing = readable
        .iter()
        .filter(|&&h| {
            let side = HalfEdge::ALL[h].side;
            let own: Vec<u16> = replicas[h].iter().map(SoftWord::value).collect();
            own == header.words(side, layout.axis_words(side))
        })
        .count();

    tracing::debug!(
        agreeing,
        readable = readable.len(),
        chunks = header.chunks,
        content_len = header.content_len,
        parity = header.parity_len,
        "header vote"
    );

    if agreeing == 0 || agreeing * 2 <= readable.len() {
        tracing::warn!(agreeing, readable = readable.len(), "header replicas disagree");
        return Err(BorderError::HeaderUnrecoverable);
    }

    let plan = ChunkPlan::from_header(header.content_len, header.chunks, header.parity_len)
        .ok_or(BorderError::HeaderUnrecoverable)?;
    if plan.encoded_len() > layout.capacity() {
        tracing::warn!(
            required = plan.encoded_len(),
            capacity = layout.capacity(),
            "header plan exceeds capacity"
        );
        return Err(BorderError::HeaderUnrecoverable);
    }

    Ok(HeaderVote { header, plan, agreeing, readable: readable.len() })
}
