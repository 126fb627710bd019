// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Border embed/extract pipeline.
//!
//! **Embedding** validates everything up front, then prepares the canvas
//! (expansion and band smoothing), darkens the corners and writes the
//! header words followed by the routed, repeated symbol stream.
//!
//! **Extraction** reads every word of every half-edge, votes the header
//! across its eight replicas, soft-votes each symbol across its repetition
//! copies and Reed-Solomon decodes the chunks.

use crate::raster::Raster;

use super::chunking::ChunkPlan;
use super::ecc::RsDecodeStats;
use super::error::BorderError;
use super::geometry::{check_block_fits, expand_canvas, smooth_border_bands};
use super::header::{header_slots, vote_header, Header, HeaderVote};
use super::layout::{BorderLayout, HalfEdge, Slot};
use super::marker::{mark_corners, mark_word, read_word, SoftWord};
use super::options::{MarkOptions, Payload};
use super::protocol::PROTOCOL;
use super::repetition::{fill_stream, full_copies, vote_symbols, VoteQuality};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Block sizes tried by [`extract_auto`].
const AUTO_BLOCK_SIZES: std::ops::RangeInclusive<usize> = 1..=8;

/// Soft bit magnitude of a clean mid-range marking.
const REFERENCE_LLR: f64 = 1.0;

/// Decode quality info returned alongside the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeQuality {
    /// Reed-Solomon symbol errors corrected across all chunks.
    pub symbol_errors_corrected: usize,
    /// Sum of correctable errors over all chunks.
    pub error_capacity: usize,
    /// Largest error count seen in a single chunk.
    pub max_chunk_errors: usize,
    /// Chunk count from the header.
    pub chunks: usize,
    /// Data symbols per chunk.
    pub data_len: usize,
    /// Parity symbols per chunk from the header.
    pub parity_len: usize,
    /// Complete copies of the symbol stream in the border.
    pub copies: usize,
    /// Header replicas that matched the accepted header.
    pub header_agreeing: usize,
    /// Header replicas with all words readable.
    pub header_readable: usize,
    /// Payload words read as erasures.
    pub erased_words: usize,
    /// Average |LLR| per copy per bit (about 1.0 when pristine).
    pub signal_strength: f64,
    /// 100 = pristine, 0 = barely recovered.
    pub integrity_percent: u8,
}

impl DecodeQuality {
    fn new(vote: &HeaderVote, votes: &VoteQuality, stats: &RsDecodeStats, copies: usize) -> Self {
        Self {
            symbol_errors_corrected: stats.total_errors,
            error_capacity: stats.error_capacity,
            max_chunk_errors: stats.max_block_errors,
            chunks: vote.plan.chunks,
            data_len: vote.plan.data_len,
            parity_len: vote.plan.parity_len,
            copies,
            header_agreeing: vote.agreeing,
            header_readable: vote.readable,
            erased_words: votes.erased_words,
            signal_strength: votes.avg_abs_llr_per_copy,
            integrity_percent: compute_integrity(votes.avg_abs_llr_per_copy, stats),
        }
    }
}

/// 70% signal strength against a clean marking, 30% RS error margin.
fn compute_integrity(signal_strength: f64, stats: &RsDecodeStats) -> u8 {
    let llr_score = (signal_strength / REFERENCE_LLR).clamp(0.0, 1.0);
    let rs_score = if stats.error_capacity == 0 {
        1.0
    } else {
        (1.0 - stats.total_errors as f64 / stats.error_capacity as f64).max(0.0)
    };
    ((0.7 * llr_score + 0.3 * rs_score) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Canvas size after optional expansion.
fn canvas_size(
    width: usize,
    height: usize,
    options: &MarkOptions,
) -> Result<(usize, usize), BorderError> {
    if !options.expand_border {
        return Ok((width, height));
    }
    let grow = |len: usize| {
        options
            .block_size
            .checked_mul(2)
            .and_then(|margin| len.checked_add(margin))
            .ok_or(BorderError::InvalidGeometry("expanded canvas size overflows"))
    };
    Ok((grow(width)?, grow(height)?))
}

/// Border layout an image of `width x height` would be marked with.
///
/// # Errors
/// - [`BorderError::InvalidOptions`] for unusable options.
/// - [`BorderError::InvalidGeometry`] if the image is too small for one
///   marker block (or two, without expansion).
pub fn capacity(
    width: usize,
    height: usize,
    options: &MarkOptions,
) -> Result<BorderLayout, BorderError> {
    options.validate()?;
    check_block_fits(width, height, options.block_size)?;
    let (cw, ch) = canvas_size(width, height, options)?;
    BorderLayout::new(cw, ch, options.block_size)
}

/// Longest payload, in bytes, that [`embed`] accepts for this image size.
///
/// # Errors
/// As [`capacity`], plus [`BorderError::ContentTooLong`] when the border
/// cannot even hold its header words.
pub fn max_content_len(
    width: usize,
    height: usize,
    options: &MarkOptions,
) -> Result<usize, BorderError> {
    let layout = capacity(width, height, options)?;
    layout.ensure_fits(0)?;
    let upper = PROTOCOL.max_content_len.min(layout.capacity());
    let best = (0..=upper)
        .rev()
        .find(|&len| {
            ChunkPlan::new(len, options.ecc_redundancy)
                .is_ok_and(|plan| plan.encoded_len() <= layout.capacity())
        })
        .unwrap_or(0);
    Ok(best)
}

/// Run every check for marking `content` into a `width x height` image.
fn plan_embedding(
    width: usize,
    height: usize,
    content: &[u8],
    options: &MarkOptions,
) -> Result<(BorderLayout, ChunkPlan), BorderError> {
    options.validate()?;
    let payload = Payload::new(content)?;
    check_block_fits(width, height, options.block_size)?;
    let (cw, ch) = canvas_size(width, height, options)?;
    let layout = BorderLayout::new(cw, ch, options.block_size)?;
    let plan = ChunkPlan::new(payload.len(), options.ecc_redundancy)?;
    layout.ensure_fits(plan.encoded_len())?;

    tracing::debug!(
        content_len = plan.content_len,
        chunks = plan.chunks,
        data_len = plan.data_len,
        parity = plan.parity_len,
        words_y = layout.words_y,
        words_x = layout.words_x,
        capacity = layout.capacity(),
        copies = full_copies(plan.encoded_len(), layout.capacity()),
        "border plan"
    );
    Ok((layout, plan))
}

/// Write the full marking onto a prepared canvas.
fn write_marks(
    canvas: &mut Raster,
    layout: &BorderLayout,
    plan: &ChunkPlan,
    content: &[u8],
    color_diff: u8,
) {
    smooth_border_bands(canvas, layout.block);
    mark_corners(canvas, layout, color_diff);

    let header = Header::from_plan(plan);
    for half in HalfEdge::ALL {
        let side = half.side;
        let words = header.words(side, layout.axis_words(side));
        for (slot, word) in header_slots(half).zip(words) {
            mark_word(canvas, layout, slot, color_diff, word);
        }
    }

    let symbols = plan.encode(content);
    let stream = fill_stream(&symbols, layout.capacity());
    for (slot, word) in layout.payload_slots().into_iter().zip(stream) {
        mark_word(canvas, layout, slot, color_diff, word);
    }
}

/// Mark `content` into the border of a copy of `image`.
///
/// With `expand_border` (the default) the result is `2 * block_size`
/// pixels larger in each dimension; otherwise it has the input's size.
///
/// # Errors
/// Checked in this order, before any pixel is written:
/// - [`BorderError::InvalidOptions`] for unusable options.
/// - [`BorderError::InvalidContent`] for more than 1023 bytes.
/// - [`BorderError::InvalidGeometry`] if the image cannot host the blocks.
/// - [`BorderError::EccTooWide`] if more than 16 chunks are needed.
/// - [`BorderError::ContentTooLong`] if the encoded payload does not fit.
pub fn embed(
    image: &Raster,
    content: impl AsRef<[u8]>,
    options: &MarkOptions,
) -> Result<Raster, BorderError> {
    let content = content.as_ref();
    let (layout, plan) = plan_embedding(image.width(), image.height(), content, options)?;

    let mut canvas = if options.expand_border {
        expand_canvas(image, options.block_size)?
    } else {
        image.clone()
    };
    write_marks(&mut canvas, &layout, &plan, content, options.color_diff);
    Ok(canvas)
}

/// Mark `content` into the border of `image` without reallocating.
///
/// # Errors
/// As [`embed`]; additionally [`BorderError::InvalidOptions`] when
/// `expand_border` is set. On error the image is left untouched.
pub fn embed_in_place(
    image: &mut Raster,
    content: impl AsRef<[u8]>,
    options: &MarkOptions,
) -> Result<(), BorderError> {
    if options.expand_border {
        return Err(BorderError::InvalidOptions("in-place embedding cannot expand the border"));
    }
    let content = content.as_ref();
    let (layout, plan) = plan_embedding(image.width(), image.height(), content, options)?;
    write_marks(image, &layout, &plan, content, options.color_diff);
    Ok(())
}

/// Read every word position of every half-edge, indexed by half-edge.
fn read_all_words(image: &Raster, layout: &BorderLayout, color_diff: u8) -> Vec<Vec<SoftWord>> {
    let halves: &[HalfEdge] = &HalfEdge::ALL;
    let read_half = |half: &HalfEdge| -> Vec<SoftWord> {
        (0..layout.axis_words(half.side))
            .map(|word| read_word(image, layout, Slot { half: *half, word }, color_diff))
            .collect()
    };

    #[cfg(feature = "parallel")]
    let words: Vec<Vec<SoftWord>> = halves.par_iter().map(read_half).collect();
    #[cfg(not(feature = "parallel"))]
    let words: Vec<Vec<SoftWord>> = halves.iter().map(read_half).collect();

    words
}

/// Decode with a fixed block size and colour difference.
fn decode_border(
    image: &Raster,
    block: usize,
    color_diff: u8,
) -> Result<(Vec<u8>, DecodeQuality), BorderError> {
    let layout = BorderLayout::new(image.width(), image.height(), block)?;
    if !layout.has_header_room() {
        tracing::debug!(
            words_y = layout.words_y,
            words_x = layout.words_x,
            "border too short for a header"
        );
        return Err(BorderError::HeaderUnrecoverable);
    }

    let words = read_all_words(image, &layout, color_diff);
    let replicas: [[SoftWord; 4]; 8] =
        core::array::from_fn(|h| core::array::from_fn(|w| words[h][w].clone()));
    let vote = vote_header(&replicas, &layout)?;

    let payload_words: Vec<SoftWord> = layout
        .payload_slots()
        .into_iter()
        .map(|slot| words[slot.half.index()][slot.word].clone())
        .collect();
    let stream_len = vote.plan.encoded_len();
    let (symbols, votes) = vote_symbols(&payload_words, stream_len);
    let (content, stats) = vote.plan.decode(&symbols)?;

    tracing::debug!(
        errors = stats.total_errors,
        capacity = stats.error_capacity,
        signal = votes.avg_abs_llr_per_copy,
        erased = votes.erased_words,
        "border payload decoded"
    );

    let copies = full_copies(stream_len, layout.capacity());
    let quality = DecodeQuality::new(&vote, &votes, &stats, copies);
    Ok((content, quality))
}

/// Recover the payload from a marked image.
///
/// `options.color_diff` and `options.block_size` must match the marking;
/// `ecc_redundancy` and `expand_border` are not needed (the header carries
/// the chunk plan and the image is read as marked).
///
/// # Errors
/// - [`BorderError::InvalidOptions`] / [`BorderError::InvalidGeometry`] for
///   bad arguments.
/// - [`BorderError::HeaderUnrecoverable`] if the header replicas disagree.
/// - [`BorderError::PayloadCorrupted`] if a chunk is beyond repair.
pub fn extract(image: &Raster, options: &MarkOptions) -> Result<Vec<u8>, BorderError> {
    extract_with_quality(image, options).map(|(content, _)| content)
}

/// Like [`extract`], also reporting how cleanly the border was read.
pub fn extract_with_quality(
    image: &Raster,
    options: &MarkOptions,
) -> Result<(Vec<u8>, DecodeQuality), BorderError> {
    options.validate()?;
    decode_border(image, options.block_size, options.color_diff)
}

/// Estimate the colour difference from the header sentinel contrast,
/// which is four colour differences for every background level.
fn estimate_color_diff(image: &Raster, layout: &BorderLayout) -> Option<u8> {
    let n = PROTOCOL.word_bits;
    let nc = image.channels().count();
    let mut contrasts: Vec<f64> = HalfEdge::ALL
        .iter()
        .flat_map(|&half| header_slots(half))
        .map(|slot| {
            let cells = layout.word_cells(slot);
            (0..nc)
                .map(|c| image.region_mean(cells[n + 1], c) - image.region_mean(cells[n], c))
                .sum::<f64>()
                / nc as f64
        })
        .collect();
    contrasts.sort_by(|a, b| a.total_cmp(b));
    let median = contrasts[contrasts.len() / 2];
    let per_diff = 2.0 * PROTOCOL.sentinel_factor as f64;
    let estimate = (median / per_diff).round();
    (1.0..=PROTOCOL.max_color_diff as f64).contains(&estimate).then_some(estimate as u8)
}

/// Recover the payload without knowing the marking options.
///
/// Tries block sizes 1 to 8 and, for each, colour differences around the
/// value estimated from the sentinel contrast. The returned options carry
/// the detected block size and colour difference, and the redundancy
/// implied by the header's parity.
///
/// # Errors
/// [`BorderError::PayloadCorrupted`] if some candidate read a header but
/// not the payload, otherwise [`BorderError::HeaderUnrecoverable`].
pub fn extract_auto(image: &Raster) -> Result<(Vec<u8>, MarkOptions), BorderError> {
    let mut candidates = Vec::new();
    for block in AUTO_BLOCK_SIZES {
        let Ok(layout) = BorderLayout::new(image.width(), image.height(), block) else { continue };
        if !layout.has_header_room() {
            continue;
        }
        let Some(cd) = estimate_color_diff(image, &layout) else { continue };
        for delta in [0i16, -1, 1] {
            let cd = cd as i16 + delta;
            if (1..=PROTOCOL.max_color_diff as i16).contains(&cd) {
                candidates.push((block, cd as u8));
            }
        }
    }
    tracing::debug!(candidates = candidates.len(), "auto-detect candidates");

    type Found = (Vec<u8>, MarkOptions);
    let try_candidate = |&(block, cd): &(usize, u8)| -> Result<Found, BorderError> {
        let (content, quality) = decode_border(image, block, cd)?;
        let redundancy = if quality.data_len > 0 {
            quality.parity_len as f64 / (2.0 * quality.data_len as f64)
        } else {
            MarkOptions::default().ecc_redundancy
        };
        let options = MarkOptions::default()
            .with_block_size(block)
            .with_color_diff(cd)
            .with_ecc_redundancy(redundancy);
        Ok((content, options))
    };

    #[cfg(feature = "parallel")]
    let results: Vec<_> = candidates.par_iter().map(try_candidate).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = candidates.iter().map(try_candidate).collect();

    // A candidate that got past the header names the real failure.
    let mut error = BorderError::HeaderUnrecoverable;
    for result in results {
        match result {
            Ok(found) => return Ok(found),
            Err(BorderError::PayloadCorrupted) => error = BorderError::PayloadCorrupted,
            Err(_) => {}
        }
    }
    Err(error)
}
