// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Repetition of the symbol stream with soft majority voting.
//!
//! Spare payload slots are filled with further copies of the encoded
//! stream, each copy preceded by a separator word, and truncated to the
//! slot count. On extraction, copy `k` of symbol `i` sits at position
//! `k * (len + 1) + i`; the soft bit values of all copies are summed
//! before the hard decision.

use super::marker::SoftWord;
use super::protocol::PROTOCOL;

/// Lay out `symbols, SEP, symbols, SEP, ...` truncated to `capacity` words.
pub fn fill_stream(symbols: &[u8], capacity: usize) -> Vec<u16> {
    let period = symbols.len() + 1;
    (0..capacity)
        .map(|p| match symbols.get(p % period) {
            Some(&s) => s as u16,
            None => PROTOCOL.separator,
        })
        .collect()
}

/// Complete copies of a `stream_len`-symbol stream in `capacity` slots.
pub fn full_copies(stream_len: usize, capacity: usize) -> usize {
    if stream_len == 0 {
        return 0;
    }
    // The last copy needs no trailing separator.
    (capacity + 1) / (stream_len + 1)
}

/// Stats from soft voting, for signal quality reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteQuality {
    /// Average |summed LLR| / copies over all symbol bits. A clean marking
    /// reads close to 1.0.
    pub avg_abs_llr_per_copy: f64,
    /// Fewest copies any symbol was voted over.
    pub min_copies: usize,
    /// Words read as erasures across every copy.
    pub erased_words: usize,
}

/// Soft majority vote of every stream symbol over its repeated copies.
///
/// `words` are the payload slots in stream order. Byte symbols never set
/// the two most significant value bits, so only the low eight are voted.
pub fn vote_symbols(words: &[SoftWord], stream_len: usize) -> (Vec<u8>, VoteQuality) {
    let erased_words = words.iter().filter(|w| w.is_erased()).count();
    if stream_len == 0 {
        let quality = VoteQuality { avg_abs_llr_per_copy: 0.0, min_copies: 0, erased_words };
        return (Vec::new(), quality);
    }

    let skip = PROTOCOL.word_bits - 8;
    let period = stream_len + 1;
    let mut symbols = Vec::with_capacity(stream_len);
    let mut sum_abs = 0.0;
    let mut min_copies = usize::MAX;

    for i in 0..stream_len {
        let mut totals = [0.0f64; 8];
        let mut copies = 0;
        for word in words.iter().skip(i).step_by(period) {
            for (t, llr) in totals.iter_mut().zip(&word.llrs[skip..]) {
                *t += llr;
            }
            copies += 1;
        }
        min_copies = min_copies.min(copies);

        let byte = totals.iter().fold(0u8, |acc, &t| (acc << 1) | (t > 0.0) as u8);
        symbols.push(byte);
        if copies > 0 {
            sum_abs += totals.iter().map(|t| t.abs()).sum::<f64>() / copies as f64;
        }
    }

    let quality = VoteQuality {
        avg_abs_llr_per_copy: sum_abs / (stream_len * 8) as f64,
        min_copies,
        erased_words,
    };
    (symbols, quality)
}
