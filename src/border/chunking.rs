// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Payload chunking with ratio-derived Reed-Solomon parity.
//!
//! A payload is split into at most 16 equally sized chunks so that each
//! chunk's codeword (data + parity) stays within the 255-symbol ceiling of
//! RS over GF(2^8). Parity per chunk is `floor(0.95 + data * 2 * ratio)`.

use super::ecc::{ReedSolomon, RsDecodeStats};
use super::error::BorderError;
use super::protocol::PROTOCOL;

/// How a payload is split into Reed-Solomon codewords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Payload length in bytes.
    pub content_len: usize,
    /// Chunk count as carried in the header (1..=16).
    pub chunks: usize,
    /// Data symbols per chunk; the last chunk may be shorter.
    pub data_len: usize,
    /// Parity symbols per chunk.
    pub parity_len: usize,
}

/// Parity symbols for `data_len` bytes at the given redundancy ratio.
pub fn parity_for(data_len: usize, redundancy: f64) -> usize {
    (PROTOCOL.parity_bias + data_len as f64 * 2.0 * redundancy) as usize
}

/// Per-chunk data length for a chunk count: `ceil(len / chunks)`.
fn data_len_for(content_len: usize, chunks: usize) -> usize {
    if chunks <= 1 || content_len == 0 {
        content_len
    } else {
        1 + (content_len - 1) / chunks
    }
}

impl ChunkPlan {
    /// Search the smallest chunk count whose codewords fit 255 symbols.
    ///
    /// # Errors
    /// [`BorderError::EccTooWide`] when more than 16 chunks would be needed.
    pub fn new(content_len: usize, redundancy: f64) -> Result<Self, BorderError> {
        let max_cw = PROTOCOL.max_codeword;
        let parity = parity_for(content_len, redundancy);
        let total = content_len.saturating_add(parity);
        if total <= max_cw {
            return Ok(Self { content_len, chunks: 1, data_len: content_len, parity_len: parity });
        }

        let mut chunks = total.div_ceil(max_cw);
        loop {
            if chunks > PROTOCOL.max_chunks {
                return Err(BorderError::EccTooWide { chunks });
            }
            let data_len = data_len_for(content_len, chunks);
            let parity_len = parity_for(data_len, redundancy);
            if data_len.saturating_add(parity_len) <= max_cw {
                return Ok(Self { content_len, chunks, data_len, parity_len });
            }
            chunks += 1;
        }
    }

    /// Rebuild a plan from decoded header fields.
    ///
    /// Returns `None` when the fields cannot come from [`ChunkPlan::new`].
    pub fn from_header(content_len: usize, chunks: usize, parity_len: usize) -> Option<Self> {
        if content_len > PROTOCOL.max_content_len || !(1..=PROTOCOL.max_chunks).contains(&chunks) {
            return None;
        }
        // An empty payload carries no codeword, hence no parity.
        if content_len == 0 && parity_len != 0 {
            return None;
        }
        let data_len = data_len_for(content_len, chunks);
        if data_len + parity_len > PROTOCOL.max_codeword {
            return None;
        }
        Some(Self { content_len, chunks, data_len, parity_len })
    }

    /// Data length of every codeword actually produced.
    pub fn chunk_lengths(&self) -> Vec<usize> {
        if self.content_len == 0 {
            return Vec::new();
        }
        let mut lengths = Vec::new();
        let mut remaining = self.content_len;
        while remaining > 0 {
            let n = remaining.min(self.data_len);
            lengths.push(n);
            remaining -= n;
        }
        lengths
    }

    /// Total symbols in the encoded stream.
    pub fn encoded_len(&self) -> usize {
        self.content_len + self.chunk_lengths().len() * self.parity_len
    }

    /// RS-encode `content` chunk by chunk into one symbol stream.
    pub fn encode(&self, content: &[u8]) -> Vec<u8> {
        debug_assert_eq!(content.len(), self.content_len);
        let rs = ReedSolomon::new(self.parity_len);
        let mut out = Vec::with_capacity(self.encoded_len());
        if self.data_len == 0 {
            return out;
        }
        for chunk in content.chunks(self.data_len) {
            out.extend_from_slice(&rs.encode(chunk));
        }
        out
    }

    /// Decode a symbol stream produced by [`ChunkPlan::encode`].
    ///
    /// # Errors
    /// [`BorderError::PayloadCorrupted`] if the stream is short or any chunk
    /// is beyond repair.
    pub fn decode(&self, symbols: &[u8]) -> Result<(Vec<u8>, RsDecodeStats), BorderError> {
        let rs = ReedSolomon::new(self.parity_len);
        let mut content = Vec::with_capacity(self.content_len);
        let mut stats = RsDecodeStats::default();
        let mut offset = 0;

        for (index, len) in self.chunk_lengths().into_iter().enumerate() {
            let block = symbols
                .get(offset..offset + len + self.parity_len)
                .ok_or(BorderError::PayloadCorrupted)?;
            let (data, errors) = rs.decode(block, len).map_err(|e| {
                tracing::warn!(chunk = index, parity = self.parity_len, "uncorrectable chunk");
                BorderError::from(e)
            })?;
            stats.record(errors, rs.correctable());
            content.extend_from_slice(&data);
            offset += len + self.parity_len;
        }

        Ok((content, stats))
    }
}
