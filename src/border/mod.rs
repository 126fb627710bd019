// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Border marking: payloads carried as brightness perturbations along the
//! four image edges.
//!
//! - **Chunking** (`chunking`, `ecc`): the payload is split into at most 16
//!   Reed-Solomon codewords with parity derived from the redundancy ratio.
//! - **Geometry** (`geometry`): optional canvas expansion by one block per
//!   side, then Gaussian smoothing of the border bands.
//! - **Layout** (`layout`, `repetition`): each side holds two runs of 10-bit
//!   words; spare slots repeat the stream for soft majority voting.
//! - **Markers** (`marker`, `header`): every bit is one block pushed brighter
//!   or darker, every word is framed by a sentinel pair, and each of the
//!   eight word runs starts with a copy of the header.
//!
//! The pipeline: RS encode -> repeat -> route -> mark. Extraction mirrors it.

pub mod error;
pub mod protocol;
pub mod ecc;
pub mod chunking;
pub mod geometry;
pub mod layout;
pub mod header;
pub mod repetition;
pub mod marker;
pub mod options;
mod pipeline;

pub use error::BorderError;
pub use layout::BorderLayout;
pub use options::{MarkOptions, Payload};
pub use pipeline::{
    capacity, embed, embed_in_place, extract, extract_auto, extract_with_quality, max_content_len,
    DecodeQuality,
};
