// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! # bordermark-core
//!
//! Pure-Rust codec for carrying a short binary payload (up to 1023 bytes) in
//! the border pixels of a raster image. The payload is protected by
//! Reed-Solomon ECC, repeated over all spare border capacity and written as
//! small brightness pushes of square marker blocks, so it survives mild
//! recompression and partial damage to the edges.
//!
//! The crate works on decoded 8-bit gray or RGB buffers ([`Raster`]); file
//! formats are left to the caller (see the optional `image` feature).
//!
//! # Quick start
//!
//! ```rust,ignore
//! use bordermark_core::{embed, extract, MarkOptions, Raster, Channels};
//!
//! let photo = Raster::filled(480, 480, Channels::Rgb, 128).unwrap();
//! let opts = MarkOptions::default();
//! let marked = embed(&photo, "hello", &opts).unwrap();
//! assert_eq!(extract(&marked, &opts).unwrap(), b"hello");
//! ```

pub mod border;
pub mod raster;

pub use border::{BorderError, BorderLayout, MarkOptions, Payload};
pub use border::{
    capacity, embed, embed_in_place, extract, extract_auto, extract_with_quality, max_content_len,
    DecodeQuality,
};
pub use raster::{Channels, Raster, Rect};
