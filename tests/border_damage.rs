// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Damage tolerance: header replica loss, ECC limits, repetition voting.

use bordermark_core::border::layout::{HalfEdge, Slot};
use bordermark_core::{
    embed, extract, extract_with_quality, BorderError, BorderLayout, Channels, MarkOptions, Raster,
    Rect,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn textured(width: usize, height: usize, seed: u64) -> Raster {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    Raster::from_fn(width, height, Channels::Gray, |x, y, _| {
        let base = 70.0 + 100.0 * (x + y) as f64 / (width + height) as f64;
        (base + rng.gen_range(-40.0..40.0)).clamp(0.0, 255.0) as u8
    })
    .unwrap()
}

/// Paint the header words of the given half-edges flat so they read as erasures.
fn occlude_headers(image: &mut Raster, layout: &BorderLayout, halves: &[usize]) {
    for &h in halves {
        for word in 0..4 {
            for cell in layout.word_cells(Slot { half: HalfEdge::ALL[h], word }) {
                image.fill_region(cell, 128);
            }
        }
    }
}

#[test]
fn header_survives_six_lost_replicas() {
    let opts = MarkOptions::default();
    let mut marked = embed(&textured(480, 480, 20), "hello", &opts).unwrap();
    let layout = BorderLayout::new(marked.width(), marked.height(), opts.block_size).unwrap();
    occlude_headers(&mut marked, &layout, &[0, 1, 2, 4, 5, 6]);

    let (content, quality) = extract_with_quality(&marked, &opts).unwrap();
    assert_eq!(content, b"hello");
    assert_eq!((quality.header_agreeing, quality.header_readable), (2, 2));
}

#[test]
fn all_replicas_lost_is_unrecoverable() {
    let opts = MarkOptions::default();
    let mut marked = embed(&textured(480, 480, 21), "hello", &opts).unwrap();
    let layout = BorderLayout::new(marked.width(), marked.height(), opts.block_size).unwrap();
    occlude_headers(&mut marked, &layout, &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(extract(&marked, &opts), Err(BorderError::HeaderUnrecoverable));
}

/// Invert the value bits of the payload words at `slots`. On a flat gray
/// canvas marked bits sit at 128 +/- 24.
fn flip_payload_words(image: &mut Raster, layout: &BorderLayout, slots: std::ops::Range<usize>) {
    for slot in layout.payload_slots().into_iter().skip(slots.start).take(slots.len()) {
        for cell in &layout.word_cells(slot)[..10] {
            let flipped = if image.get(cell.x, cell.y, 0) > 128 { 104 } else { 152 };
            image.fill_region(*cell, flipped);
        }
    }
}

#[test]
fn ecc_corrects_up_to_half_parity() {
    // 8 bytes at ratio 0.5 fill all 16 slots exactly: one copy, t = 4.
    let opts = MarkOptions::default();
    let flat = Raster::filled(480, 480, Channels::Gray, 128).unwrap();
    let marked = embed(&flat, b"border!!", &opts).unwrap();
    let layout = BorderLayout::new(486, 486, 3).unwrap();

    let mut damaged = marked.clone();
    flip_payload_words(&mut damaged, &layout, 0..4);
    let (content, quality) = extract_with_quality(&damaged, &opts).unwrap();
    assert_eq!(content, b"border!!");
    assert_eq!(quality.symbol_errors_corrected, 4);
    assert_eq!(quality.error_capacity, 4);
    assert_eq!(quality.copies, 1);

    let mut damaged = marked;
    flip_payload_words(&mut damaged, &layout, 0..5);
    assert_eq!(extract(&damaged, &opts), Err(BorderError::PayloadCorrupted));
}

#[test]
fn ecc_limit_applies_per_chunk() {
    // 10800x648 grows to 10806x654: 150 + 9 words per half, 604 slots.
    // 300 bytes at ratio 0.5 split into three 100 + 100 codewords, so the
    // second chunk occupies stream symbols 200..400, each written once.
    let opts = MarkOptions::default();
    let flat = Raster::filled(10_800, 648, Channels::Gray, 128).unwrap();
    let payload: Vec<u8> = (0..300u32).map(|i| (i * 7 % 256) as u8).collect();
    let marked = embed(&flat, &payload, &opts).unwrap();
    let layout = BorderLayout::new(marked.width(), marked.height(), opts.block_size).unwrap();
    assert_eq!(layout.capacity(), 604);

    let mut damaged = marked.clone();
    flip_payload_words(&mut damaged, &layout, 200..250);
    let (content, quality) = extract_with_quality(&damaged, &opts).unwrap();
    assert_eq!(content, payload);
    assert_eq!(quality.chunks, 3);
    assert_eq!(quality.symbol_errors_corrected, 50);
    assert_eq!(quality.max_chunk_errors, 50);
    assert_eq!(quality.copies, 1);

    let mut damaged = marked;
    flip_payload_words(&mut damaged, &layout, 200..251);
    assert_eq!(extract(&damaged, &opts), Err(BorderError::PayloadCorrupted));
}

#[test]
fn repetition_recovers_two_erased_sides() {
    let opts = MarkOptions::default();
    let mut marked = embed(&textured(1200, 720, 22), "hello", &opts).unwrap();
    let (w, h) = (marked.width(), marked.height());
    marked.fill_region(Rect::new(0, h - 3, w, 3), 90);
    marked.fill_region(Rect::new(w - 3, 0, 3, h), 90);

    let (content, quality) = extract_with_quality(&marked, &opts).unwrap();
    assert_eq!(content, b"hello");
    assert_eq!(quality.header_readable, 4);
    assert_eq!(quality.symbol_errors_corrected, 0);
    // Every round routes two of its four words to the right or bottom side.
    assert_eq!(quality.erased_words, 36);
    assert_eq!(quality.copies, 6);
}

#[test]
fn mild_noise_is_absorbed() {
    let opts = MarkOptions::default();
    let payload = b"noise-robust payload";
    let marked = embed(&textured(1200, 720, 23), payload, &opts).unwrap();

    let mut rng = ChaCha20Rng::seed_from_u64(24);
    let noisy = Raster::from_fn(marked.width(), marked.height(), Channels::Gray, |x, y, c| {
        let v = marked.get(x, y, c) as i32 + rng.gen_range(-10..=10);
        v.clamp(0, 255) as u8
    })
    .unwrap();

    let (content, quality) = extract_with_quality(&noisy, &opts).unwrap();
    assert_eq!(content, payload);
    assert_eq!(quality.header_agreeing, 8);
}
