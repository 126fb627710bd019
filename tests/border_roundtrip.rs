// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Round-trip integration tests for border embed/extract.

use bordermark_core::border::geometry::expand_canvas;
use bordermark_core::{
    capacity, embed, embed_in_place, extract, extract_auto, extract_with_quality, max_content_len,
    BorderError, Channels, MarkOptions, Raster,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Noisy image with a gentle diagonal gradient.
fn textured(width: usize, height: usize, channels: Channels, seed: u64) -> Raster {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    Raster::from_fn(width, height, channels, |x, y, c| {
        let base = 70.0 + 100.0 * (x + y) as f64 / (width + height) as f64 + 10.0 * c as f64;
        let noise: f64 = rng.gen_range(-40.0..40.0);
        (base + noise).clamp(0.0, 255.0) as u8
    })
    .unwrap()
}

#[test]
fn hello_roundtrip_grows_canvas() {
    let img = textured(480, 480, Channels::Gray, 1);
    let opts = MarkOptions::default();
    let marked = embed(&img, "hello", &opts).unwrap();
    assert_eq!((marked.width(), marked.height()), (486, 486));
    assert_eq!(marked.channels(), Channels::Gray);

    let (content, quality) = extract_with_quality(&marked, &opts).unwrap();
    assert_eq!(content, b"hello");
    assert_eq!(quality.symbol_errors_corrected, 0);
    assert_eq!(quality.header_agreeing, 8);
    assert!(quality.signal_strength > 0.8, "{quality:?}");
}

#[test]
fn rgb_roundtrip() {
    let img = textured(1200, 720, Channels::Rgb, 2);
    let opts = MarkOptions::default();
    let payload: Vec<u8> = (0..30u8).map(|i| i.wrapping_mul(37) ^ 0x5A).collect();
    let marked = embed(&img, &payload, &opts).unwrap();
    assert_eq!((marked.width(), marked.height()), (1206, 726));
    assert_eq!(marked.channels(), Channels::Rgb);
    assert_eq!(extract(&marked, &opts).unwrap(), payload);
}

#[test]
fn interior_is_preserved() {
    let img = textured(480, 480, Channels::Gray, 3);
    let marked = embed(&img, "x", &MarkOptions::default()).unwrap();
    // Original pixels sit shifted by one block; only the outer band changes.
    for y in 0..480 {
        for x in 0..480 {
            assert_eq!(marked.get(x + 3, y + 3, 0), img.get(x, y, 0), "({x},{y})");
        }
    }
}

#[test]
fn empty_payload_roundtrip() {
    let img = textured(480, 480, Channels::Gray, 4);
    let opts = MarkOptions::default();
    let marked = embed(&img, b"", &opts).unwrap();
    assert_eq!(extract(&marked, &opts).unwrap(), Vec::<u8>::new());
}

#[test]
fn payload_over_1023_bytes_is_invalid() {
    let img = textured(480, 480, Channels::Gray, 5);
    let payload = vec![0u8; 1024];
    assert_eq!(embed(&img, &payload, &MarkOptions::default()), Err(BorderError::InvalidContent));
}

#[test]
fn small_image_cannot_hold_header() {
    // 100x100 grows to 106x106: one word per half-edge, no room for the four
    // header words.
    let img = textured(100, 100, Channels::Gray, 6);
    assert_eq!(
        embed(&img, b"hello", &MarkOptions::default()),
        Err(BorderError::ContentTooLong { required: 10, capacity: 0 })
    );
}

#[test]
fn exact_capacity_fits_and_one_more_fails() {
    let img = textured(480, 480, Channels::Gray, 7);
    assert_eq!(capacity(480, 480, &MarkOptions::default()).unwrap().capacity(), 16);

    // Ratio 0.5: L data + L parity.
    let opts = MarkOptions::default();
    let marked = embed(&img, b"8 bytes!", &opts).unwrap();
    assert_eq!(extract(&marked, &opts).unwrap(), b"8 bytes!");
    assert_eq!(
        embed(&img, b"9 bytes!!", &opts),
        Err(BorderError::ContentTooLong { required: 18, capacity: 16 })
    );

    // Ratio 0: no parity at all.
    let opts = MarkOptions::default().with_ecc_redundancy(0.0);
    let payload = *b"sixteen bytes..!";
    let marked = embed(&img, payload, &opts).unwrap();
    assert_eq!(extract(&marked, &opts).unwrap(), payload);
    assert_eq!(
        embed(&img, b"seventeen bytes..", &opts),
        Err(BorderError::ContentTooLong { required: 17, capacity: 16 })
    );
    assert_eq!(max_content_len(480, 480, &opts), Ok(16));
}

#[test]
fn excessive_redundancy_is_rejected() {
    let img = textured(480, 480, Channels::Gray, 8);
    let opts = MarkOptions::default().with_ecc_redundancy(2.0);
    let payload = vec![1u8; 1023];
    match embed(&img, &payload, &opts) {
        Err(BorderError::EccTooWide { chunks }) => assert!(chunks > 16),
        other => panic!("expected EccTooWide, got {other:?}"),
    }
}

#[test]
fn multi_chunk_roundtrip() {
    // 300 bytes need three chunks and set the length-overflow header bit.
    let img = textured(10_800, 648, Channels::Gray, 15);
    let opts = MarkOptions::default();
    let payload: Vec<u8> = (0..300u32).map(|i| (i * 89 % 253) as u8).collect();
    let marked = embed(&img, &payload, &opts).unwrap();

    let (content, quality) = extract_with_quality(&marked, &opts).unwrap();
    assert_eq!(content, payload);
    assert_eq!((quality.chunks, quality.data_len, quality.parity_len), (3, 100, 100));
    assert_eq!(quality.symbol_errors_corrected, 0);
    assert_eq!(quality.header_agreeing, 8);
}

#[test]
fn pre_expanded_canvas_matches_expansion() {
    let img = textured(480, 480, Channels::Rgb, 16);
    let opts = MarkOptions::default();
    let b = opts.block_size;
    let expanded = expand_canvas(&img, b).unwrap();

    let grown = embed(&img, "hello", &opts).unwrap();
    let in_bounds = embed(&expanded, "hello", &opts.with_expand_border(false)).unwrap();
    assert_eq!(in_bounds, grown);

    // Only the margin band is written.
    for y in b..480 + b {
        for x in b..480 + b {
            for c in 0..3 {
                assert_eq!(in_bounds.get(x, y, c), expanded.get(x, y, c), "({x},{y},{c})");
            }
        }
    }
}

#[test]
fn no_expansion_keeps_dimensions() {
    let img = textured(480, 480, Channels::Gray, 9);
    let opts = MarkOptions::default().with_expand_border(false);
    let marked = embed(&img, "hello", &opts).unwrap();
    assert_eq!((marked.width(), marked.height()), (480, 480));
    assert_eq!(extract(&marked, &opts).unwrap(), b"hello");
}

#[test]
fn in_place_roundtrip_and_failure_leaves_image() {
    let opts = MarkOptions::default().with_expand_border(false);
    let mut img = textured(480, 480, Channels::Rgb, 10);
    embed_in_place(&mut img, "hello", &opts).unwrap();
    assert_eq!(extract(&img, &opts).unwrap(), b"hello");

    let mut img = textured(480, 480, Channels::Rgb, 11);
    let before = img.clone();
    assert!(matches!(
        embed_in_place(&mut img, b"nine byte", &opts),
        Err(BorderError::ContentTooLong { .. })
    ));
    assert_eq!(img, before);
}

#[test]
fn options_must_match_on_extract() {
    let img = textured(480, 480, Channels::Gray, 12);
    let marked = embed(&img, "hello", &MarkOptions::default()).unwrap();
    let err = extract(&marked, &MarkOptions::default().with_block_size(5)).unwrap_err();
    assert!(err.is_corruption(), "{err:?}");
}

#[test]
fn auto_detects_block_size_and_color_diff() {
    let img = textured(600, 600, Channels::Gray, 13);
    let opts = MarkOptions::default().with_block_size(4).with_color_diff(30);
    let marked = embed(&img, "auto", &opts).unwrap();
    assert_eq!((marked.width(), marked.height()), (608, 608));

    let (content, found) = extract_auto(&marked).unwrap();
    assert_eq!(content, b"auto");
    assert_eq!(found.block_size, 4);
    assert_eq!(found.color_diff, 30);
    assert!((found.ecc_redundancy - 0.5).abs() < 1e-9);
}

#[test]
fn auto_detect_on_unmarked_image_fails() {
    let img = textured(480, 480, Channels::Gray, 14);
    let err = extract_auto(&img).unwrap_err();
    assert!(err.is_corruption(), "{err:?}");
}
