// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Border geometry preparation.
//!
//! Optionally grows the canvas by one marker block on every side, then
//! flattens the four border bands with a wide Gaussian so that existing
//! texture is not mistaken for marker contrast. Interior pixels are never
//! modified by the smoothing pass.

use crate::raster::{Raster, Rect};

use super::error::BorderError;
use super::protocol::PROTOCOL;

/// FWHM to sigma: 2 * sqrt(2 * ln 2).
const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949;

/// Reject images that cannot host even one marker block.
pub fn check_block_fits(width: usize, height: usize, block: usize) -> Result<(), BorderError> {
    if width == 0 || height == 0 {
        return Err(BorderError::InvalidGeometry("image has zero area"));
    }
    if width < block || height < block {
        return Err(BorderError::InvalidGeometry("image smaller than one marker block"));
    }
    Ok(())
}

/// Grow the canvas by `block` pixels per side.
///
/// Side margins copy the outermost `block` rows/columns of the original.
/// Each corner is the truncated pixel-wise mean of its two neighbouring
/// margin blocks.
pub fn expand_canvas(image: &Raster, block: usize) -> Result<Raster, BorderError> {
    let (w, h) = (image.width(), image.height());
    check_block_fits(w, h, block)?;
    let nc = image.channels().count();
    let (nw, nh) = (w + 2 * block, h + 2 * block);

    let mut out = Raster::filled(nw, nh, image.channels(), 0)?;
    for y in 0..nh {
        for x in 0..nw {
            let Some(sy) = margin_source(y, h, block) else { continue };
            let Some(sx) = margin_source(x, w, block) else { continue };
            for c in 0..nc {
                out.set(x, y, c, image.get(sx, sy, c));
            }
        }
    }

    let b = block;
    // (corner origin, horizontal-margin neighbour origin, vertical-margin neighbour origin)
    let corners = [
        ((0, 0), (b, 0), (0, b)),
        ((nw - b, 0), (nw - 2 * b, 0), (nw - b, b)),
        ((0, nh - b), (b, nh - b), (0, nh - 2 * b)),
        ((nw - b, nh - b), (nw - 2 * b, nh - b), (nw - b, nh - 2 * b)),
    ];
    for ((cx, cy), (hx, hy), (vx, vy)) in corners {
        for dy in 0..b {
            for dx in 0..b {
                for c in 0..nc {
                    let a = out.get(hx + dx, hy + dy, c) as u16;
                    let v = out.get(vx + dx, vy + dy, c) as u16;
                    out.set(cx + dx, cy + dy, c, ((a + v) / 2) as u8);
                }
            }
        }
    }

    Ok(out)
}

/// Source coordinate in the original image for an expanded coordinate, or
/// `None` inside a corner-only range.
fn margin_source(pos: usize, len: usize, block: usize) -> Option<usize> {
    if pos < block {
        // Leading margin mirrors rows/cols 0..block of the original in order.
        Some(pos)
    } else if pos < block + len {
        Some(pos - block)
    } else if pos < 2 * block + len {
        Some(len - block + (pos - block - len))
    } else {
        None
    }
}

/// The four border bands in the order they are smoothed: top, left,
/// bottom, right.
pub fn border_bands(width: usize, height: usize, block: usize) -> [Rect; 4] {
    [
        Rect::new(0, 0, width, block),
        Rect::new(0, 0, block, height),
        Rect::new(0, height - block, width, block),
        Rect::new(width - block, 0, block, height),
    ]
}

/// Smooth every border band in place with a Gaussian of FWHM `24 * block`.
pub fn smooth_border_bands(image: &mut Raster, block: usize) {
    let kernel = gaussian_kernel((PROTOCOL.band_span * block) as f64);
    for band in border_bands(image.width(), image.height(), block) {
        let nc = image.channels().count();
        let mut samples = image.read_region_f64(band);
        blur_region(&mut samples, band.width, band.height, nc, &kernel);
        image.write_region_f64(band, &samples);
    }
}

/// Symmetric kernel weights for offsets `0..=radius`.
fn gaussian_kernel(fwhm: f64) -> Vec<f64> {
    let sigma = (fwhm / FWHM_PER_SIGMA).max(0.5);
    let radius = (3.0 * sigma).ceil() as usize;
    (0..=radius)
        .map(|d| (-((d * d) as f64) / (2.0 * sigma * sigma)).exp())
        .collect()
}

/// Separable blur over an interleaved `width x height x nc` buffer.
/// Taps falling outside the region are dropped and the rest renormalised.
fn blur_region(samples: &mut [f64], width: usize, height: usize, nc: usize, kernel: &[f64]) {
    let mut line = Vec::new();

    for y in 0..height {
        for c in 0..nc {
            line.clear();
            line.extend((0..width).map(|x| samples[(y * width + x) * nc + c]));
            let blurred = blur_line(&line, kernel);
            for (x, v) in blurred.into_iter().enumerate() {
                samples[(y * width + x) * nc + c] = v;
            }
        }
    }

    for x in 0..width {
        for c in 0..nc {
            line.clear();
            line.extend((0..height).map(|y| samples[(y * width + x) * nc + c]));
            let blurred = blur_line(&line, kernel);
            for (y, v) in blurred.into_iter().enumerate() {
                samples[(y * width + x) * nc + c] = v;
            }
        }
    }
}

fn blur_line(line: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = line.len() as isize;
    let radius = kernel.len() as isize - 1;
    (0..n)
        .map(|i| {
            let mut acc = 0.0;
            let mut norm = 0.0;
            for d in -radius..=radius {
                let j = i + d;
                if j < 0 || j >= n {
                    continue;
                }
                let wgt = kernel[d.unsigned_abs()];
                acc += wgt * line[j as usize];
                norm += wgt;
            }
            acc / norm
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Channels;

    #[test]
    fn expansion_copies_edges_and_averages_corners() {
        // 4x3 gray image, value = 10*x + y
        let img = Raster::from_fn(4, 3, Channels::Gray, |x, y, _| (10 * x + y) as u8).unwrap();
        let out = expand_canvas(&img, 2).unwrap();
        assert_eq!((out.width(), out.height()), (8, 7));

        // Interior is a shifted copy.
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(out.get(x + 2, y + 2, 0), img.get(x, y, 0));
            }
        }
        // Top margin repeats rows 0..2, bottom margin rows 1..3.
        assert_eq!(out.get(3, 0, 0), img.get(1, 0, 0));
        assert_eq!(out.get(3, 1, 0), img.get(1, 1, 0));
        assert_eq!(out.get(3, 5, 0), img.get(1, 1, 0));
        assert_eq!(out.get(3, 6, 0), img.get(1, 2, 0));
        // Right margin repeats columns 2..4.
        assert_eq!(out.get(6, 3, 0), img.get(2, 1, 0));
        assert_eq!(out.get(7, 3, 0), img.get(3, 1, 0));

        // Top-left corner pixel (0,0) = mean of (2,0) and (0,2).
        let expected = (out.get(2, 0, 0) as u16 + out.get(0, 2, 0) as u16) / 2;
        assert_eq!(out.get(0, 0, 0) as u16, expected);
        // Bottom-right corner pixel.
        let expected = (out.get(5, 6, 0) as u16 + out.get(7, 4, 0) as u16) / 2;
        assert_eq!(out.get(7, 6, 0) as u16, expected);
    }

    #[test]
    fn expansion_rejects_tiny_images() {
        let img = Raster::filled(2, 8, Channels::Rgb, 9).unwrap();
        assert!(matches!(expand_canvas(&img, 3), Err(BorderError::InvalidGeometry(_))));
    }

    #[test]
    fn smoothing_flattens_bands_only() {
        // Checkerboard: maximal local contrast.
        let mut img = Raster::from_fn(120, 90, Channels::Gray, |x, y, _| {
            if (x + y) % 2 == 0 {
                40
            } else {
                200
            }
        })
        .unwrap();
        let before = img.clone();
        smooth_border_bands(&mut img, 3);

        for x in 0..120 {
            let v = img.get(x, 1, 0) as i32;
            assert!((v - 120).abs() <= 6, "top band x={x} v={v}");
        }
        for y in 3..87 {
            for x in 3..117 {
                assert_eq!(img.get(x, y, 0), before.get(x, y, 0), "interior touched at ({x},{y})");
            }
        }
    }

    #[test]
    fn smoothing_keeps_uniform_images() {
        let mut img = Raster::filled(80, 80, Channels::Rgb, 77).unwrap();
        let before = img.clone();
        smooth_border_bands(&mut img, 2);
        assert_eq!(img, before);
    }

    #[test]
    fn kernel_is_wide_for_large_blocks() {
        let k = gaussian_kernel(72.0);
        assert_eq!(k[0], 1.0);
        assert!(k.len() > 80);
        assert!(k.windows(2).all(|w| w[0] >= w[1]));
    }
}
