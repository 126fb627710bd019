// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Owned 8-bit pixel buffers.
//!
//! A [`Raster`] is one interleaved `Vec<u8>` plus its dimensions. Regions
//! are addressed through [`Rect`] values computed by pure geometry
//! functions, so no code relies on reshaping the buffer.

use crate::border::error::BorderError;

/// Colour planes per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Gray,
    Rgb,
}

impl Channels {
    pub const fn count(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }

    /// Resolve a plane count; only 1 and 3 are supported.
    pub fn from_count(count: usize) -> Result<Self, BorderError> {
        match count {
            1 => Ok(Self::Gray),
            3 => Ok(Self::Rgb),
            _ => Err(BorderError::InvalidGeometry("only 1 or 3 colour planes are supported")),
        }
    }
}

/// Axis-aligned pixel rectangle (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub const fn area(&self) -> usize {
        self.width * self.height
    }
}

/// An owned image buffer in row-major, channel-interleaved order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: Channels,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap an existing buffer.
    ///
    /// # Errors
    /// [`BorderError::InvalidGeometry`] for zero area or a buffer whose
    /// length does not equal `width * height * channels`.
    pub fn new(
        width: usize,
        height: usize,
        channels: Channels,
        data: Vec<u8>,
    ) -> Result<Self, BorderError> {
        if width == 0 || height == 0 {
            return Err(BorderError::InvalidGeometry("image has zero area"));
        }
        let expected = width
            .checked_mul(height)
            .and_then(|p| p.checked_mul(channels.count()))
            .ok_or(BorderError::InvalidGeometry("image dimensions overflow"))?;
        if data.len() != expected {
            return Err(BorderError::InvalidGeometry("buffer length does not match dimensions"));
        }
        Ok(Self { width, height, channels, data })
    }

    /// A uniformly filled image.
    pub fn filled(
        width: usize,
        height: usize,
        channels: Channels,
        value: u8,
    ) -> Result<Self, BorderError> {
        let len = width.saturating_mul(height).saturating_mul(channels.count());
        Self::new(width, height, channels, vec![value; len])
    }

    /// Build an image from a per-sample function `f(x, y, channel)`.
    pub fn from_fn(
        width: usize,
        height: usize,
        channels: Channels,
        mut f: impl FnMut(usize, usize, usize) -> u8,
    ) -> Result<Self, BorderError> {
        let nc = channels.count();
        let mut data = Vec::with_capacity(width.saturating_mul(height).saturating_mul(nc));
        for y in 0..height {
            for x in 0..width {
                for c in 0..nc {
                    data.push(f(x, y, c));
                }
            }
        }
        Self::new(width, height, channels, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn index(&self, x: usize, y: usize, c: usize) -> usize {
        (y * self.width + x) * self.channels.count() + c
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> u8 {
        self.data[self.index(x, y, c)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, value: u8) {
        let i = self.index(x, y, c);
        self.data[i] = value;
    }

    /// Mean of one channel over a rectangle.
    pub fn region_mean(&self, rect: Rect, c: usize) -> f64 {
        if rect.area() == 0 {
            return 0.0;
        }
        let mut sum = 0u64;
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                sum += self.get(x, y, c) as u64;
            }
        }
        sum as f64 / rect.area() as f64
    }

    /// Add `delta` to one channel over a rectangle, clamping to 0..=255 and
    /// truncating toward zero.
    pub fn offset_region(&mut self, rect: Rect, c: usize, delta: f64) {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let v = (self.get(x, y, c) as f64 + delta).clamp(0.0, 255.0);
                self.set(x, y, c, v as u8);
            }
        }
    }

    /// Overwrite every channel of a rectangle with one value.
    pub fn fill_region(&mut self, rect: Rect, value: u8) {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                for c in 0..self.channels.count() {
                    self.set(x, y, c, value);
                }
            }
        }
    }

    /// Copy a rectangle out as `f64` samples (row-major, interleaved).
    pub(crate) fn read_region_f64(&self, rect: Rect) -> Vec<f64> {
        let nc = self.channels.count();
        let mut out = Vec::with_capacity(rect.area() * nc);
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                for c in 0..nc {
                    out.push(self.get(x, y, c) as f64);
                }
            }
        }
        out
    }

    /// Inverse of [`Raster::read_region_f64`], rounding to the nearest byte.
    pub(crate) fn write_region_f64(&mut self, rect: Rect, samples: &[f64]) {
        let nc = self.channels.count();
        debug_assert_eq!(samples.len(), rect.area() * nc);
        let mut i = 0;
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                for c in 0..nc {
                    self.set(x, y, c, samples[i].round().clamp(0.0, 255.0) as u8);
                    i += 1;
                }
            }
        }
    }
}

#[cfg(feature = "image")]
mod image_io {
    use super::{Channels, Raster};

    impl From<image::GrayImage> for Raster {
        fn from(img: image::GrayImage) -> Self {
            let (w, h) = img.dimensions();
            Raster {
                width: w as usize,
                height: h as usize,
                channels: Channels::Gray,
                data: img.into_raw(),
            }
        }
    }

    impl From<image::RgbImage> for Raster {
        fn from(img: image::RgbImage) -> Self {
            let (w, h) = img.dimensions();
            Raster {
                width: w as usize,
                height: h as usize,
                channels: Channels::Rgb,
                data: img.into_raw(),
            }
        }
    }

    impl Raster {
        /// Copy into an `image` buffer; `None` for RGB rasters or oversized dimensions.
        pub fn to_gray_image(&self) -> Option<image::GrayImage> {
            if self.channels != Channels::Gray {
                return None;
            }
            let (w, h) = (self.width.try_into().ok()?, self.height.try_into().ok()?);
            image::GrayImage::from_raw(w, h, self.data.clone())
        }

        /// Copy into an `image` buffer; `None` for grayscale rasters or oversized dimensions.
        pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
            if self.channels != Channels::Rgb {
                return None;
            }
            let (w, h) = (self.width.try_into().ok()?, self.height.try_into().ok()?);
            image::RgbImage::from_raw(w, h, self.data.clone())
        }
    }
}
