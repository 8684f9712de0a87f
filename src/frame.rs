//! Frame buffers as delivered by the capture side.
//!
//! Frames keep the capture's channel order (blue, green, red) all the way
//! through cropping and sampling. Only the pixel mapper converts to RGB.

use std::fmt;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{GlowError, Result};

/// A single sample in capture channel order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bgr {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Bgr {
    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    /// Same color as an `image` pixel, for display.
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in pixel coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= u64::from(width) && self.bottom() <= u64::from(height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.x, self.y
        )
    }
}

/// Packed 3-channel 8-bit image, rows top to bottom, BGR per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if data.len() != expected {
            return Err(GlowError::InvalidFrame(format!(
                "frame of {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, color: Bgr) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * Self::CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&[color.b, color.g, color.r]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Converts a decoded RGB image into capture channel order.
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let data = image
            .pixels()
            .flat_map(|Rgb([r, g, b])| [*b, *g, *r])
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            data,
        }
    }

    /// Takes a packed RGB buffer of the given size and reorders it in place.
    pub fn from_rgb_raw(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self> {
        for pixel in data.chunks_exact_mut(Self::CHANNELS) {
            pixel.swap(0, 2);
        }
        Self::from_raw(width, height, data)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| self.pixel(x, y).to_rgb())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * Self::CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> Bgr {
        let i = self.offset(x, y);
        Bgr::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Bgr) {
        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&[color.b, color.g, color.r]);
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Bgr> + '_ {
        self.data
            .chunks_exact(Self::CHANNELS)
            .map(|p| Bgr::new(p[0], p[1], p[2]))
    }

    /// Copies out the pixels under `rect`.
    ///
    /// Fails with [`GlowError::FrameTooSmall`] when `rect` reaches past the
    /// frame's right or bottom edge.
    pub fn crop(&self, rect: &Rect) -> Result<Frame> {
        if !rect.fits_within(self.width, self.height) {
            return Err(GlowError::FrameTooSmall {
                crop: *rect,
                width: self.width,
                height: self.height,
            });
        }
        let row_bytes = rect.width as usize * Self::CHANNELS;
        let mut data = Vec::with_capacity(row_bytes * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = self.offset(rect.x, y);
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Ok(Frame {
            width: rect.width,
            height: rect.height,
            data,
        })
    }
}
