//! Frame Buffer Canvas
//!
//! The draw surface handed to plugins. Implements the `embedded-graphics`
//! `DrawTarget` so plugins render with its primitives, fonts and images.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;

/// A rectangular RGB888 frame buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Canvas {
    /// Create a black canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; (width as usize) * (height as usize)],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color of a single pixel, `None` outside the canvas
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x < self.width && y < self.height {
            self.pixels.get(self.index(x, y)).copied()
        } else {
            None
        }
    }

    /// All pixels, row-major
    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }

    /// Fill the whole canvas with one color
    pub fn fill(&mut self, color: Rgb888) {
        self.pixels.fill(color);
    }

    /// Whether every pixel has the given color
    pub fn is_filled_with(&self, color: Rgb888) -> bool {
        self.pixels.iter().all(|p| *p == color)
    }

    /// Pixels packed as `0x00RRGGBB`
    pub fn to_rgb_words(&self) -> Vec<u32> {
        self.pixels
            .iter()
            .map(|p| ((p.r() as u32) << 16) | ((p.g() as u32) << 8) | p.b() as u32)
            .collect()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Clip silently; plugins may draw partially off-screen while scrolling
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < self.width && y < self.height {
                let idx = self.index(x, y);
                self.pixels[idx] = color;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
