//! Core types for PDF rendering

use std::fmt;

/// Pixel layout of a rendered bitmap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 1 byte per pixel
    Gray8,
    /// 3 bytes per pixel: R, G, B
    Rgb8,
    /// 4 bytes per pixel: R, G, B, A
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Decoded page bitmap, tightly packed (no row padding).
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    /// Solid white bitmap, handy for synthetic pages
    #[must_use]
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.channels();
        Self::new(width, height, format, vec![0xFF; len])
    }

    /// True if the buffer holds exactly `width * height` pixels and is not empty
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let expected = self.width as usize * self.height as usize * self.format.channels();
        expected > 0 && self.pixels.len() == expected
    }

    /// RGB triple at the given pixel. Gray is expanded, alpha is composited
    /// over white.
    #[must_use]
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let n = self.format.channels();
        let idx = (y as usize * self.width as usize + x as usize) * n;
        let px = &self.pixels[idx..idx + n];
        match self.format {
            PixelFormat::Gray8 => [px[0], px[0], px[0]],
            PixelFormat::Rgb8 => [px[0], px[1], px[2]],
            PixelFormat::Rgba8 => {
                let a = u16::from(px[3]);
                let over_white = |c: u8| ((u16::from(c) * a + 255 * (255 - a)) / 255) as u8;
                [over_white(px[0]), over_white(px[1]), over_white(px[2])]
            }
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Link target type
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    Internal { page: usize },
    External { uri: String },
}

/// Rectangle in page coordinates (points at zoom 1.0)
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PageRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageRect {
    #[must_use]
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Clickable region on a page
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PageLink {
    pub rect: PageRect,
    pub target: LinkTarget,
}

/// Basic facts about an opened document
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub encrypted: bool,
}
