//! Core types shared by the controller and the render worker

/// Page geometry at a given scale.
///
/// `width` and `height` are in engine units (PDF points) multiplied by the
/// scale. The pixel size of the surface a page is rendered into is the
/// floored value of both, never smaller than one pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub fn new(scale: f32, width: f32, height: f32) -> Self {
        Self {
            scale,
            width,
            height,
        }
    }

    /// Viewport of a page whose natural (scale 1.0) size is known
    #[must_use]
    pub fn scaled(natural_width: f32, natural_height: f32, scale: f32) -> Self {
        Self::new(scale, natural_width * scale, natural_height * scale)
    }

    /// Pixel dimensions of a surface holding this viewport
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        (to_pixels(self.width), to_pixels(self.height))
    }
}

fn to_pixels(value: f32) -> u32 {
    if value.is_finite() && value >= 1.0 {
        value.floor() as u32
    } else {
        1
    }
}

/// RGB drawing surface a page is rasterized into.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Surface {
    /// Raw RGB pixel data (3 bytes per pixel: R, G, B)
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Surface {
    pub const BYTES_PER_PIXEL: usize = 3;

    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self::default();
        surface.resize(width, height);
        surface
    }

    /// Resize to the given pixel dimensions, clearing to white
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize(width as usize * height as usize * Self::BYTES_PER_PIXEL, 0xFF);
    }

    /// Resize to the pixel size of a viewport
    pub fn fit_to(&mut self, viewport: &Viewport) {
        let (width, height) = viewport.pixel_size();
        self.resize(width, height);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGB value at (x, y), or None outside the surface
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let px = self.pixels.get(offset..offset + Self::BYTES_PER_PIXEL)?;
        Some((px[0], px[1], px[2]))
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Terminal cell dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSize {
    pub width: u16,
    pub height: u16,
}

impl CellSize {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Convert a cell column/row position to pixel units
    #[must_use]
    pub fn to_pixels(self, column: u16, row: u16) -> (f32, f32) {
        (
            f32::from(column) * f32::from(self.width),
            f32::from(row) * f32::from(self.height),
        )
    }

    /// Width in pixel units of an area `columns` cells wide
    #[must_use]
    pub fn width_px(self, columns: u16) -> f32 {
        f32::from(columns) * f32::from(self.width)
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::new(8, 16)
    }
}

/// Metadata of the loaded document as seen by the controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Reference the document was opened from
    pub reference: String,
    pub page_count: usize,
    pub title: Option<String>,
}
