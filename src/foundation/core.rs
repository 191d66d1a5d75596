use crate::foundation::error::{BackdropError, BackdropResult};

/// Pixel dimensions of a frame, surface or mask.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Build a non-empty size.
    pub fn new(width: u32, height: u32) -> BackdropResult<Self> {
        if width == 0 || height == 0 {
            return Err(BackdropError::validation(format!(
                "frame size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels (`width * height`), overflow-checked.
    pub fn pixel_count(self) -> BackdropResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or_else(|| BackdropError::validation("frame pixel count overflow"))
    }

    /// Length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> BackdropResult<usize> {
        self.pixel_count()?
            .checked_mul(4)
            .ok_or_else(|| BackdropError::validation("frame buffer size overflow"))
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Straight-alpha RGBA8 pixel buffer, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba8 {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl FrameRgba8 {
    /// Wrap `data`, checking that it matches `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> BackdropResult<Self> {
        let frame = Self {
            width,
            height,
            data,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// A frame filled with a single straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let n = (width as usize) * (height as usize);
        Self {
            width,
            height,
            data: rgba.repeat(n),
        }
    }

    /// Dimensions of this frame.
    pub fn size(&self) -> FrameSize {
        FrameSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Check the buffer length against the declared dimensions.
    pub fn validate(&self) -> BackdropResult<()> {
        let expected = self.size().rgba_len()?;
        if self.data.len() != expected {
            return Err(BackdropError::validation(format!(
                "rgba8 buffer for {} must be {expected} bytes, got {}",
                self.size(),
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Read one pixel. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Borrow as a [`FrameView`].
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Convert into an `image` crate buffer without copying.
    pub fn into_image(self) -> BackdropResult<image::RgbaImage> {
        let size = self.size();
        image::RgbaImage::from_raw(self.width, self.height, self.data).ok_or_else(|| {
            BackdropError::validation(format!("rgba8 buffer does not match {size}"))
        })
    }
}

impl From<image::RgbaImage> for FrameRgba8 {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

/// Borrowed straight-alpha RGBA8 pixels; what segmentation models read.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: &'a [u8],
}

impl FrameView<'_> {
    /// Dimensions of the viewed pixels.
    pub fn size(&self) -> FrameSize {
        FrameSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Iterate pixels as `[r, g, b, a]` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data.chunks_exact(4).map(|px| [px[0], px[1], px[2], px[3]])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
