use image::imageops::FilterType;

use crate::foundation::{
    core::{FrameSize, FrameView},
    error::{BackdropError, BackdropResult},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Allocation counters for a [`ScratchSurface`].
pub struct SurfaceStats {
    /// Calls to [`ScratchSurface::resize`].
    pub resizes: u64,
    /// Resizes that had to grow the backing allocation.
    pub reallocations: u64,
}

/// Reusable RGBA8 drawing target owned by the pipeline.
///
/// `resize` keeps the backing allocation whenever it is large enough, so a steady
/// stream of same-sized (or shrinking) frames never allocates. Contents are not
/// meaningful across calls; every frame is drawn before it is read.
#[derive(Debug, Default)]
pub struct ScratchSurface {
    size: FrameSize,
    data: Vec<u8>,
    stats: SurfaceStats,
}

impl ScratchSurface {
    /// An empty surface; the first `resize` allocates.
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface pre-allocated for `size`.
    pub fn with_size(size: FrameSize) -> BackdropResult<Self> {
        let mut s = Self::new();
        s.resize(size)?;
        Ok(s)
    }

    /// Match the surface to `size` before drawing.
    pub fn resize(&mut self, size: FrameSize) -> BackdropResult<()> {
        let len = size.rgba_len()?;
        self.stats.resizes += 1;
        if len > self.data.capacity() {
            self.stats.reallocations += 1;
        }
        self.data.resize(len, 0);
        self.size = size;
        Ok(())
    }

    /// Current dimensions.
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Allocation counters.
    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    /// Draw `frame` stretched to the surface size (bilinear when dimensions differ).
    pub fn draw_frame(&mut self, frame: FrameView<'_>) -> BackdropResult<()> {
        if frame.data.len() != frame.size().rgba_len()? {
            return Err(BackdropError::frame_processing(
                "input frame data does not match its dimensions",
            ));
        }
        if frame.size() == self.size {
            self.data.copy_from_slice(frame.data);
            return Ok(());
        }
        let scaled = scale_rgba8(frame, self.size)?;
        self.data.copy_from_slice(&scaled);
        Ok(())
    }

    /// Surface pixels, row-major straight RGBA8.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Borrow the surface as a frame.
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.size.width,
            height: self.size.height,
            data: &self.data,
        }
    }
}

/// Resize straight RGBA8 pixels to `target` with a triangle (bilinear) filter.
pub(crate) fn scale_rgba8(src: FrameView<'_>, target: FrameSize) -> BackdropResult<Vec<u8>> {
    if src.size().is_empty() || target.is_empty() {
        return Err(BackdropError::validation(format!(
            "cannot scale {} to {target}",
            src.size()
        )));
    }
    let buf = image::ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(
        src.width,
        src.height,
        src.data,
    )
    .ok_or_else(|| BackdropError::validation("scale source does not match its dimensions"))?;
    let scaled = image::imageops::resize(&buf, target.width, target.height, FilterType::Triangle);
    Ok(scaled.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
