use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;

use crate::{
    foundation::core::{FrameRgba8, FrameSize, FrameView},
    foundation::error::{BackdropError, BackdropResult},
    render::surface::scale_rgba8,
};

#[derive(Debug)]
struct ScaledBackground {
    size: FrameSize,
    rgba: Arc<Vec<u8>>,
}

/// Decoded virtual background in straight RGBA8.
///
/// Keeps the most recent resize result, so a stream of same-sized frames scales the
/// image once.
#[derive(Debug)]
pub struct BackgroundImage {
    reference: String,
    size: FrameSize,
    rgba: Arc<Vec<u8>>,
    scaled: Mutex<Option<ScaledBackground>>,
}

impl BackgroundImage {
    /// Decode encoded image bytes (PNG, JPEG, ...).
    pub fn decode(reference: impl Into<String>, bytes: &[u8]) -> BackdropResult<Self> {
        let reference = reference.into();
        let dyn_img = image::load_from_memory(bytes)
            .with_context(|| format!("decode background '{reference}'"))?;
        Self::from_frame(reference, FrameRgba8::from(dyn_img.to_rgba8()))
    }

    /// Use already-decoded pixels as a background.
    pub fn from_frame(reference: impl Into<String>, frame: FrameRgba8) -> BackdropResult<Self> {
        frame.validate()?;
        let size = frame.size();
        if size.is_empty() {
            return Err(BackdropError::validation("background image has zero area"));
        }
        Ok(Self {
            reference: reference.into(),
            size,
            rgba: Arc::new(frame.data),
            scaled: Mutex::new(None),
        })
    }

    /// The reference this image was loaded from.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Native dimensions.
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Native pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.rgba
    }

    /// Pixels stretched to `target` (bilinear), served from cache when possible.
    pub fn scaled_to(&self, target: FrameSize) -> BackdropResult<Arc<Vec<u8>>> {
        if target == self.size {
            return Ok(Arc::clone(&self.rgba));
        }

        let mut slot = self.scaled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = slot.as_ref()
            && cached.size == target
        {
            return Ok(Arc::clone(&cached.rgba));
        }

        let view = FrameView {
            width: self.size.width,
            height: self.size.height,
            data: &self.rgba,
        };
        let rgba = Arc::new(scale_rgba8(view, target)?);
        *slot = Some(ScaledBackground {
            size: target,
            rgba: Arc::clone(&rgba),
        });
        Ok(rgba)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/background/decode.rs"]
mod tests;
