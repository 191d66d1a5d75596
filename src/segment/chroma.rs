use std::sync::Arc;

use crate::{
    foundation::config::ModelConfig,
    foundation::core::FrameView,
    foundation::error::{BackdropError, BackdropResult},
    segment::mask::SegmentationMask,
    segment::model::{SegmentOpts, SegmentationBackend, SegmentationModel},
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Chroma-key parameters.
///
/// Distances are Euclidean RGB distances normalized to `[0, 1]`. A pixel closer than
/// `inner` to the key has person probability 0, one farther than `outer` has 1, and
/// the band in between ramps linearly.
pub struct ChromaKeyConfig {
    /// Backdrop color (straight RGB).
    #[serde(default = "default_key_rgb")]
    pub key_rgb: [u8; 3],
    /// Normalized distance below which a pixel is pure backdrop.
    #[serde(default = "default_inner")]
    pub inner: f32,
    /// Normalized distance above which a pixel is pure person.
    #[serde(default = "default_outer")]
    pub outer: f32,
}

impl Default for ChromaKeyConfig {
    fn default() -> Self {
        Self {
            key_rgb: default_key_rgb(),
            inner: default_inner(),
            outer: default_outer(),
        }
    }
}

fn default_key_rgb() -> [u8; 3] {
    [0, 177, 64]
}

fn default_inner() -> f32 {
    0.15
}

fn default_outer() -> f32 {
    0.35
}

impl ChromaKeyConfig {
    /// Check value ranges.
    pub fn validate(&self) -> BackdropResult<()> {
        let ok = self.inner.is_finite()
            && self.outer.is_finite()
            && (0.0..=1.0).contains(&self.inner)
            && (0.0..=1.0).contains(&self.outer)
            && self.inner < self.outer;
        if !ok {
            return Err(BackdropError::validation(format!(
                "chroma key needs 0 <= inner < outer <= 1, got inner={} outer={}",
                self.inner, self.outer
            )));
        }
        Ok(())
    }
}

/// Backend producing [`ChromaKeyModel`]s. Works without any ML runtime, which makes it
/// the default for green-screen setups and for exercising the pipeline.
#[derive(Clone, Debug)]
pub struct ChromaKeyBackend {
    config: ChromaKeyConfig,
}

impl ChromaKeyBackend {
    /// Backend keyed on `config`.
    pub fn new(config: ChromaKeyConfig) -> Self {
        Self { config }
    }
}

impl SegmentationBackend for ChromaKeyBackend {
    fn load_model(&self, config: &ModelConfig) -> BackdropResult<Arc<dyn SegmentationModel>> {
        config.validate().map_err(|e| {
            BackdropError::initialization(format!("chroma key model config rejected: {e}"))
        })?;
        self.config.validate().map_err(|e| {
            BackdropError::initialization(format!("chroma key parameters rejected: {e}"))
        })?;
        tracing::debug!(key = ?self.config.key_rgb, "chroma key model loaded");
        Ok(Arc::new(ChromaKeyModel {
            config: self.config,
        }))
    }
}

/// Person segmentation by distance from a backdrop color.
#[derive(Clone, Debug)]
pub struct ChromaKeyModel {
    config: ChromaKeyConfig,
}

impl ChromaKeyModel {
    /// Person probability for one straight-alpha pixel.
    pub fn probability(&self, px: [u8; 4]) -> f32 {
        if px[3] == 0 {
            return 0.0;
        }
        let [kr, kg, kb] = self.config.key_rgb;
        let dr = f32::from(px[0]) - f32::from(kr);
        let dg = f32::from(px[1]) - f32::from(kg);
        let db = f32::from(px[2]) - f32::from(kb);
        let dist = (dr * dr + dg * dg + db * db).sqrt() / (255.0 * 3f32.sqrt());

        let ChromaKeyConfig { inner, outer, .. } = self.config;
        ((dist - inner) / (outer - inner)).clamp(0.0, 1.0)
    }
}

impl SegmentationModel for ChromaKeyModel {
    fn segment_person(
        &self,
        frame: FrameView<'_>,
        opts: &SegmentOpts,
    ) -> BackdropResult<SegmentationMask> {
        let expected = frame.size().rgba_len()?;
        if frame.data.len() != expected {
            return Err(BackdropError::frame_processing(
                "chroma key expects frame data matching width*height*4",
            ));
        }

        let probs: Vec<f32> = frame.pixels().map(|px| self.probability(px)).collect();
        let mut mask =
            SegmentationMask::from_probabilities(frame.width, frame.height, &probs, opts.threshold)?;
        if opts.flip_horizontal {
            mask.flip_horizontal();
        }
        Ok(mask)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/segment/chroma.rs"]
mod tests;
