use std::sync::Arc;

use crate::{
    foundation::config::{InternalResolution, ModelConfig, SegmentationConfig},
    foundation::core::FrameView,
    foundation::error::BackdropResult,
    segment::chroma::{ChromaKeyBackend, ChromaKeyConfig},
    segment::mask::SegmentationMask,
};

#[derive(Clone, Copy, Debug, PartialEq)]
/// Per-call segmentation parameters.
pub struct SegmentOpts {
    /// Foreground probability cutoff.
    pub threshold: f32,
    /// Mirror the resulting mask left-to-right.
    pub flip_horizontal: bool,
    /// Resolution hint for the model's own resize step.
    pub internal_resolution: InternalResolution,
}

impl SegmentOpts {
    /// Options used by the pipeline: configured threshold, no mirroring, the model's
    /// load-time resolution.
    pub fn from_config(seg: &SegmentationConfig, model: &ModelConfig) -> Self {
        Self {
            threshold: seg.threshold,
            flip_horizontal: false,
            internal_resolution: model.internal_resolution,
        }
    }
}

/// A loaded person-segmentation model.
///
/// Implementations must return a mask with exactly `frame.width * frame.height` entries.
/// The pipeline may call `segment_person` from any thread, one frame at a time.
pub trait SegmentationModel: Send + Sync {
    /// Classify every pixel of `frame` as person or background.
    fn segment_person(
        &self,
        frame: FrameView<'_>,
        opts: &SegmentOpts,
    ) -> BackdropResult<SegmentationMask>;
}

/// Loads [`SegmentationModel`]s. Called once per successful `initialize`.
pub trait SegmentationBackend: Send + Sync {
    /// Load a model with the given speed/accuracy configuration.
    fn load_model(&self, config: &ModelConfig) -> BackdropResult<Arc<dyn SegmentationModel>>;
}

#[derive(Clone, Debug, PartialEq)]
/// Built-in segmentation backends.
pub enum BackendKind {
    /// Key out a solid backdrop color; see [`ChromaKeyBackend`].
    ChromaKey(ChromaKeyConfig),
}

/// Construct a built-in backend.
pub fn create_backend(kind: BackendKind) -> Box<dyn SegmentationBackend> {
    match kind {
        BackendKind::ChromaKey(cfg) => Box::new(ChromaKeyBackend::new(cfg)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/segment/model.rs"]
mod tests;
