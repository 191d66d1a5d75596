use std::path::PathBuf;

use crate::foundation::error::{BackdropError, BackdropResult};

/// Default foreground probability above which a pixel counts as person.
pub const DEFAULT_SEGMENTATION_THRESHOLD: f32 = 0.7;
/// Default blur radius in pixels.
pub const DEFAULT_BLUR_RADIUS: u32 = 10;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Complete pipeline configuration.
///
/// Every field has a default, so `{}` is a valid JSON config.
pub struct PipelineConfig {
    /// Segmentation model load parameters (speed/accuracy tradeoff).
    #[serde(default)]
    pub model: ModelConfig,
    /// Per-frame segmentation parameters.
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    /// Blur-path parameters.
    #[serde(default)]
    pub blur: BlurConfig,
    /// Filesystem root used to resolve background references.
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            segmentation: SegmentationConfig::default(),
            blur: BlurConfig::default(),
            asset_root: default_asset_root(),
        }
    }
}

fn default_asset_root() -> PathBuf {
    PathBuf::from(".")
}

impl PipelineConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(s: &str) -> BackdropResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| BackdropError::serde(format!("pipeline config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl Into<PathBuf>) -> BackdropResult<Self> {
        use anyhow::Context;

        let path = path.into();
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read pipeline config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> BackdropResult<()> {
        self.model.validate()?;
        self.segmentation.validate()?;
        self.blur.validate()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Backbone used by the person-segmentation network.
pub enum ModelArchitecture {
    /// Lightweight backbone; the realtime default.
    #[default]
    MobileNetV1,
    /// Heavier, more accurate backbone.
    ResNet50,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Resolution the model resizes frames to before inference.
pub enum InternalResolution {
    /// Quarter resolution.
    Low,
    /// Half resolution.
    #[default]
    Medium,
    /// Three-quarter resolution.
    High,
    /// Full resolution.
    Full,
}

impl InternalResolution {
    /// Scale factor applied to the input frame.
    pub fn scale(self) -> f32 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Full => 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Parameters handed to [`crate::SegmentationBackend::load_model`].
pub struct ModelConfig {
    /// Network backbone.
    #[serde(default)]
    pub architecture: ModelArchitecture,
    /// Output stride (8, 16 or 32). Larger is faster and coarser.
    #[serde(default = "default_output_stride")]
    pub output_stride: u32,
    /// Depth multiplier for MobileNet (0.5, 0.75 or 1.0).
    #[serde(default = "default_multiplier")]
    pub multiplier: f32,
    /// Bytes per weight (1, 2 or 4).
    #[serde(default = "default_quant_bytes")]
    pub quant_bytes: u8,
    /// Inference resolution.
    #[serde(default)]
    pub internal_resolution: InternalResolution,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            architecture: ModelArchitecture::MobileNetV1,
            output_stride: default_output_stride(),
            multiplier: default_multiplier(),
            quant_bytes: default_quant_bytes(),
            internal_resolution: InternalResolution::Medium,
        }
    }
}

fn default_output_stride() -> u32 {
    16
}

fn default_multiplier() -> f32 {
    0.75
}

fn default_quant_bytes() -> u8 {
    2
}

impl ModelConfig {
    /// Check value ranges.
    pub fn validate(&self) -> BackdropResult<()> {
        if ![8, 16, 32].contains(&self.output_stride) {
            return Err(BackdropError::validation(format!(
                "model output_stride must be 8, 16 or 32, got {}",
                self.output_stride
            )));
        }
        if ![1, 2, 4].contains(&self.quant_bytes) {
            return Err(BackdropError::validation(format!(
                "model quant_bytes must be 1, 2 or 4, got {}",
                self.quant_bytes
            )));
        }
        if self.architecture == ModelArchitecture::MobileNetV1
            && ![0.5, 0.75, 1.0].contains(&self.multiplier)
        {
            return Err(BackdropError::validation(format!(
                "mobilenet multiplier must be 0.5, 0.75 or 1.0, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// Per-frame segmentation parameters.
///
/// Masks are never mirrored: the pipeline composites in camera orientation.
pub struct SegmentationConfig {
    /// Foreground probability cutoff in `[0, 1]`.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SEGMENTATION_THRESHOLD,
        }
    }
}

fn default_threshold() -> f32 {
    DEFAULT_SEGMENTATION_THRESHOLD
}

impl SegmentationConfig {
    /// Check value ranges.
    pub fn validate(&self) -> BackdropResult<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(BackdropError::validation(
                "segmentation threshold must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Blur-path parameters.
pub struct BlurConfig {
    /// Kernel radius in pixels; sigma is `radius / 3`.
    #[serde(default = "default_blur_radius")]
    pub radius: u32,
    /// Split the convolution across rayon worker threads.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BLUR_RADIUS,
            parallel: true,
        }
    }
}

fn default_blur_radius() -> u32 {
    DEFAULT_BLUR_RADIUS
}

fn default_parallel() -> bool {
    true
}

impl BlurConfig {
    /// Upper bound for `radius`; larger kernels are never useful for a live feed.
    pub const MAX_RADIUS: u32 = 128;

    /// Check value ranges.
    pub fn validate(&self) -> BackdropResult<()> {
        if self.radius > Self::MAX_RADIUS {
            return Err(BackdropError::validation(format!(
                "blur radius must be <= {}, got {}",
                Self::MAX_RADIUS,
                self.radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
