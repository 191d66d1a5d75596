use crate::foundation::{
    core::FrameSize,
    error::{BackdropError, BackdropResult},
};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Per-pixel classification.
pub enum MaskLabel {
    /// Not part of a person; replaced or blurred.
    Background = 0,
    /// Part of a person; always kept from the input frame.
    Foreground = 1,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Binary person mask for one frame, row-major, one byte per pixel (`0` or `1`).
pub struct SegmentationMask {
    width: u32,
    height: u32,
    labels: Vec<u8>,
}

impl SegmentationMask {
    /// Wrap raw `0|1` labels. Any other value is rejected.
    pub fn new(width: u32, height: u32, labels: Vec<u8>) -> BackdropResult<Self> {
        let expected = FrameSize { width, height }.pixel_count()?;
        if labels.len() != expected {
            return Err(BackdropError::validation(format!(
                "segmentation mask for {width}x{height} must have {expected} entries, got {}",
                labels.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&v| v > 1) {
            return Err(BackdropError::validation(format!(
                "segmentation mask entries must be 0 or 1, got {bad}"
            )));
        }
        Ok(Self {
            width,
            height,
            labels,
        })
    }

    /// A mask with every pixel set to `label`.
    pub fn filled(width: u32, height: u32, label: MaskLabel) -> Self {
        let n = (width as usize) * (height as usize);
        Self {
            width,
            height,
            labels: vec![label as u8; n],
        }
    }

    /// Build from typed labels.
    pub fn from_labels(width: u32, height: u32, labels: &[MaskLabel]) -> BackdropResult<Self> {
        Self::new(width, height, labels.iter().map(|&l| l as u8).collect())
    }

    /// Binarize per-pixel foreground probabilities: strictly above `threshold` is foreground.
    pub fn from_probabilities(
        width: u32,
        height: u32,
        probabilities: &[f32],
        threshold: f32,
    ) -> BackdropResult<Self> {
        let labels = probabilities
            .iter()
            .map(|&p| u8::from(p > threshold))
            .collect();
        Self::new(width, height, labels)
    }

    /// Mirror the mask left-to-right in place.
    pub fn flip_horizontal(&mut self) {
        let w = self.width as usize;
        if w == 0 {
            return;
        }
        for row in self.labels.chunks_exact_mut(w) {
            row.reverse();
        }
    }

    /// Dimensions of the mask.
    pub fn size(&self) -> FrameSize {
        FrameSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Number of entries (`width * height`).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// `true` for a zero-area mask.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Raw `0|1` labels.
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Label at pixel index `idx`.
    pub fn label(&self, idx: usize) -> MaskLabel {
        if self.labels[idx] == 0 {
            MaskLabel::Background
        } else {
            MaskLabel::Foreground
        }
    }

    /// `true` when pixel index `idx` is foreground.
    pub fn is_foreground(&self, idx: usize) -> bool {
        self.labels[idx] != 0
    }

    /// Count of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.labels.iter().filter(|&&v| v != 0).count()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/segment/mask.rs"]
mod tests;
