/// Convenience result type used across backdrop.
pub type BackdropResult<T> = Result<T, BackdropError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum BackdropError {
    /// Invalid caller-provided data (dimensions, config values, references).
    #[error("validation error: {0}")]
    Validation(String),

    /// The segmentation model could not be loaded.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// A background image could not be fetched or decoded.
    #[error("background load error: {0}")]
    BackgroundLoad(String),

    /// A single frame could not be processed. Never escapes `process_frame`.
    #[error("frame processing error: {0}")]
    FrameProcessing(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackdropError {
    /// Build a [`BackdropError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BackdropError::Initialization`] value.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Build a [`BackdropError::BackgroundLoad`] value.
    pub fn background_load(msg: impl Into<String>) -> Self {
        Self::BackgroundLoad(msg.into())
    }

    /// Build a [`BackdropError::FrameProcessing`] value.
    pub fn frame_processing(msg: impl Into<String>) -> Self {
        Self::FrameProcessing(msg.into())
    }

    /// Build a [`BackdropError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
