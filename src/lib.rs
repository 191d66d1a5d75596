//! Backdrop is a real-time virtual background engine for video calls.
//!
//! Every camera frame is segmented into person and background. With a virtual background
//! set, the person is composited over it; without one, the original background is
//! Gaussian-blurred while the person stays sharp.
//!
//! # Pipeline overview
//!
//! 1. **Draw**: the camera frame is drawn (and scaled if needed) onto a reusable scratch surface
//! 2. **Segment**: a [`SegmentationModel`] labels every pixel person (1) or background (0)
//! 3. **Composite** or **Blur**: foreground pixels are copied over the scaled background image,
//!    or background pixels are replaced by a blurred copy
//!
//! [`BackdropPipeline`] ties the stages together and enforces single-flight processing:
//! a frame arriving while another is being processed is dropped, never queued.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Never panics on the frame path**: `process_frame` returns `None` on any failure.
//! - **Straight-alpha RGBA8** end-to-end.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod background;
mod effects;
mod foundation;
mod pipeline;
mod render;
mod segment;

pub use background::decode::BackgroundImage;
pub use background::loader::{
    BackgroundLoader, FsBackgroundLoader, MemoryBackgroundLoader, normalize_background_ref,
};
pub use background::store::BackgroundStore;
pub use effects::blur::{blur_background_into, blur_background_rgba8};
pub use effects::kernel::GaussianKernel;
pub use foundation::config::{
    BlurConfig, DEFAULT_BLUR_RADIUS, DEFAULT_SEGMENTATION_THRESHOLD, InternalResolution,
    ModelArchitecture, ModelConfig, PipelineConfig, SegmentationConfig,
};
pub use foundation::core::{FrameRgba8, FrameSize, FrameView};
pub use foundation::error::{BackdropError, BackdropResult};
pub use pipeline::controller::{BackdropPipeline, PipelineState, PipelineStats};
pub use pipeline::notify::{
    CollectingNotificationSink, Notification, NotificationSink, Severity, TracingNotificationSink,
};
pub use pipeline::render_loop::{FrameSource, RenderLoopOpts, RenderLoopReport};
pub use render::composite::{composite_foreground, composite_foreground_in_place};
pub use render::surface::{ScratchSurface, SurfaceStats};
pub use segment::chroma::{ChromaKeyBackend, ChromaKeyConfig, ChromaKeyModel};
pub use segment::mask::{MaskLabel, SegmentationMask};
pub use segment::model::{
    BackendKind, SegmentOpts, SegmentationBackend, SegmentationModel, create_backend,
};
