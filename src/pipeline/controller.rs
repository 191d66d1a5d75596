use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Mutex, PoisonError, RwLock, TryLockError,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    background::decode::BackgroundImage,
    background::loader::{BackgroundLoader, FsBackgroundLoader},
    background::store::BackgroundStore,
    effects::blur::blur_background_rgba8,
    effects::kernel::GaussianKernel,
    foundation::config::PipelineConfig,
    foundation::core::{FrameRgba8, FrameSize},
    foundation::error::{BackdropError, BackdropResult},
    pipeline::flight::FlightGate,
    pipeline::notify::{Notification, NotificationSink, TracingNotificationSink},
    pipeline::render_loop::RenderLoopHandle,
    render::composite::composite_foreground_in_place,
    render::surface::ScratchSurface,
    segment::model::{SegmentOpts, SegmentationBackend, SegmentationModel},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Lifecycle state of a [`BackdropPipeline`].
pub enum PipelineState {
    /// No model loaded; every frame is dropped.
    Uninitialized,
    /// Model loaded, no frame in flight.
    Ready,
    /// A frame is being processed; new frames are dropped.
    Busy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Frame counters since construction.
pub struct PipelineStats {
    /// Frames that produced output.
    pub frames_processed: u64,
    /// Frames dropped because another frame was in flight.
    pub dropped_busy: u64,
    /// Frames dropped because the pipeline was not initialized.
    pub dropped_not_ready: u64,
    /// Frames whose processing failed (error or panic in a stage).
    pub failed: u64,
    /// Frames finished after a concurrent `cleanup` and discarded.
    pub discarded_after_cleanup: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    processed: AtomicU64,
    dropped_busy: AtomicU64,
    dropped_not_ready: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            frames_processed: self.processed.load(Ordering::Relaxed),
            dropped_busy: self.dropped_busy.load(Ordering::Relaxed),
            dropped_not_ready: self.dropped_not_ready.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discarded_after_cleanup: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Real-time background replacement / blur pipeline.
///
/// Call [`initialize`](Self::initialize) once, then feed frames to
/// [`process_frame`](Self::process_frame) from a render loop. With a background set
/// the person is composited over it; without one the background is blurred.
///
/// The pipeline is `Send + Sync`. At most one frame is processed at a time; frames
/// arriving meanwhile are dropped (`None`), never queued.
pub struct BackdropPipeline {
    config: PipelineConfig,
    segment_opts: SegmentOpts,
    kernel: GaussianKernel,
    backend: Box<dyn SegmentationBackend>,
    notifier: Arc<dyn NotificationSink>,
    backgrounds: BackgroundStore,

    model: RwLock<Option<Arc<dyn SegmentationModel>>>,
    scratch: Mutex<Option<ScratchSurface>>,
    // Bumped by `cleanup` while holding the scratch lock.
    epoch: AtomicU64,
    flight: FlightGate,
    stats: StatsCounters,
    pub(crate) render_loop: Mutex<Option<RenderLoopHandle>>,
}

impl std::fmt::Debug for BackdropPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackdropPipeline")
            .field("state", &self.state())
            .field("backgrounds", &self.backgrounds)
            .field("kernel_radius", &self.kernel.radius())
            .field("stats", &self.stats())
            .finish()
    }
}

impl BackdropPipeline {
    /// Build an uninitialized pipeline.
    ///
    /// Backgrounds resolve below `config.asset_root`; notifications go to `tracing`.
    pub fn new(
        config: PipelineConfig,
        backend: Box<dyn SegmentationBackend>,
    ) -> BackdropResult<Self> {
        config.validate()?;
        let loader = Arc::new(FsBackgroundLoader::new(config.asset_root.clone()));
        Ok(Self {
            segment_opts: SegmentOpts::from_config(&config.segmentation, &config.model),
            kernel: GaussianKernel::new(config.blur.radius),
            backend,
            notifier: Arc::new(TracingNotificationSink),
            backgrounds: BackgroundStore::new(loader),
            model: RwLock::new(None),
            scratch: Mutex::new(None),
            epoch: AtomicU64::new(0),
            flight: FlightGate::new(),
            stats: StatsCounters::default(),
            render_loop: Mutex::new(None),
            config,
        })
    }

    /// Route notifications to `sink`.
    pub fn with_notifier(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifier = sink;
        self
    }

    /// Resolve background references through `loader`. Clears any installed background.
    pub fn with_background_loader(mut self, loader: Arc<dyn BackgroundLoader>) -> Self {
        self.backgrounds = BackgroundStore::new(loader);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Blur kernel built from `config.blur.radius`.
    pub fn kernel(&self) -> &GaussianKernel {
        &self.kernel
    }

    /// Load the segmentation model and allocate the scratch surface.
    ///
    /// No-op when already initialized. On failure the pipeline stays uninitialized, a
    /// retryable error [`Notification`] is emitted, and the error is returned; nothing
    /// is retried automatically.
    #[tracing::instrument(skip(self))]
    pub fn initialize(&self) -> BackdropResult<()> {
        let mut model_slot = self.model.write().unwrap_or_else(PoisonError::into_inner);
        if model_slot.is_some() {
            return Ok(());
        }

        let loaded = catch_unwind(AssertUnwindSafe(|| {
            self.backend.load_model(&self.config.model)
        }))
        .unwrap_or_else(|_| {
            Err(BackdropError::initialization(
                "segmentation backend panicked while loading the model",
            ))
        });

        match loaded {
            Ok(model) => {
                *self.scratch.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(ScratchSurface::new());
                *model_slot = Some(model);
                tracing::info!(
                    architecture = ?self.config.model.architecture,
                    output_stride = self.config.model.output_stride,
                    "segmentation model loaded"
                );
                Ok(())
            }
            Err(e) => {
                let err = if matches!(e, BackdropError::Initialization(_)) {
                    e
                } else {
                    BackdropError::initialization(e.to_string())
                };
                tracing::error!(error = %err, "failed to initialize background pipeline");
                self.notifier.notify(&Notification::initialization_failed(&err));
                Err(err)
            }
        }
    }

    /// Release the model, scratch surface and background, clear the busy flag and stop
    /// the render loop. Safe to call at any time, any number of times.
    ///
    /// A frame already in flight finishes against its own model handle and its result
    /// is discarded.
    pub fn cleanup(&self) {
        let report = self.stop_render_loop();

        let had_model = self
            .model
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        {
            let mut scratch = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
            *scratch = None;
            self.epoch.fetch_add(1, Ordering::AcqRel);
        }
        self.backgrounds.clear();
        self.flight.reset();

        tracing::debug!(had_model, render_loop = ?report, "background pipeline cleaned up");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        let loaded = match self.model.try_read() {
            Ok(slot) => slot.is_some(),
            Err(TryLockError::Poisoned(p)) => p.into_inner().is_some(),
            Err(TryLockError::WouldBlock) => false,
        };
        if !loaded {
            PipelineState::Uninitialized
        } else if self.flight.is_busy() {
            PipelineState::Busy
        } else {
            PipelineState::Ready
        }
    }

    /// Frame counters.
    pub fn stats(&self) -> PipelineStats {
        self.stats.snapshot()
    }

    /// Load `reference` as the virtual background, or clear it on `None`.
    ///
    /// Returns once the new image is decoded and installed. On error the previous
    /// background stays in effect.
    pub fn set_virtual_background(&self, reference: Option<&str>) -> BackdropResult<()> {
        self.backgrounds.set(reference)
    }

    /// Install an already-decoded background, or clear it on `None`.
    pub fn set_background_image(&self, image: Option<BackgroundImage>) {
        self.backgrounds.install(image);
    }

    /// `true` when frames take the composite path.
    pub fn has_background(&self) -> bool {
        self.backgrounds.is_set()
    }

    /// Segment `frame`, then composite it over the background or blur its background.
    ///
    /// Output is `width x height` straight RGBA8. Returns `None` when the pipeline is
    /// not initialized, another frame is in flight, or any stage fails; never panics.
    pub fn process_frame(
        &self,
        frame: &FrameRgba8,
        width: u32,
        height: u32,
    ) -> Option<FrameRgba8> {
        let Some(permit) = self.flight.try_acquire() else {
            StatsCounters::bump(&self.stats.dropped_busy);
            tracing::trace!("frame dropped: pipeline busy");
            return None;
        };

        let Some(model) = self.model_snapshot() else {
            StatsCounters::bump(&self.stats.dropped_not_ready);
            tracing::trace!("frame dropped: model not loaded");
            return None;
        };
        let Some((mut scratch, epoch)) = self.take_scratch() else {
            StatsCounters::bump(&self.stats.dropped_not_ready);
            tracing::trace!("frame dropped: scratch surface missing");
            return None;
        };
        let background = self.backgrounds.snapshot();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.render(
                model.as_ref(),
                &mut scratch,
                frame,
                width,
                height,
                background.as_deref(),
            )
        }));
        let restored = self.restore_scratch(scratch, epoch);

        match outcome {
            Ok(Ok(out)) if restored => {
                StatsCounters::bump(&self.stats.processed);
                Some(out)
            }
            Ok(Ok(_)) => {
                StatsCounters::bump(&self.stats.discarded);
                tracing::debug!(
                    ticket = permit.ticket(),
                    "frame discarded: cleanup ran mid-flight"
                );
                None
            }
            Ok(Err(e)) => {
                StatsCounters::bump(&self.stats.failed);
                tracing::warn!(error = %e, "frame dropped");
                None
            }
            Err(_) => {
                StatsCounters::bump(&self.stats.failed);
                tracing::warn!("frame dropped: a pipeline stage panicked");
                None
            }
        }
    }

    fn render(
        &self,
        model: &dyn SegmentationModel,
        scratch: &mut ScratchSurface,
        frame: &FrameRgba8,
        width: u32,
        height: u32,
        background: Option<&BackgroundImage>,
    ) -> BackdropResult<FrameRgba8> {
        let size = FrameSize::new(width, height)?;
        frame.validate()?;

        scratch.resize(size)?;
        scratch.draw_frame(frame.view())?;

        let mask = model.segment_person(scratch.view(), &self.segment_opts)?;
        if mask.size() != size {
            return Err(BackdropError::frame_processing(format!(
                "segmentation returned a {} mask for a {size} frame",
                mask.size()
            )));
        }

        let data = match background {
            Some(bg) => {
                let mut out = bg.scaled_to(size)?.as_ref().clone();
                composite_foreground_in_place(&mut out, scratch.pixels(), &mask)?;
                out
            }
            None => blur_background_rgba8(
                scratch.pixels(),
                size,
                &mask,
                &self.kernel,
                self.config.blur.parallel,
            )?,
        };

        Ok(FrameRgba8 {
            width,
            height,
            data,
        })
    }

    fn model_snapshot(&self) -> Option<Arc<dyn SegmentationModel>> {
        match self.model.try_read() {
            Ok(slot) => slot.clone(),
            Err(TryLockError::Poisoned(p)) => p.into_inner().clone(),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    // The epoch is read under the same lock `cleanup` bumps it under, so it always
    // names the lifetime the surface belongs to.
    fn take_scratch(&self) -> Option<(ScratchSurface, u64)> {
        let mut slot = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        let scratch = slot.take()?;
        Some((scratch, self.epoch.load(Ordering::Acquire)))
    }

    // Hands the surface back unless `cleanup` ran since it was taken.
    fn restore_scratch(&self, scratch: ScratchSurface, epoch: u64) -> bool {
        let mut slot = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        if self.epoch.load(Ordering::Acquire) != epoch {
            return false;
        }
        if slot.is_none() {
            *slot = Some(scratch);
        }
        true
    }
}

impl Drop for BackdropPipeline {
    fn drop(&mut self) {
        self.stop_render_loop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/controller.rs"]
mod tests;
