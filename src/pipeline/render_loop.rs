use std::{
    sync::{
        Arc, PoisonError, Weak,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    foundation::core::FrameRgba8,
    foundation::error::{BackdropError, BackdropResult},
    pipeline::controller::BackdropPipeline,
};

/// Produces camera frames for the render loop.
///
/// `None` means no frame is available this tick; the loop keeps running.
pub trait FrameSource: Send + 'static {
    /// Pull the next frame, if any.
    fn next_frame(&mut self) -> Option<FrameRgba8>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Option<FrameRgba8> + Send + 'static,
{
    fn next_frame(&mut self) -> Option<FrameRgba8> {
        self()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Render loop pacing and output size.
pub struct RenderLoopOpts {
    /// Target ticks per second. Must be finite and positive.
    pub fps: f64,
    /// Output width handed to `process_frame`.
    pub width: u32,
    /// Output height handed to `process_frame`.
    pub height: u32,
}

impl RenderLoopOpts {
    fn frame_interval(&self) -> BackdropResult<Duration> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(BackdropError::validation(format!(
                "render loop fps must be finite and > 0, got {}",
                self.fps
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(BackdropError::validation(format!(
                "render loop size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(Duration::from_secs_f64(1.0 / self.fps))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// What a finished render loop did.
pub struct RenderLoopReport {
    /// Frames obtained from the source.
    pub frames_pulled: u64,
    /// Frames handed to the sink.
    pub frames_emitted: u64,
    /// Frames the pipeline returned `None` for.
    pub frames_dropped: u64,
}

#[derive(Debug)]
pub(crate) struct RenderLoopHandle {
    stop: Arc<AtomicBool>,
    join: JoinHandle<RenderLoopReport>,
}

impl BackdropPipeline {
    /// Spawn a thread that pulls frames from `source`, runs them through
    /// [`process_frame`](Self::process_frame) and hands results to `sink`.
    ///
    /// The thread holds only a weak reference; it exits when the pipeline is dropped,
    /// [`stop_render_loop`](Self::stop_render_loop) or [`cleanup`](Self::cleanup) is
    /// called. Errors when a loop is already running.
    pub fn start_render_loop<S, K>(
        self: &Arc<Self>,
        mut source: S,
        mut sink: K,
        opts: RenderLoopOpts,
    ) -> BackdropResult<()>
    where
        S: FrameSource,
        K: FnMut(FrameRgba8) + Send + 'static,
    {
        let interval = opts.frame_interval()?;
        let mut slot = self
            .render_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.join.is_finished()) {
            return Err(BackdropError::validation("render loop already running"));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let pipeline: Weak<Self> = Arc::downgrade(self);

        let join = thread::Builder::new()
            .name("backdrop-render".to_string())
            .spawn(move || {
                let mut report = RenderLoopReport::default();
                let mut next_tick = Instant::now();
                while !stop_flag.load(Ordering::Relaxed) {
                    let Some(pipeline) = pipeline.upgrade() else {
                        break;
                    };
                    if let Some(frame) = source.next_frame() {
                        report.frames_pulled += 1;
                        match pipeline.process_frame(&frame, opts.width, opts.height) {
                            Some(out) => {
                                report.frames_emitted += 1;
                                sink(out);
                            }
                            None => report.frames_dropped += 1,
                        }
                    }
                    drop(pipeline);

                    next_tick += interval;
                    let now = Instant::now();
                    if next_tick > now {
                        thread::sleep(next_tick - now);
                    } else {
                        // Fell behind; don't try to catch up with a burst.
                        next_tick = now;
                    }
                }
                tracing::debug!(?report, "render loop exited");
                report
            })
            .map_err(|e| anyhow::anyhow!("failed to spawn render loop thread: {e}"))?;

        tracing::info!(
            fps = opts.fps,
            width = opts.width,
            height = opts.height,
            "render loop started"
        );
        *slot = Some(RenderLoopHandle { stop, join });
        Ok(())
    }

    /// Stop the render loop and wait for it to exit. `None` when no loop was running.
    ///
    /// Called from the loop thread itself (e.g. from the sink), the loop is signalled
    /// but not joined and no report is returned.
    pub fn stop_render_loop(&self) -> Option<RenderLoopReport> {
        let handle = self
            .render_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        handle.stop.store(true, Ordering::Relaxed);
        if handle.join.thread().id() == thread::current().id() {
            return None;
        }
        match handle.join.join() {
            Ok(report) => Some(report),
            Err(_) => {
                tracing::warn!("render loop thread panicked");
                None
            }
        }
    }

    /// `true` while a render loop thread is alive.
    pub fn render_loop_running(&self) -> bool {
        self.render_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.join.is_finished())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/render_loop.rs"]
mod tests;
