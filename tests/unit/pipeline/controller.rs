use super::*;
use crate::{
    background::loader::MemoryBackgroundLoader,
    foundation::config::ModelConfig,
    foundation::core::FrameView,
    pipeline::notify::{CollectingNotificationSink, Severity},
    segment::mask::{MaskLabel, SegmentationMask},
};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

/// Foreground = pixels with a non-zero red channel.
struct RedIsPerson;

impl SegmentationModel for RedIsPerson {
    fn segment_person(
        &self,
        frame: FrameView<'_>,
        _opts: &SegmentOpts,
    ) -> BackdropResult<SegmentationMask> {
        let labels: Vec<u8> = frame.pixels().map(|px| u8::from(px[0] > 0)).collect();
        SegmentationMask::new(frame.width, frame.height, labels)
    }
}

struct FixedBackend(Arc<dyn SegmentationModel>);

impl SegmentationBackend for FixedBackend {
    fn load_model(&self, _config: &ModelConfig) -> BackdropResult<Arc<dyn SegmentationModel>> {
        Ok(Arc::clone(&self.0))
    }
}

struct FailingBackend;

impl SegmentationBackend for FailingBackend {
    fn load_model(&self, _config: &ModelConfig) -> BackdropResult<Arc<dyn SegmentationModel>> {
        Err(BackdropError::initialization("weights missing"))
    }
}

struct PanickingBackend;

impl SegmentationBackend for PanickingBackend {
    fn load_model(&self, _config: &ModelConfig) -> BackdropResult<Arc<dyn SegmentationModel>> {
        panic!("loader exploded")
    }
}

struct WrongSizeMask;

impl SegmentationModel for WrongSizeMask {
    fn segment_person(
        &self,
        _frame: FrameView<'_>,
        _opts: &SegmentOpts,
    ) -> BackdropResult<SegmentationMask> {
        Ok(SegmentationMask::filled(1, 1, MaskLabel::Foreground))
    }
}

struct PanickingModel;

impl SegmentationModel for PanickingModel {
    fn segment_person(
        &self,
        _frame: FrameView<'_>,
        _opts: &SegmentOpts,
    ) -> BackdropResult<SegmentationMask> {
        panic!("inference exploded")
    }
}

fn pipeline_with(model: Arc<dyn SegmentationModel>) -> BackdropPipeline {
    BackdropPipeline::new(PipelineConfig::default(), Box::new(FixedBackend(model))).unwrap()
}

fn quadrant_frame() -> FrameRgba8 {
    // Left half red (person), right half blue.
    let mut data = Vec::new();
    for _y in 0..4 {
        for x in 0..4 {
            data.extend_from_slice(if x < 2 { &RED } else { &BLUE });
        }
    }
    FrameRgba8::new(4, 4, data).unwrap()
}

#[test]
fn frames_are_dropped_before_initialize() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    assert_eq!(p.state(), PipelineState::Uninitialized);
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_none());
    assert_eq!(p.stats().dropped_not_ready, 1);
    assert!(!p.flight.is_busy());
}

#[test]
fn initialize_is_idempotent() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();
    p.initialize().unwrap();
    assert_eq!(p.state(), PipelineState::Ready);
}

#[test]
fn initialize_failure_notifies_and_stays_uninitialized() {
    let sink = Arc::new(CollectingNotificationSink::new());
    let p = BackdropPipeline::new(PipelineConfig::default(), Box::new(FailingBackend))
        .unwrap()
        .with_notifier(sink.clone());

    let err = p.initialize().unwrap_err();
    assert!(matches!(err, BackdropError::Initialization(_)));
    assert_eq!(p.state(), PipelineState::Uninitialized);

    let got = sink.drain();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].severity, Severity::Error);
    assert!(got[0].retryable);
    assert!(got[0].description.contains("weights missing"));
}

#[test]
fn panicking_backend_becomes_initialization_error() {
    let sink = Arc::new(CollectingNotificationSink::new());
    let p = BackdropPipeline::new(PipelineConfig::default(), Box::new(PanickingBackend))
        .unwrap()
        .with_notifier(sink.clone());
    assert!(matches!(
        p.initialize(),
        Err(BackdropError::Initialization(_))
    ));
    assert_eq!(sink.len(), 1);
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let mut cfg = PipelineConfig::default();
    cfg.segmentation.threshold = 2.0;
    assert!(BackdropPipeline::new(cfg, Box::new(FailingBackend)).is_err());
}

#[test]
fn composite_path_copies_person_over_background() {
    let loader = MemoryBackgroundLoader::new();
    let p = pipeline_with(Arc::new(RedIsPerson)).with_background_loader(Arc::new(loader));
    p.initialize().unwrap();

    let green = [0u8, 255, 0, 255];
    let bg = BackgroundImage::from_frame("green", FrameRgba8::solid(4, 4, green)).unwrap();
    p.set_background_image(Some(bg));
    assert!(p.has_background());

    let out = p.process_frame(&quadrant_frame(), 4, 4).unwrap();
    for y in 0..4 {
        for x in 0..4 {
            let expected = if x < 2 { RED } else { green };
            assert_eq!(out.pixel(x, y), expected, "pixel ({x},{y})");
        }
    }
    assert_eq!(p.stats().frames_processed, 1);
    assert_eq!(p.state(), PipelineState::Ready);
}

#[test]
fn blur_path_keeps_person_pixels_exact() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();

    let frame = quadrant_frame();
    let out = p.process_frame(&frame, 4, 4).unwrap();
    assert_eq!((out.width, out.height), (4, 4));
    for y in 0..4 {
        for x in 0..2 {
            assert_eq!(out.pixel(x, y), RED);
        }
        // Background pixels next to the person pick up some red.
        assert!(out.pixel(2, y)[0] > 0);
        assert_eq!(out.pixel(2, y)[3], 255);
    }
}

#[test]
fn frames_are_scaled_to_requested_size() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();
    let out = p
        .process_frame(&FrameRgba8::solid(8, 6, RED), 4, 3)
        .unwrap();
    assert_eq!((out.width, out.height), (4, 3));
    assert_eq!(out.data.len(), 4 * 3 * 4);
    assert!(out.view().pixels().all(|px| px == RED));
}

#[test]
fn zero_output_size_and_malformed_frames_are_dropped() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();
    assert!(p.process_frame(&quadrant_frame(), 0, 4).is_none());

    let broken = FrameRgba8 {
        width: 4,
        height: 4,
        data: vec![0; 7],
    };
    assert!(p.process_frame(&broken, 4, 4).is_none());
    assert_eq!(p.stats().failed, 2);
    assert_eq!(p.state(), PipelineState::Ready);

    // Pipeline still works afterwards.
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_some());
}

#[test]
fn wrong_mask_size_is_a_failed_frame() {
    let p = pipeline_with(Arc::new(WrongSizeMask));
    p.initialize().unwrap();
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_none());
    assert_eq!(p.stats().failed, 1);
}

#[test]
fn model_panic_is_contained() {
    let p = pipeline_with(Arc::new(PanickingModel));
    p.initialize().unwrap();
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_none());
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_none());
    assert_eq!(p.stats().failed, 2);
    assert!(!p.flight.is_busy());
}

#[test]
fn frame_is_dropped_while_another_is_in_flight() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();

    let permit = p.flight.try_acquire().unwrap();
    assert_eq!(p.state(), PipelineState::Busy);
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_none());
    assert_eq!(p.stats().dropped_busy, 1);
    drop(permit);

    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_some());
}

#[test]
fn cleanup_releases_everything_and_allows_reinitialize() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.cleanup();

    p.initialize().unwrap();
    p.set_background_image(Some(
        BackgroundImage::from_frame("bg", FrameRgba8::solid(2, 2, BLUE)).unwrap(),
    ));
    let _stale = p.flight.try_acquire().unwrap();

    p.cleanup();
    assert_eq!(p.state(), PipelineState::Uninitialized);
    assert!(!p.has_background());
    assert!(!p.flight.is_busy());
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_none());

    p.initialize().unwrap();
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_some());
}

#[test]
fn result_finished_after_cleanup_is_discarded() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();

    let (scratch, epoch) = p.take_scratch().unwrap();
    p.cleanup();
    assert!(!p.restore_scratch(scratch, epoch));
    assert!(p.take_scratch().is_none());
}

#[test]
fn surface_taken_after_reinitialize_is_returned() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();
    let before = p.epoch.load(Ordering::Acquire);

    p.cleanup();
    p.initialize().unwrap();

    let (scratch, epoch) = p.take_scratch().unwrap();
    assert_ne!(epoch, before);
    assert!(p.restore_scratch(scratch, epoch));
    assert!(p.process_frame(&quadrant_frame(), 4, 4).is_some());
}

#[test]
fn ready_pipeline_keeps_working_after_reinitialize_under_load() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();
    let frame = FrameRgba8::solid(2, 2, RED);

    for _ in 0..20 {
        let stop = std::sync::atomic::AtomicBool::new(false);
        std::thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    while !stop.load(Ordering::Relaxed) {
                        let _ = p.process_frame(&frame, 2, 2);
                    }
                });
            }
            for _ in 0..50 {
                p.cleanup();
                p.initialize().unwrap();
            }
            stop.store(true, Ordering::Relaxed);
        });

        assert_eq!(p.state(), PipelineState::Ready);
        assert!(p.process_frame(&frame, 2, 2).is_some());
    }
}

#[test]
fn scratch_surface_is_reused_across_frames() {
    let p = pipeline_with(Arc::new(RedIsPerson));
    p.initialize().unwrap();
    for _ in 0..3 {
        p.process_frame(&quadrant_frame(), 4, 4).unwrap();
    }
    let (scratch, _) = p.take_scratch().unwrap();
    assert_eq!(scratch.stats().reallocations, 1);
    assert_eq!(scratch.stats().resizes, 3);
}
