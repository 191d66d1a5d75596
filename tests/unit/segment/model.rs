use super::*;
use crate::foundation::{
    config::{ModelArchitecture, PipelineConfig},
    core::FrameRgba8,
};

#[test]
fn opts_follow_config() {
    let mut cfg = PipelineConfig::default();
    cfg.segmentation.threshold = 0.4;
    cfg.model.internal_resolution = InternalResolution::High;

    let opts = SegmentOpts::from_config(&cfg.segmentation, &cfg.model);
    assert_eq!(opts.threshold, 0.4);
    assert!(!opts.flip_horizontal);
    assert_eq!(opts.internal_resolution, InternalResolution::High);
}

#[test]
fn chroma_backend_loads_a_working_model() {
    let backend = create_backend(BackendKind::ChromaKey(ChromaKeyConfig::default()));
    let model = backend.load_model(&ModelConfig::default()).unwrap();

    let frame = FrameRgba8::solid(3, 2, [0, 177, 64, 255]);
    let opts = SegmentOpts::from_config(&Default::default(), &ModelConfig::default());
    let mask = model.segment_person(frame.view(), &opts).unwrap();
    assert_eq!(mask.len(), 6);
    assert_eq!(mask.foreground_count(), 0);
}

#[test]
fn backend_rejects_invalid_model_config() {
    let backend = create_backend(BackendKind::ChromaKey(ChromaKeyConfig::default()));
    let bad = ModelConfig {
        architecture: ModelArchitecture::MobileNetV1,
        output_stride: 7,
        ..ModelConfig::default()
    };
    assert!(backend.load_model(&bad).is_err());
}
