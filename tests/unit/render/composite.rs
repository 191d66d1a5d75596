use super::*;
use crate::segment::mask::MaskLabel;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

#[test]
fn quadrant_mask_has_exact_boundary() {
    let labels = [1u8, 1, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let mask = SegmentationMask::new(4, 4, labels.to_vec()).unwrap();
    let frame = BLUE.repeat(16);
    let background = RED.repeat(16);

    let out = composite_foreground(&frame, &background, &mask).unwrap();
    for (i, px) in out.chunks_exact(4).enumerate() {
        let want = if labels[i] == 1 { BLUE } else { RED };
        assert_eq!(px, want, "pixel {i}");
    }
}

#[test]
fn all_background_keeps_background_and_all_foreground_keeps_frame() {
    let frame: Vec<u8> = (0..24).collect();
    let background: Vec<u8> = (100..124).collect();

    let bg_mask = SegmentationMask::filled(3, 2, MaskLabel::Background);
    assert_eq!(
        composite_foreground(&frame, &background, &bg_mask).unwrap(),
        background
    );

    let fg_mask = SegmentationMask::filled(3, 2, MaskLabel::Foreground);
    assert_eq!(
        composite_foreground(&frame, &background, &fg_mask).unwrap(),
        frame
    );
}

#[test]
fn foreground_alpha_is_copied_verbatim() {
    let mask = SegmentationMask::filled(1, 1, MaskLabel::Foreground);
    let mut bg = vec![9, 9, 9, 255];
    composite_foreground_in_place(&mut bg, &[1, 2, 3, 0], &mask).unwrap();
    assert_eq!(bg, vec![1, 2, 3, 0]);
}

#[test]
fn length_mismatch_is_an_error() {
    let mask = SegmentationMask::filled(2, 2, MaskLabel::Foreground);
    let mut bg = vec![0u8; 16];
    assert!(composite_foreground_in_place(&mut bg, &[0u8; 12], &mask).is_err());
    let mut short = vec![0u8; 12];
    assert!(composite_foreground_in_place(&mut short, &[0u8; 16], &mask).is_err());
}
