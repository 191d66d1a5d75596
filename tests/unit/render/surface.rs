use super::*;
use crate::foundation::core::FrameRgba8;

fn size(w: u32, h: u32) -> FrameSize {
    FrameSize::new(w, h).unwrap()
}

#[test]
fn resize_reuses_allocation_when_not_growing() {
    let mut s = ScratchSurface::new();
    s.resize(size(8, 8)).unwrap();
    s.resize(size(8, 8)).unwrap();
    s.resize(size(4, 4)).unwrap();
    s.resize(size(8, 8)).unwrap();

    let st = s.stats();
    assert_eq!(st.resizes, 4);
    assert_eq!(st.reallocations, 1);
    assert_eq!(s.pixels().len(), 8 * 8 * 4);
    assert_eq!(s.size(), size(8, 8));
}

#[test]
fn draw_same_size_copies_exactly() {
    let frame = FrameRgba8::new(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    let mut s = ScratchSurface::with_size(size(2, 1)).unwrap();
    s.draw_frame(frame.view()).unwrap();
    assert_eq!(s.pixels(), frame.data.as_slice());
    assert_eq!(s.view().size(), frame.size());
}

#[test]
fn draw_scales_to_surface_size() {
    let frame = FrameRgba8::solid(8, 6, [0, 0, 255, 255]);
    let mut s = ScratchSurface::with_size(size(4, 3)).unwrap();
    s.draw_frame(frame.view()).unwrap();
    assert_eq!(s.pixels().len(), 4 * 3 * 4);
    assert!(s.pixels().chunks_exact(4).all(|px| px == [0, 0, 255, 255]));
}

#[test]
fn draw_rejects_inconsistent_frame() {
    let data = [0u8; 7];
    let view = FrameView {
        width: 2,
        height: 1,
        data: &data,
    };
    let mut s = ScratchSurface::with_size(size(2, 1)).unwrap();
    assert!(s.draw_frame(view).is_err());
}
