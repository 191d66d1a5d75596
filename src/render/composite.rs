use crate::{
    foundation::error::{BackdropError, BackdropResult},
    segment::mask::SegmentationMask,
};

/// Overwrite every foreground pixel of `background` with the matching pixel of `frame`.
///
/// Hard cutoff: background-classified pixels keep the background's own RGBA, foreground
/// pixels take the frame's RGBA verbatim, with no feathering at the mask boundary.
pub fn composite_foreground_in_place(
    background: &mut [u8],
    frame: &[u8],
    mask: &SegmentationMask,
) -> BackdropResult<()> {
    let expected = mask
        .len()
        .checked_mul(4)
        .ok_or_else(|| BackdropError::frame_processing("composite buffer size overflow"))?;
    if background.len() != expected || frame.len() != expected {
        return Err(BackdropError::frame_processing(format!(
            "composite expects {expected}-byte buffers for a {} mask, got background={} frame={}",
            mask.size(),
            background.len(),
            frame.len()
        )));
    }

    for ((dst, src), &label) in background
        .chunks_exact_mut(4)
        .zip(frame.chunks_exact(4))
        .zip(mask.labels())
    {
        if label != 0 {
            dst.copy_from_slice(src);
        }
    }
    Ok(())
}

/// Allocating variant of [`composite_foreground_in_place`].
pub fn composite_foreground(
    frame: &[u8],
    background: &[u8],
    mask: &SegmentationMask,
) -> BackdropResult<Vec<u8>> {
    let mut out = background.to_vec();
    composite_foreground_in_place(&mut out, frame, mask)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
