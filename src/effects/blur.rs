use rayon::prelude::*;

use crate::{
    effects::kernel::GaussianKernel,
    foundation::core::FrameSize,
    foundation::error::{BackdropError, BackdropResult},
    segment::mask::SegmentationMask,
};

/// Blur only the background pixels of `src` into a new buffer.
///
/// See [`blur_background_into`].
pub fn blur_background_rgba8(
    src: &[u8],
    size: FrameSize,
    mask: &SegmentationMask,
    kernel: &GaussianKernel,
    parallel: bool,
) -> BackdropResult<Vec<u8>> {
    let mut dst = vec![0u8; src.len()];
    blur_background_into(src, &mut dst, size, mask, kernel, parallel)?;
    Ok(dst)
}

/// Masked Gaussian blur of straight RGBA8 pixels.
///
/// Every background pixel becomes the kernel-weighted average of its `(2r+1)^2`
/// neighborhood, with out-of-range neighbors clamped to the nearest edge pixel.
/// Foreground pixels are copied unchanged. Runs as two separable Q16 passes; the
/// vertical pass only evaluates background pixels.
pub fn blur_background_into(
    src: &[u8],
    dst: &mut [u8],
    size: FrameSize,
    mask: &SegmentationMask,
    kernel: &GaussianKernel,
    parallel: bool,
) -> BackdropResult<()> {
    let expected_len = size.rgba_len()?;
    if src.len() != expected_len || dst.len() != expected_len {
        return Err(BackdropError::frame_processing(
            "blur expects src and dst matching width*height*4",
        ));
    }
    if mask.size() != size {
        return Err(BackdropError::frame_processing(format!(
            "blur mask is {} but frame is {size}",
            mask.size()
        )));
    }

    if size.is_empty() || kernel.radius() == 0 || mask.foreground_count() == mask.len() {
        dst.copy_from_slice(src);
        return Ok(());
    }

    let k = kernel.quantize_q16();
    let w = size.width as usize;
    let mut tmp = vec![0u32; expected_len];

    for_each_row(&mut tmp, w * 4, parallel, |y, row| {
        horizontal_row(src, row, y, size, &k);
    });
    for_each_row(dst, w * 4, parallel, |y, row| {
        vertical_row(src, &tmp, row, y, size, mask, &k);
    });
    Ok(())
}

fn for_each_row<T, F>(buf: &mut [T], row_len: usize, parallel: bool, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if parallel {
        buf.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        buf.chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}

// Output stays in Q16 so the vertical pass rounds only once.
fn horizontal_row(src: &[u8], dst_row: &mut [u32], y: usize, size: FrameSize, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = size.width as i64;
    let row_base = y * size.width as usize;
    for x in 0..w {
        let mut acc = [0u32; 4];
        for (ki, &kw) in k.iter().enumerate() {
            let sx = (x + ki as i64 - radius).clamp(0, w - 1) as usize;
            let idx = (row_base + sx) * 4;
            for c in 0..4 {
                acc[c] += kw * u32::from(src[idx + c]);
            }
        }
        let out = x as usize * 4;
        dst_row[out..out + 4].copy_from_slice(&acc);
    }
}

fn vertical_row(
    src: &[u8],
    tmp: &[u32],
    dst_row: &mut [u8],
    y: usize,
    size: FrameSize,
    mask: &SegmentationMask,
    k: &[u32],
) {
    let radius = (k.len() / 2) as i64;
    let w = size.width as usize;
    let h = size.height as i64;
    let row_base = y * w;
    for x in 0..w {
        let out = x * 4;
        let src_idx = (row_base + x) * 4;
        if mask.is_foreground(row_base + x) {
            dst_row[out..out + 4].copy_from_slice(&src[src_idx..src_idx + 4]);
            continue;
        }
        let mut acc = [0u64; 4];
        for (ki, &kw) in k.iter().enumerate() {
            let sy = (y as i64 + ki as i64 - radius).clamp(0, h - 1) as usize;
            let idx = (sy * w + x) * 4;
            for c in 0..4 {
                acc[c] += u64::from(kw) * u64::from(tmp[idx + c]);
            }
        }
        for c in 0..4 {
            dst_row[out + c] = q32_to_u8(acc[c]);
        }
    }
}

fn q32_to_u8(acc: u64) -> u8 {
    let v = (acc + (1 << 31)) >> 32;
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
