//! Area-averaging resize.
//!
//! Each output pixel covers a `src / dst` wide span of the source along each
//! axis and takes the mean of the source pixels under it, weighted by how much
//! of each pixel falls inside the span. Shrinking therefore averages detail
//! away instead of aliasing it.

use crate::error::{GlowError, Result};
use crate::frame::{Frame, Size};

/// Source taps for one output position: `(source index, weight)`, weights sum to 1.
type Taps = Vec<(usize, f64)>;

fn area_taps(src: usize, dst: usize) -> Vec<Taps> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = start + scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src);
            let mut taps: Taps = (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 1e-9).then_some((s, overlap))
                })
                .collect();
            let total: f64 = taps.iter().map(|(_, w)| w).sum();
            for (_, w) in &mut taps {
                *w /= total;
            }
            taps
        })
        .collect()
}

/// Resizes `frame` to `target` by area averaging. Channel order is untouched.
pub fn resize_area(frame: &Frame, target: Size) -> Result<Frame> {
    if frame.size().is_empty() || target.is_empty() {
        return Err(GlowError::Config(format!(
            "cannot resize {} to {}",
            frame.size(),
            target
        )));
    }
    if frame.size() == target {
        return Ok(frame.clone());
    }

    let (src_w, src_h) = (frame.width() as usize, frame.height() as usize);
    let (dst_w, dst_h) = (target.width as usize, target.height as usize);
    let x_taps = area_taps(src_w, dst_w);
    let y_taps = area_taps(src_h, dst_h);
    let src = frame.as_bytes();

    // horizontal pass: src_h rows of dst_w pixels, kept in f64
    let mut rows = vec![0.0_f64; src_h * dst_w * Frame::CHANNELS];
    for y in 0..src_h {
        for (x, taps) in x_taps.iter().enumerate() {
            let out = (y * dst_w + x) * Frame::CHANNELS;
            for &(sx, w) in taps {
                let i = (y * src_w + sx) * Frame::CHANNELS;
                for c in 0..Frame::CHANNELS {
                    rows[out + c] += f64::from(src[i + c]) * w;
                }
            }
        }
    }

    let mut data = Vec::with_capacity(dst_w * dst_h * Frame::CHANNELS);
    for taps in &y_taps {
        for x in 0..dst_w {
            let mut acc = [0.0_f64; Frame::CHANNELS];
            for &(sy, w) in taps {
                let i = (sy * dst_w + x) * Frame::CHANNELS;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += rows[i + c] * w;
                }
            }
            data.extend(acc.iter().map(|v| v.round().clamp(0.0, 255.0) as u8));
        }
    }

    Frame::from_raw(target.width, target.height, data)
}
