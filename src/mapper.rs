//! Placement of sampled edge colors into the physical LED order.

use std::ops::Range;

use palette::Srgb;

use crate::config::{Edge, EdgeLayout};
use crate::error::{GlowError, Result};
use crate::frame::Bgr;
use crate::gamma::GammaLookup;
use crate::sampler::SampledEdges;

/// Color as sent to the strip, one byte per channel.
pub type LedColor = Srgb<u8>;

/// Converts a capture-order sample to the strip's RGB order, gamma corrected.
pub fn led_color(sample: Bgr, gamma: &GammaLookup) -> LedColor {
    Srgb::new(
        gamma.correct(sample.r),
        gamma.correct(sample.g),
        gamma.correct(sample.b),
    )
}

/// Every LED on the strip, indexed in wiring order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedBuffer {
    colors: Vec<LedColor>,
}

impl LedBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            colors: vec![Srgb::new(0, 0, 0); len],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[LedColor] {
        &self.colors
    }

    /// Wire payload: R, G, B per LED.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|c| [c.red, c.green, c.blue])
            .collect()
    }
}

/// Writes one edge into `target`, walking the samples backwards when `reversed`.
///
/// There must be exactly one sample per LED slot.
pub fn map_edge(
    samples: &[Bgr],
    target: &mut [LedColor],
    reversed: bool,
    gamma: &GammaLookup,
) -> Result<()> {
    if samples.len() != target.len() {
        return Err(GlowError::SampleCount {
            expected: target.len(),
            got: samples.len(),
        });
    }
    let colors = samples.iter().map(|&s| led_color(s, gamma));
    if reversed {
        for (slot, color) in target.iter_mut().zip(colors.rev()) {
            *slot = color;
        }
    } else {
        for (slot, color) in target.iter_mut().zip(colors) {
            *slot = color;
        }
    }
    Ok(())
}

pub struct PixelMapper {
    layout: EdgeLayout,
    ranges: [(Edge, Range<usize>); 4],
    gamma: GammaLookup,
}

impl PixelMapper {
    pub fn new(layout: EdgeLayout, gamma: GammaLookup) -> Self {
        let ranges = layout.ranges();
        Self {
            layout,
            ranges,
            gamma,
        }
    }

    pub fn led_count(&self) -> usize {
        self.layout.total_leds()
    }

    /// Builds a fresh buffer: top, right, bottom, left, each in its fixed range.
    ///
    /// Fails with [`GlowError::SampleCount`] when an edge does not carry one
    /// sample per LED of its strip.
    pub fn map(&self, edges: &SampledEdges) -> Result<LedBuffer> {
        let mut buffer = LedBuffer::new(self.led_count());
        for (edge, range) in &self.ranges {
            map_edge(
                &edges.get(*edge).samples,
                &mut buffer.colors[range.clone()],
                self.layout.strip(*edge).reversed,
                &self.gamma,
            )?;
        }
        Ok(buffer)
    }
}
