use tracing::instrument;

use crate::config::{EdgeLayout, GlowConfig};
use crate::error::Result;
use crate::extract::RegionExtractor;
use crate::frame::Frame;
use crate::gamma::GammaLookup;
use crate::mapper::{LedBuffer, PixelMapper};
use crate::sampler::{EdgeSampler, SampledEdges};

/// Everything one capture turns into. The working frame and edge samples are
/// kept for the preview.
#[derive(Debug)]
pub struct AmbientFrame {
    pub working: Frame,
    pub edges: SampledEdges,
    pub leds: LedBuffer,
}

/// Capture to LED colors: extract, sample the four edges, map to wiring order.
pub struct Ambient {
    extractor: RegionExtractor,
    sampler: EdgeSampler,
    mapper: PixelMapper,
}

impl Ambient {
    pub fn new(extractor: RegionExtractor, layout: EdgeLayout, gamma: GammaLookup) -> Self {
        Self {
            extractor,
            sampler: EdgeSampler::new(layout.clone()),
            mapper: PixelMapper::new(layout, gamma),
        }
    }

    pub fn from_config(config: &GlowConfig) -> Self {
        Self::new(
            RegionExtractor::new(config.crop, config.working),
            config.edges.clone(),
            GammaLookup::new(config.gamma),
        )
    }

    pub fn led_count(&self) -> usize {
        self.mapper.led_count()
    }

    pub fn layout(&self) -> &EdgeLayout {
        self.sampler.layout()
    }

    #[instrument(level = "trace", skip_all)]
    pub fn render(&self, raw: &Frame) -> Result<AmbientFrame> {
        let working = self.extractor.extract(raw)?;
        let edges = self.sampler.sample(&working)?;
        let leds = self.mapper.map(&edges)?;
        Ok(AmbientFrame {
            working,
            edges,
            leds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Bgr, Rect, Size};

    #[test]
    fn test_default_config_on_lit_display() {
        let config = GlowConfig::default();
        let ambient = Ambient::from_config(&config);

        let mut raw = Frame::filled(800, 600, Bgr::new(255, 255, 255));
        let crop = config.crop;
        for y in crop.y..crop.y + crop.height {
            for x in crop.x..crop.x + crop.width {
                raw.set_pixel(x, y, Bgr::new(0, 255, 0));
            }
        }
        let frame = ambient.render(&raw).unwrap();
        assert_eq!(frame.working.size(), Size::new(400, 320));
        assert_eq!(frame.leds.len(), 192);
        assert!(frame
            .leds
            .colors()
            .iter()
            .all(|c| (c.red, c.green, c.blue) == (0, 255, 0)));
    }

    #[test]
    fn test_bright_corner_reaches_both_ends_of_strip() {
        // only the top-left corner is lit: first top LED and last left LED light up
        let working = Size::new(40, 40);
        let layout = EdgeLayout::with_margin(working, 10, [4, 4, 4, 4]);
        let ambient = Ambient::new(
            RegionExtractor::new(Rect::new(0, 0, 40, 40), working),
            layout,
            GammaLookup::identity(),
        );
        let mut raw = Frame::filled(40, 40, Bgr::default());
        for y in 0..10 {
            for x in 0..10 {
                raw.set_pixel(x, y, Bgr::new(0, 0, 200));
            }
        }
        let reds: Vec<u8> = ambient
            .render(&raw)
            .unwrap()
            .leds
            .colors()
            .iter()
            .map(|c| c.red)
            .collect();
        assert_eq!(reds, vec![200, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 200]);
    }
}
