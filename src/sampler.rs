use crate::config::{Axis, Edge, EdgeLayout, EdgeStripConfig};
use crate::error::Result;
use crate::frame::{Bgr, Frame, Size};
use crate::resize::resize_area;

/// Colors for one side of the display, in natural scan order
/// (left-to-right for top/bottom, top-to-bottom for left/right).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledEdge {
    pub edge: Edge,
    pub samples: Vec<Bgr>,
}

impl SampledEdge {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledEdges {
    pub top: SampledEdge,
    pub right: SampledEdge,
    pub bottom: SampledEdge,
    pub left: SampledEdge,
}

impl SampledEdges {
    pub fn get(&self, edge: Edge) -> &SampledEdge {
        match edge {
            Edge::Top => &self.top,
            Edge::Right => &self.right,
            Edge::Bottom => &self.bottom,
            Edge::Left => &self.left,
        }
    }
}

/// Reduces the band `strip.region` of the working frame to `strip.samples` colors.
pub fn sample_edge(
    working: &Frame,
    edge: Edge,
    strip: &EdgeStripConfig,
    axis: Axis,
) -> Result<SampledEdge> {
    let band = working.crop(&strip.region)?;
    let n = strip.samples as u32;
    let target = match axis {
        Axis::Horizontal => Size::new(n, 1),
        Axis::Vertical => Size::new(1, n),
    };
    let samples = resize_area(&band, target)?.pixels().collect();
    Ok(SampledEdge { edge, samples })
}

pub struct EdgeSampler {
    layout: EdgeLayout,
}

impl EdgeSampler {
    pub fn new(layout: EdgeLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &EdgeLayout {
        &self.layout
    }

    pub fn sample(&self, working: &Frame) -> Result<SampledEdges> {
        let sample = |edge: Edge| sample_edge(working, edge, self.layout.strip(edge), edge.axis());
        Ok(SampledEdges {
            top: sample(Edge::Top)?,
            right: sample(Edge::Right)?,
            bottom: sample(Edge::Bottom)?,
            left: sample(Edge::Left)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rect;

    fn strip(samples: usize, region: Rect) -> EdgeStripConfig {
        EdgeStripConfig {
            samples,
            region,
            reversed: false,
        }
    }

    #[test]
    fn test_uniform_band() {
        let color = Bgr::new(0, 0, 255);
        let frame = Frame::filled(400, 320, color);
        let layout = EdgeLayout::with_margin(frame.size(), 60, [56, 40, 56, 40]);
        let edges = EdgeSampler::new(layout).sample(&frame).unwrap();
        for edge in Edge::CLOCKWISE {
            let sampled = edges.get(edge);
            assert_eq!(sampled.edge, edge);
            assert!(sampled.samples.iter().all(|&c| c == color));
        }
        assert_eq!(edges.top.len(), 56);
        assert_eq!(edges.left.len(), 40);
    }

    #[test]
    fn test_horizontal_scan_order() {
        // columns 0..4 red, 4..8 green, 8..12 blue
        let mut frame = Frame::filled(12, 4, Bgr::default());
        for y in 0..4 {
            for x in 0..12 {
                let color = match x / 4 {
                    0 => Bgr::new(0, 0, 255),
                    1 => Bgr::new(0, 255, 0),
                    _ => Bgr::new(255, 0, 0),
                };
                frame.set_pixel(x, y, color);
            }
        }
        let top = sample_edge(&frame, Edge::Top, &strip(3, Rect::new(0, 0, 12, 2)), Axis::Horizontal)
            .unwrap();
        assert_eq!(
            top.samples,
            vec![Bgr::new(0, 0, 255), Bgr::new(0, 255, 0), Bgr::new(255, 0, 0)]
        );
    }

    #[test]
    fn test_vertical_scan_order_and_averaging() {
        // rows 0..2 black, rows 2..4 white; band is the two right-hand columns
        let mut frame = Frame::filled(6, 4, Bgr::default());
        for y in 2..4 {
            for x in 0..6 {
                frame.set_pixel(x, y, Bgr::new(200, 200, 200));
            }
        }
        let right = sample_edge(&frame, Edge::Right, &strip(2, Rect::new(4, 0, 2, 4)), Axis::Vertical)
            .unwrap();
        assert_eq!(right.samples, vec![Bgr::new(0, 0, 0), Bgr::new(200, 200, 200)]);

        let single = sample_edge(&frame, Edge::Right, &strip(1, Rect::new(4, 0, 2, 4)), Axis::Vertical)
            .unwrap();
        assert_eq!(single.samples, vec![Bgr::new(100, 100, 100)]);
    }

    #[test]
    fn test_region_outside_frame() {
        let frame = Frame::filled(10, 10, Bgr::default());
        assert!(
            sample_edge(&frame, Edge::Top, &strip(2, Rect::new(0, 0, 11, 2)), Axis::Horizontal)
                .is_err()
        );
    }
}
