//! Startup configuration.
//!
//! Everything here is read once before the driver starts and is never
//! changed afterwards. [`EdgeLayout`] is the one place LED geometry lives:
//! the mapper takes its index ranges from it and the preview draws from it.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GlowError, Result};
use crate::frame::{Rect, Size};

/// Adalight encodes `count - 1` in a 16 bit header field.
pub const MAX_LEDS: usize = 1 << 16;

/// The four sides of the display, in clockwise wiring order from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const CLOCKWISE: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

    /// Direction the strip is downsampled along.
    pub fn axis(self) -> Axis {
        match self {
            Edge::Top | Edge::Bottom => Axis::Horizontal,
            Edge::Left | Edge::Right => Axis::Vertical,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Edge::Top => "top",
            Edge::Right => "right",
            Edge::Bottom => "bottom",
            Edge::Left => "left",
        }
    }
}

/// `Horizontal` reduces a band to `n` columns and one row, `Vertical` to one column and `n` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStripConfig {
    /// Number of LEDs on this side
    pub samples: usize,
    /// Band of the working frame the LEDs take their color from
    pub region: Rect,
    /// Whether the strip is wired against the natural scan direction
    /// (right-to-left for horizontal edges, bottom-to-top for vertical ones)
    #[serde(default)]
    pub reversed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLayout {
    pub top: EdgeStripConfig,
    pub right: EdgeStripConfig,
    pub bottom: EdgeStripConfig,
    pub left: EdgeStripConfig,
}

impl EdgeLayout {
    /// Bands `margin` pixels deep along each side of a `working` sized frame,
    /// wired clockwise from the top-left corner.
    pub fn with_margin(working: Size, margin: u32, counts: [usize; 4]) -> Self {
        let Size { width, height } = working;
        let [top, right, bottom, left] = counts;
        Self {
            top: EdgeStripConfig {
                samples: top,
                region: Rect::new(0, 0, width, margin),
                reversed: false,
            },
            right: EdgeStripConfig {
                samples: right,
                region: Rect::new(width.saturating_sub(margin), 0, margin, height),
                reversed: false,
            },
            bottom: EdgeStripConfig {
                samples: bottom,
                region: Rect::new(0, height.saturating_sub(margin), width, margin),
                reversed: true,
            },
            left: EdgeStripConfig {
                samples: left,
                region: Rect::new(0, 0, margin, height),
                reversed: true,
            },
        }
    }

    pub fn strip(&self, edge: Edge) -> &EdgeStripConfig {
        match edge {
            Edge::Top => &self.top,
            Edge::Right => &self.right,
            Edge::Bottom => &self.bottom,
            Edge::Left => &self.left,
        }
    }

    pub fn total_leds(&self) -> usize {
        Edge::CLOCKWISE
            .iter()
            .map(|&e| self.strip(e).samples)
            .sum()
    }

    /// Index range each edge occupies in the LED buffer, clockwise.
    pub fn ranges(&self) -> [(Edge, Range<usize>); 4] {
        let mut start = 0;
        Edge::CLOCKWISE.map(|edge| {
            let end = start + self.strip(edge).samples;
            let range = start..end;
            start = end;
            (edge, range)
        })
    }

    pub fn range(&self, edge: Edge) -> Range<usize> {
        self.ranges()
            .into_iter()
            .find(|(e, _)| *e == edge)
            .map(|(_, r)| r)
            .unwrap_or_default()
    }

    pub fn validate(&self, working: Size) -> Result<()> {
        for edge in Edge::CLOCKWISE {
            let strip = self.strip(edge);
            if strip.samples == 0 {
                return Err(GlowError::Config(format!(
                    "{} edge needs at least one LED",
                    edge.name()
                )));
            }
            if strip.region.is_empty() {
                return Err(GlowError::Config(format!(
                    "{} edge region is empty",
                    edge.name()
                )));
            }
            if !strip.region.fits_within(working.width, working.height) {
                return Err(GlowError::Config(format!(
                    "{} edge region {} lies outside the {} working frame",
                    edge.name(),
                    strip.region,
                    working
                )));
            }
        }
        if self.total_leds() > MAX_LEDS {
            return Err(GlowError::Config(format!(
                "{} LEDs configured, at most {} supported",
                self.total_leds(),
                MAX_LEDS
            )));
        }
        Ok(())
    }
}

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureSource {
    /// A V4L2 camera, `/dev/video<index>`
    Device { index: u32 },
    /// A directory of still images, replayed in file name order
    Sequence { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub source: CaptureSource,
    /// Resolution requested from the device; frames may still arrive at another size
    pub resolution: Size,
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::Device { index: 0 },
            resolution: Size::new(800, 600),
            fps: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Serial device the LED controller is attached to
    pub port: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
    pub hardware_flow_control: bool,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            timeout_ms: 1000,
            hardware_flow_control: false,
        }
    }
}

/// Where the preview goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewTarget {
    /// On-screen window; pressing `q` or closing it stops the run
    #[default]
    Window,
    /// PNG files under `dir`, for headless runs
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub enabled: bool,
    pub target: PreviewTarget,
    /// Depth of the LED bands drawn around the working frame
    pub border: u32,
    pub dir: PathBuf,
    /// Write a snapshot every this many frames
    pub every: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: PreviewTarget::Window,
            border: 20,
            dir: PathBuf::from("preview"),
            every: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
    /// 1.25 suits scope traces, 2.8 suits regular video
    pub gamma: f64,
    pub capture: CaptureConfig,
    /// Active display area within the raw capture
    pub crop: Rect,
    /// Resolution the crop is resized to before sampling
    pub working: Size,
    pub edges: EdgeLayout,
    pub strip: StripConfig,
    pub preview: PreviewConfig,
}

impl Default for GlowConfig {
    fn default() -> Self {
        let working = Size::new(400, 320);
        Self {
            gamma: 2.8,
            capture: CaptureConfig::default(),
            crop: Rect::new(25, 61, 640, 478),
            working,
            edges: EdgeLayout::with_margin(working, 60, [56, 40, 56, 40]),
            strip: StripConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

impl GlowConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(GlowError::Config(format!(
                "gamma must be positive, got {}",
                self.gamma
            )));
        }
        if self.crop.is_empty() {
            return Err(GlowError::Config("crop rectangle is empty".to_string()));
        }
        if self.working.is_empty() {
            return Err(GlowError::Config("working size is empty".to_string()));
        }
        if self.capture.resolution.is_empty() {
            return Err(GlowError::Config("capture resolution is empty".to_string()));
        }
        if self.capture.fps == 0 {
            return Err(GlowError::Config("capture frame rate is zero".to_string()));
        }
        if self.preview.every == 0 {
            return Err(GlowError::Config(
                "preview interval must be at least one frame".to_string(),
            ));
        }
        self.edges.validate(self.working)
    }
}
