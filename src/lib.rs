//! Ambient lighting for a camera-captured display.
//!
//! Each captured frame is cropped to the display area, the four edge bands
//! are averaged down to one color per LED, and the colors are gamma corrected
//! and laid out clockwise from the top-left corner for an Adalight strip.

pub mod adalight;
pub mod ambient;
pub mod capture;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod frame;
pub mod gamma;
pub mod logger;
pub mod mapper;
pub mod preview;
pub mod resize;
pub mod sampler;

pub use adalight::{Adalight, LedStrip};
pub use ambient::{Ambient, AmbientFrame};
pub use capture::{CameraCapture, FrameSource, ImageSequence};
pub use config::{Edge, EdgeLayout, EdgeStripConfig, GlowConfig};
pub use driver::{Driver, DriverState, RunSummary, StopReason};
pub use error::{GlowError, Result};
pub use frame::{Bgr, Frame, Rect, Size};
pub use gamma::GammaLookup;
pub use mapper::{LedBuffer, LedColor, PixelMapper};
pub use preview::{Preview, PreviewWindow};
pub use sampler::{EdgeSampler, SampledEdge, SampledEdges};
