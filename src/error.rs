use thiserror::Error;

use crate::frame::Rect;

#[derive(Error, Debug)]
pub enum GlowError {
    #[error("Failed to initialise {device}: {reason}")]
    Init { device: String, reason: String },

    #[error("Crop rectangle {crop} exceeds frame bounds {width}x{height}")]
    FrameTooSmall { crop: Rect, width: u32, height: u32 },

    #[error("Failed to read frame: {0}")]
    CaptureRead(String),

    #[error("Invalid frame buffer: {0}")]
    InvalidFrame(String),

    #[error("Edge has {got} samples for {expected} LEDs")]
    SampleCount { expected: usize, got: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("LED transport error: {0}")]
    Transport(String),

    #[error("Preview error: {0}")]
    Preview(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GlowError {
    pub fn init(device: impl Into<String>, reason: impl ToString) -> Self {
        GlowError::Init {
            device: device.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the driver loop should treat this error as a normal end of run.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, GlowError::CaptureRead(_))
    }
}

pub type Result<T> = std::result::Result<T, GlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_capture_reads_end_the_stream() {
        assert!(GlowError::CaptureRead("unplugged".into()).is_end_of_stream());
        assert!(!GlowError::InvalidFrame("short buffer".into()).is_end_of_stream());
        assert!(!GlowError::Transport("port closed".into()).is_end_of_stream());
        assert!(!GlowError::init("/dev/video0", "busy").is_end_of_stream());
    }
}
