//! Frame sources.
//!
//! A source hands out one frame per call and blocks until it has one.
//! `Ok(None)` means the stream ended. Frames are in capture channel order.

use std::fs;
use std::path::{Path, PathBuf};

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use tracing::{debug, info, warn};

use crate::config::{CaptureConfig, CaptureSource};
use crate::error::{GlowError, Result};
use crate::frame::{Frame, Size};

pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Gives the device back. Safe to call more than once.
    fn release(&mut self) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

pub fn open_source(config: &CaptureConfig) -> Result<Box<dyn FrameSource>> {
    match &config.source {
        CaptureSource::Device { index } => Ok(Box::new(CameraCapture::open(
            *index,
            config.resolution,
            config.fps,
        )?)),
        CaptureSource::Sequence { dir } => Ok(Box::new(ImageSequence::open(dir)?)),
    }
}

/// A camera with its stream running.
pub trait CameraStream {
    /// Blocks for the next frame, sized as the device delivered it.
    fn next_frame(&mut self) -> Result<Frame>;

    fn stop_capture(&mut self) -> Result<()>;
}

impl CameraStream for Camera {
    fn next_frame(&mut self) -> Result<Frame> {
        let buffer = self
            .frame()
            .map_err(|e| GlowError::CaptureRead(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| GlowError::CaptureRead(format!("decode: {e}")))?;
        Frame::from_rgb_raw(decoded.width(), decoded.height(), decoded.into_raw())
    }

    fn stop_capture(&mut self) -> Result<()> {
        self.stop_stream()
            .map_err(|e| GlowError::CaptureRead(e.to_string()))
    }
}

/// Opens camera `index` close to `resolution`, trying MJPEG, then YUYV, then
/// whatever the device offers.
fn open_camera(index: u32, resolution: Size, fps: u32) -> Result<Camera> {
    let device = format!("camera {index}");
    let wanted = Resolution::new(resolution.width, resolution.height);
    let attempts = [
        RequestedFormatType::Closest(CameraFormat::new(wanted, FrameFormat::MJPEG, fps)),
        RequestedFormatType::Closest(CameraFormat::new(wanted, FrameFormat::YUYV, fps)),
        RequestedFormatType::AbsoluteHighestResolution,
    ];

    let mut last_error = String::from("no formats tried");
    for request in attempts {
        match Camera::new(
            CameraIndex::Index(index),
            RequestedFormat::new::<RgbFormat>(request.clone()),
        ) {
            Ok(mut camera) => {
                camera
                    .open_stream()
                    .map_err(|e| GlowError::init(&device, e))?;
                let format = camera.camera_format();
                info!(
                    "Opened {} at {}x{} {:?} (asked for {})",
                    device,
                    format.width(),
                    format.height(),
                    format.format(),
                    resolution
                );
                return Ok(camera);
            }
            Err(e) => {
                debug!("{} rejected {:?}: {}", device, request, e);
                last_error = e.to_string();
            }
        }
    }
    Err(GlowError::init(device, last_error))
}

/// Camera source. Each frame keeps the size the device actually delivered, so
/// a device that ignores the requested resolution shows up at the crop check
/// instead of as garbled frames.
pub struct CameraCapture<C: CameraStream = Camera> {
    device: String,
    camera: Option<C>,
    pending: Option<Frame>,
}

impl CameraCapture {
    pub fn open(index: u32, resolution: Size, fps: u32) -> Result<Self> {
        let camera = open_camera(index, resolution, fps)?;
        Self::start(format!("camera {index}"), camera)
    }
}

impl<C: CameraStream> CameraCapture<C> {
    /// Waits for the first frame, so a camera that opens but never delivers
    /// fails here rather than in the loop.
    pub fn start(device: impl Into<String>, camera: C) -> Result<Self> {
        let mut capture = Self {
            device: device.into(),
            camera: Some(camera),
            pending: None,
        };
        match capture.read_frame() {
            Ok(Some(frame)) => {
                debug!("First frame from {} is {}", capture.device, frame.size());
                capture.pending = Some(frame);
                Ok(capture)
            }
            Ok(None) => {
                capture.release();
                Err(GlowError::init(&capture.device, "no frames received"))
            }
            Err(e) => {
                capture.release();
                Err(GlowError::init(&capture.device, e))
            }
        }
    }
}

impl<C: CameraStream> FrameSource for CameraCapture<C> {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }
        match self.camera.as_mut() {
            Some(camera) => camera.next_frame().map(Some),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.pending = None;
        if let Some(mut camera) = self.camera.take() {
            match camera.stop_capture() {
                Ok(()) => debug!("Stopped {}", self.device),
                Err(e) => warn!("Failed to stop {}: {}", self.device, e),
            }
        }
    }
}

impl<C: CameraStream> Drop for CameraCapture<C> {
    fn drop(&mut self) {
        self.release();
    }
}

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "ppm"];

/// Replays still images from a directory in file name order.
pub struct ImageSequence {
    paths: std::vec::IntoIter<PathBuf>,
}

impl ImageSequence {
    pub fn open(dir: &Path) -> Result<Self> {
        let device = dir.display().to_string();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| GlowError::init(&device, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        if paths.is_empty() {
            return Err(GlowError::init(&device, "no images found"));
        }
        paths.sort();
        info!("Replaying {} images from {}", paths.len(), device);
        Ok(Self {
            paths: paths.into_iter(),
        })
    }
}

impl FrameSource for ImageSequence {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        let image = image::open(&path)
            .map_err(|e| GlowError::CaptureRead(format!("{}: {}", path.display(), e)))?;
        Ok(Some(Frame::from_rgb_image(&image.to_rgb8())))
    }
}
