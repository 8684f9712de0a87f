//! The per-frame loop: capture, render, transmit, preview, repeat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::adalight::LedStrip;
use crate::ambient::Ambient;
use crate::capture::FrameSource;
use crate::error::Result;
use crate::frame::Frame;
use crate::preview::Preview;

pub const PREVIEW_TITLE: &str = "output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopped,
}

/// Why the loop ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    ReadFailed(String),
    QuitRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
}

impl RunSummary {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

pub struct Driver<S: FrameSource, L: LedStrip> {
    source: S,
    strip: L,
    ambient: Ambient,
    preview: Option<Preview>,
    quit: Arc<AtomicBool>,
    state: DriverState,
}

impl<S: FrameSource, L: LedStrip> Driver<S, L> {
    /// Takes ownership of an opened source and strip; the driver starts out running.
    pub fn new(source: S, strip: L, ambient: Ambient) -> Self {
        Self {
            source,
            strip,
            ambient,
            preview: None,
            quit: Arc::new(AtomicBool::new(false)),
            state: DriverState::Running,
        }
    }

    /// Opens the source, then the strip, then the preview, and hands them to
    /// a new driver. If a later step fails the source is released before the
    /// error is returned.
    pub fn assemble(
        ambient: Ambient,
        open_source: impl FnOnce() -> Result<S>,
        open_strip: impl FnOnce() -> Result<L>,
        open_preview: impl FnOnce() -> Result<Option<Preview>>,
    ) -> Result<Self> {
        let mut source = open_source()?;
        let strip = match open_strip() {
            Ok(strip) => strip,
            Err(e) => {
                source.release();
                return Err(e);
            }
        };
        let preview = match open_preview() {
            Ok(preview) => preview,
            Err(e) => {
                source.release();
                return Err(e);
            }
        };
        let driver = Self::new(source, strip, ambient);
        Ok(match preview {
            Some(preview) => driver.with_preview(preview),
            None => driver,
        })
    }

    pub fn with_preview(mut self, preview: Preview) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Flag that, once set, stops the loop before the next capture.
    pub fn with_quit_flag(mut self, quit: Arc<AtomicBool>) -> Self {
        self.quit = quit;
        self
    }

    pub fn quit_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit)
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Runs until end of stream, a failed read or a quit request. Fatal errors
    /// are returned. The source is released on every path.
    pub fn run(&mut self) -> Result<RunSummary> {
        let started = Instant::now();
        let mut frames = 0;
        let outcome = self.run_loop(&mut frames);
        self.stop();
        let reason = outcome?;
        let summary = RunSummary {
            frames,
            elapsed: started.elapsed(),
            reason,
        };
        info!(
            "Stopped after {} frames ({:.1} fps): {:?}",
            summary.frames,
            summary.fps(),
            summary.reason
        );
        Ok(summary)
    }

    fn run_loop(&mut self, frames: &mut u64) -> Result<StopReason> {
        while self.state == DriverState::Running {
            if self.quit.load(Ordering::SeqCst) {
                return Ok(StopReason::QuitRequested);
            }
            let raw = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Capture stream ended");
                    return Ok(StopReason::EndOfStream);
                }
                Err(e) if e.is_end_of_stream() => {
                    warn!("Can't receive frame, stopping: {}", e);
                    return Ok(StopReason::ReadFailed(e.to_string()));
                }
                Err(e) => return Err(e),
            };
            self.step(&raw)?;
            *frames += 1;
            if self.window_quit() {
                info!("Quit requested from the preview window");
                return Ok(StopReason::QuitRequested);
            }
        }
        Ok(StopReason::QuitRequested)
    }

    fn step(&mut self, raw: &Frame) -> Result<()> {
        let started = Instant::now();
        let frame = self.ambient.render(raw)?;
        self.strip.write_buffer(&frame.leds)?;
        self.strip.show()?;
        if let Some(preview) = self.preview.as_mut() {
            let image = preview.compositor.compose(&frame.working, &frame.edges);
            preview.window.render(PREVIEW_TITLE, &image)?;
        }
        debug!("Frame done in {:?}", started.elapsed());
        Ok(())
    }

    fn window_quit(&mut self) -> bool {
        self.preview
            .as_mut()
            .is_some_and(|preview| preview.window.poll_quit())
    }

    fn stop(&mut self) {
        if self.state == DriverState::Running {
            self.state = DriverState::Stopped;
            self.source.release();
        }
    }

    pub fn into_parts(self) -> (S, L) {
        (self.source, self.strip)
    }
}
