//! Debug preview: the working frame surrounded by the sampled edge colors.
//!
//! Positions come from the same [`EdgeLayout`] the mapper uses, so the picture
//! cannot drift from what is sent to the strip.

use std::fs;
use std::path::PathBuf;

use image::{imageops, Rgb, RgbImage};
use minifb::{Key, Window, WindowOptions};
use tracing::{debug, info};

use crate::config::{Edge, EdgeLayout, GlowConfig, PreviewConfig, PreviewTarget};
use crate::error::{GlowError, Result};
use crate::frame::{Frame, Size};
use crate::sampler::SampledEdges;

/// Boundaries of segment `i` of `n` spread over `extent` pixels starting at `offset`.
pub fn segment_bounds(i: usize, n: usize, offset: u32, extent: u32) -> (u32, u32) {
    let step = f64::from(extent) / n as f64;
    let at = |k: usize| (f64::from(offset) + k as f64 * step).round() as u32;
    (at(i), at(i + 1))
}

pub struct DebugCompositor {
    layout: EdgeLayout,
    working: Size,
    border: u32,
}

impl DebugCompositor {
    pub fn new(layout: EdgeLayout, working: Size, border: u32) -> Self {
        Self {
            layout,
            working,
            border,
        }
    }

    pub fn canvas_size(&self) -> Size {
        Size::new(
            self.working.width + 2 * self.border,
            self.working.height + 2 * self.border,
        )
    }

    pub fn compose(&self, working: &Frame, edges: &SampledEdges) -> RgbImage {
        let canvas = self.canvas_size();
        let mut image = RgbImage::new(canvas.width, canvas.height);
        let b = self.border;
        let Size { width: w, height: h } = self.working;

        imageops::replace(&mut image, &working.to_rgb_image(), i64::from(b), i64::from(b));

        for edge in Edge::CLOCKWISE {
            let samples = &edges.get(edge).samples;
            let n = self.layout.strip(edge).samples.min(samples.len());
            for (i, sample) in samples.iter().take(n).enumerate() {
                let color = sample.to_rgb();
                match edge {
                    Edge::Top | Edge::Bottom => {
                        let (x0, x1) = segment_bounds(i, n, b, w);
                        let y0 = if edge == Edge::Top { 0 } else { b + h };
                        fill(&mut image, (x0, y0), (x1, y0 + b), color);
                    }
                    Edge::Left | Edge::Right => {
                        let (y0, y1) = segment_bounds(i, n, b, h);
                        let x0 = if edge == Edge::Left { 0 } else { b + w };
                        fill(&mut image, (x0, y0), (x0 + b, y1), color);
                    }
                }
            }
        }
        image
    }
}

fn fill(image: &mut RgbImage, from: (u32, u32), to: (u32, u32), color: Rgb<u8>) {
    for y in from.1..to.1.min(image.height()) {
        for x in from.0..to.0.min(image.width()) {
            image.put_pixel(x, y, color);
        }
    }
}

/// Somewhere to show the preview.
pub trait PreviewWindow {
    fn render(&mut self, title: &str, image: &RgbImage) -> Result<()>;

    /// Whether the viewer asked to stop since the last render.
    fn poll_quit(&mut self) -> bool {
        false
    }
}

/// Compositor plus the window it draws into.
pub struct Preview {
    pub compositor: DebugCompositor,
    pub window: Box<dyn PreviewWindow>,
}

/// Builds the configured preview, or `None` when it is disabled.
pub fn open_preview(config: &GlowConfig, title: &str) -> Result<Option<Preview>> {
    if !config.preview.enabled {
        return Ok(None);
    }
    let compositor = DebugCompositor::new(
        config.edges.clone(),
        config.working,
        config.preview.border,
    );
    let window: Box<dyn PreviewWindow> = match config.preview.target {
        PreviewTarget::Window => {
            let window = MinifbWindow::open(title, compositor.canvas_size())?;
            info!("Showing preview window, press q to quit");
            Box::new(window)
        }
        PreviewTarget::Snapshot => {
            let window = SnapshotWindow::open(&config.preview)?;
            info!("Writing preview to {}", config.preview.dir.display());
            Box::new(window)
        }
    };
    Ok(Some(Preview { compositor, window }))
}

/// Packs `image` into `0RGB` words, the layout minifb blits.
pub fn pack_rgb(image: &RgbImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        image
            .pixels()
            .map(|Rgb([r, g, b])| (u32::from(*r) << 16) | (u32::from(*g) << 8) | u32::from(*b)),
    );
}

/// On-screen window. Pressing `q` or closing it asks the driver to stop.
pub struct MinifbWindow {
    window: Window,
    title: String,
    size: Size,
    buffer: Vec<u32>,
}

impl MinifbWindow {
    pub fn open(title: &str, size: Size) -> Result<Self> {
        let window = Window::new(
            title,
            size.width as usize,
            size.height as usize,
            WindowOptions::default(),
        )
        .map_err(|e| GlowError::init(format!("preview window {title}"), e))?;
        Ok(Self {
            window,
            title: title.to_string(),
            size,
            buffer: Vec::with_capacity(size.width as usize * size.height as usize),
        })
    }
}

impl PreviewWindow for MinifbWindow {
    fn render(&mut self, title: &str, image: &RgbImage) -> Result<()> {
        if Size::new(image.width(), image.height()) != self.size {
            return Err(GlowError::Preview(format!(
                "{}x{} image for a {} window",
                image.width(),
                image.height(),
                self.size
            )));
        }
        if title != self.title {
            self.window.set_title(title);
            self.title = title.to_string();
        }
        pack_rgb(image, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, self.size.width as usize, self.size.height as usize)
            .map_err(|e| GlowError::Preview(e.to_string()))
    }

    fn poll_quit(&mut self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Q)
    }
}

/// Writes the preview to `<dir>/<title>.png`, once every `every` renders.
pub struct SnapshotWindow {
    dir: PathBuf,
    every: u32,
    count: u64,
}

impl SnapshotWindow {
    pub fn open(config: &PreviewConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir)
            .map_err(|e| GlowError::init(format!("preview dir {}", config.dir.display()), e))?;
        Ok(Self {
            dir: config.dir.clone(),
            every: config.every.max(1),
            count: 0,
        })
    }
}

impl PreviewWindow for SnapshotWindow {
    fn render(&mut self, title: &str, image: &RgbImage) -> Result<()> {
        let due = self.count % u64::from(self.every) == 0;
        self.count += 1;
        if !due {
            return Ok(());
        }
        let path = self.dir.join(format!("{title}.png"));
        image
            .save(&path)
            .map_err(|e| GlowError::Preview(format!("{}: {}", path.display(), e)))?;
        debug!("Wrote preview {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Bgr;
    use crate::sampler::SampledEdge;

    fn edges(layout: &EdgeLayout, color: impl Fn(Edge, usize) -> Bgr) -> SampledEdges {
        let sampled = |edge: Edge| SampledEdge {
            edge,
            samples: (0..layout.strip(edge).samples).map(|i| color(edge, i)).collect(),
        };
        SampledEdges {
            top: sampled(Edge::Top),
            right: sampled(Edge::Right),
            bottom: sampled(Edge::Bottom),
            left: sampled(Edge::Left),
        }
    }

    #[test]
    fn test_segment_bounds_tile_the_side() {
        let n = 56;
        let mut prev = 20;
        for i in 0..n {
            let (x0, x1) = segment_bounds(i, n, 20, 400);
            assert_eq!(x0, prev);
            assert!(x1 > x0);
            prev = x1;
        }
        assert_eq!(prev, 420);
    }

    #[test]
    fn test_compose_layout() {
        let working = Size::new(40, 20);
        let layout = EdgeLayout::with_margin(working, 5, [2, 1, 2, 1]);
        let compositor = DebugCompositor::new(layout.clone(), working, 4);
        assert_eq!(compositor.canvas_size(), Size::new(48, 28));

        let frame = Frame::filled(40, 20, Bgr::new(0, 0, 9));
        let sampled = edges(&layout, |edge, i| match edge {
            Edge::Top => Bgr::new(0, 0, 100 + i as u8),
            Edge::Right => Bgr::new(0, 50, 0),
            Edge::Bottom => Bgr::new(200 + i as u8, 0, 0),
            Edge::Left => Bgr::new(0, 60, 0),
        });
        let image = compositor.compose(&frame, &sampled);

        assert_eq!(*image.get_pixel(4, 4), Rgb([9, 0, 0]));
        assert_eq!(*image.get_pixel(43, 23), Rgb([9, 0, 0]));
        // top segments in natural left-to-right order
        assert_eq!(*image.get_pixel(5, 0), Rgb([100, 0, 0]));
        assert_eq!(*image.get_pixel(42, 3), Rgb([101, 0, 0]));
        // bottom drawn left-to-right as well; reversal only applies to the strip
        assert_eq!(*image.get_pixel(5, 27), Rgb([0, 0, 200]));
        assert_eq!(*image.get_pixel(42, 24), Rgb([0, 0, 201]));
        assert_eq!(*image.get_pixel(46, 10), Rgb([0, 50, 0]));
        assert_eq!(*image.get_pixel(1, 10), Rgb([0, 60, 0]));
        // corners stay dark
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(47, 27), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_snapshot_window_writes_every_nth() {
        let dir = tempfile::tempdir().unwrap();
        let config = PreviewConfig {
            enabled: true,
            target: PreviewTarget::Snapshot,
            border: 2,
            dir: dir.path().join("out"),
            every: 2,
        };
        let mut window = SnapshotWindow::open(&config).unwrap();
        let path = config.dir.join("output.png");

        let image = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        window.render("output", &image).unwrap();
        assert!(path.exists());

        fs::remove_file(&path).unwrap();
        window.render("output", &image).unwrap();
        assert!(!path.exists());
        window.render("output", &image).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), image);
    }

    #[test]
    fn test_pack_rgb_words() {
        let mut image = RgbImage::from_pixel(2, 1, Rgb([0x12, 0x34, 0x56]));
        image.put_pixel(1, 0, Rgb([255, 0, 1]));
        let mut words = vec![7; 9];
        pack_rgb(&image, &mut words);
        assert_eq!(words, vec![0x0012_3456, 0x00ff_0001]);
    }

    #[test]
    fn test_open_preview_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GlowConfig::default();
        assert!(open_preview(&config, "output").unwrap().is_none());

        config.preview.enabled = true;
        config.preview.target = PreviewTarget::Snapshot;
        config.preview.dir = dir.path().join("shots");
        let preview = open_preview(&config, "output").unwrap().unwrap();
        assert_eq!(preview.compositor.canvas_size(), Size::new(440, 360));
        assert!(config.preview.dir.is_dir());
    }
}
