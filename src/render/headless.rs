//! Window-less [`RenderSink`] that keeps frames in memory.
//!
//! Used when the player runs without a display (CI, offline dumps, piping a
//! run through for its statistics) and as the sink in tests. Images are not
//! rasterised; the renderer reads their pixel size from the SVG resource and
//! records what would have been drawn.

use std::fs;
use std::path::Path;

use log::{debug, info, trace};

use super::density::DensityGrid;
use super::sprites::SpriteTable;
use super::{RenderError, RenderSink};

/// Faded backdrop the statistics banner is drawn on (ARGB).
pub const BANNER_OVERLAY_COLOR: u32 = 0xDD99_9999;

/// What a [`HeadlessImage`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Background,
    Sprite { degree: u16 },
    Banner,
}

/// Texture stand-in: its role and pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessImage {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    Image(ImageKind),
    Agent { x: i16, y: i16, degree: u16 },
    DensityOverlay { active_cells: usize },
}

/// In-memory render target.
pub struct HeadlessRenderer {
    title: String,
    scene: Option<(u32, u32)>,
    density: DensityGrid,
    pending: Vec<DrawOp>,
    /// Presented frames, kept only when capture is enabled.
    captured: Option<Vec<Vec<DrawOp>>>,
    frames_presented: u64,
    banner_text: Option<String>,
    banner_overlay: Option<u32>,
    polls: u32,
    dismiss_after_polls: u32,
    shut_down: bool,
}

impl HeadlessRenderer {
    pub fn new(title: &str) -> Self {
        info!("Headless renderer \"{}\" ready", title);
        Self {
            title: title.to_string(),
            scene: None,
            density: DensityGrid::new(0, 0),
            pending: Vec::new(),
            captured: None,
            frames_presented: 0,
            banner_text: None,
            banner_overlay: None,
            polls: 0,
            dismiss_after_polls: 1,
            shut_down: false,
        }
    }

    /// Keep every presented frame for later inspection.
    pub fn with_capture(mut self) -> Self {
        self.captured = Some(Vec::new());
        self
    }

    /// Report the dismiss signal on the `polls`-th poll (at least one).
    pub fn with_dismiss_after(mut self, polls: u32) -> Self {
        self.dismiss_after_polls = polls.max(1);
        self
    }

    /// Scene size in pixels, once the background is loaded.
    pub fn scene_size(&self) -> Option<(u32, u32)> {
        self.scene
    }

    pub fn density_grid(&self) -> &DensityGrid {
        &self.density
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn captured_frames(&self) -> &[Vec<DrawOp>] {
        self.captured.as_deref().unwrap_or(&[])
    }

    pub fn banner_text(&self) -> Option<&str> {
        self.banner_text.as_deref()
    }

    /// Colour of the faded backdrop behind the banner text.
    pub fn banner_overlay(&self) -> Option<u32> {
        self.banner_overlay
    }

    pub fn dismiss_polls(&self) -> u32 {
        self.polls
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn load_svg_size(path: &Path) -> Result<(f64, f64), RenderError> {
        let load_error = |reason: String| RenderError::ResourceLoad {
            path: path.to_path_buf(),
            reason,
        };
        let data = fs::read(path).map_err(|e| load_error(e.to_string()))?;
        svg_size(&data).map_err(|e| load_error(e.to_string()))
    }

    fn scene_or_err(&self) -> Result<(u32, u32), RenderError> {
        self.scene
            .ok_or_else(|| RenderError::Render("background has not been loaded".to_string()))
    }
}

impl RenderSink for HeadlessRenderer {
    type Image = HeadlessImage;

    fn load_background(&mut self, path: &Path) -> Result<HeadlessImage, RenderError> {
        let (w, h) = Self::load_svg_size(path)?;
        let (width, height) = (w.round() as u32, h.round() as u32);
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceLoad {
                path: path.to_path_buf(),
                reason: format!("empty scene ({}x{})", w, h),
            });
        }

        info!("Scene {} is {}x{}", path.display(), width, height);
        self.scene = Some((width, height));
        self.density = DensityGrid::new(width, height);

        Ok(HeadlessImage {
            kind: ImageKind::Background,
            width,
            height,
        })
    }

    fn load_agent_sprites(
        &mut self,
        path: &Path,
        scale: f64,
    ) -> Result<SpriteTable<HeadlessImage>, RenderError> {
        let (w, h) = Self::load_svg_size(path)?;
        let (width, height) = ((w * scale).round() as u32, (h * scale).round() as u32);
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceLoad {
                path: path.to_path_buf(),
                reason: format!("sprite scaled by {} is empty", scale),
            });
        }

        debug!(
            "Pre-rotating sprite {} at {}x{}",
            path.display(),
            width,
            height
        );
        SpriteTable::build(|degree| {
            Ok(HeadlessImage {
                kind: ImageKind::Sprite { degree },
                width,
                height,
            })
        })
    }

    fn clear_frame(&mut self) {
        self.pending.clear();
    }

    fn draw_image(&mut self, image: &HeadlessImage) -> Result<(), RenderError> {
        self.pending.push(DrawOp::Image(image.kind));
        Ok(())
    }

    fn draw_agent(&mut self, sprite: &HeadlessImage, x: i16, y: i16) -> Result<(), RenderError> {
        match sprite.kind {
            ImageKind::Sprite { degree } => {
                self.pending.push(DrawOp::Agent { x, y, degree });
                Ok(())
            }
            other => Err(RenderError::Render(format!(
                "{:?} image used as an agent sprite",
                other
            ))),
        }
    }

    fn clear_density_grid(&mut self) {
        self.density.clear();
    }

    fn set_density_cell(&mut self, x: i16, y: i16, color: u32) -> bool {
        self.density.set(x as i32, y as i32, color)
    }

    fn draw_density_overlay(&mut self) -> Result<(), RenderError> {
        self.scene_or_err()?;
        self.pending.push(DrawOp::DensityOverlay {
            active_cells: self.density.active_cells(),
        });
        Ok(())
    }

    fn render_statistics_banner(&mut self, text: &str) -> Result<HeadlessImage, RenderError> {
        let (width, height) = self.scene_or_err()?;
        info!("Simulation done: {}", text);
        self.banner_overlay = Some(BANNER_OVERLAY_COLOR);
        self.banner_text = Some(text.to_string());
        Ok(HeadlessImage {
            kind: ImageKind::Banner,
            width,
            height,
        })
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if self.shut_down {
            return Err(RenderError::Render(
                "present after shutdown".to_string(),
            ));
        }
        self.frames_presented += 1;
        trace!(
            "Frame {}: {} draw calls",
            self.frames_presented,
            self.pending.len()
        );
        if let Some(captured) = self.captured.as_mut() {
            captured.push(std::mem::take(&mut self.pending));
        } else {
            self.pending.clear();
        }
        Ok(())
    }

    fn poll_dismiss_signal(&mut self) -> bool {
        self.polls += 1;
        self.polls >= self.dismiss_after_polls
    }

    fn shutdown(&mut self) {
        self.density = DensityGrid::new(0, 0);
        self.pending = Vec::new();
        self.shut_down = true;
        info!(
            "Headless renderer \"{}\" shut down after {} frames",
            self.title, self.frames_presented
        );
    }
}

/// Pixel size of an SVG document.
///
/// Absolute units are converted to pixels at 96 DPI; without a usable
/// `width`/`height` the `viewBox` size is used.
pub fn svg_size(data: &[u8]) -> Result<(f64, f64), usvg::Error> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())?;
    let size = tree.size();
    Ok((size.width() as f64, size.height() as f64))
}
