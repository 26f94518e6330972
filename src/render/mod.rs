//! Rendering collaborator interface.
//!
//! The playback loop never touches pixels itself. It drives a [`RenderSink`],
//! which owns the window (or an in-memory stand-in), the textures and the
//! density overlay buffer.

mod density;
mod headless;
mod sprites;

use std::path::{Path, PathBuf};

pub use density::{CLEAR_COLOR, DensityGrid, DensityThresholds};
pub use headless::{
    BANNER_OVERLAY_COLOR, DrawOp, HeadlessImage, HeadlessRenderer, ImageKind, svg_size,
};
pub use sprites::{DEGREES, SpriteTable, heading_to_degree};

/// Rendering failures. All of them are fatal for playback.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to load {}: {reason}", .path.display())]
    ResourceLoad { path: PathBuf, reason: String },
    #[error("Render error: {0}")]
    Render(String),
}

/// Surface the playback scheduler draws on.
///
/// Calls for one frame arrive as `clear_frame`, a number of draw calls, then
/// a single `present`.
pub trait RenderSink {
    /// Handle to a texture owned by the sink.
    type Image: Send;

    /// Load the scene background and size the density grid to match it.
    fn load_background(&mut self, path: &Path) -> Result<Self::Image, RenderError>;

    /// Load the person sprite pre-rotated to every integer degree.
    fn load_agent_sprites(
        &mut self,
        path: &Path,
        scale: f64,
    ) -> Result<SpriteTable<Self::Image>, RenderError>;

    fn clear_frame(&mut self);

    /// Draw an image at the scene origin.
    fn draw_image(&mut self, image: &Self::Image) -> Result<(), RenderError>;

    /// Draw a pre-rotated sprite centred on `(x, y)`.
    fn draw_agent(&mut self, sprite: &Self::Image, x: i16, y: i16) -> Result<(), RenderError>;

    /// Reset every density cell to fully transparent.
    fn clear_density_grid(&mut self);

    /// Set one density cell. Returns `false` if `(x, y)` is outside the scene.
    fn set_density_cell(&mut self, x: i16, y: i16, color: u32) -> bool;

    /// Composite the density grid over the current frame.
    fn draw_density_overlay(&mut self) -> Result<(), RenderError>;

    /// Compose the end-of-simulation banner for `text`.
    fn render_statistics_banner(&mut self, text: &str) -> Result<Self::Image, RenderError>;

    fn present(&mut self) -> Result<(), RenderError>;

    /// Non-blocking check for the user's request to close the summary.
    fn poll_dismiss_signal(&mut self) -> bool;

    /// Release the window and any buffers still held by the sink.
    fn shutdown(&mut self);
}
