//! Top-level error type of the player.

use std::io;
use std::path::PathBuf;

use crate::protocol::{DecodeError, StreamError};
use crate::render::RenderError;
use crate::schema::ConfigError;

/// Every failure that ends a playback run.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Cannot open input {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot write stream: {0}")]
    Output(#[source] io::Error),
}

impl From<StreamError> for PlayerError {
    fn from(e: StreamError) -> Self {
        PlayerError::Decode(DecodeError::Stream(e))
    }
}

impl PlayerError {
    /// Component tag printed in front of the message on stderr.
    pub fn subsystem(&self) -> &'static str {
        match self {
            PlayerError::Decode(DecodeError::Stream(_)) | PlayerError::Input { .. } => "Reader",
            PlayerError::Decode(_) => "Decoder",
            PlayerError::Render(_) => "Renderer",
            PlayerError::Config(_) => "Config",
            PlayerError::Output(_) => "Writer",
        }
    }

    /// The single line written to stderr before exiting.
    pub fn diagnostic(&self) -> String {
        format!("[{}] {}", self.subsystem(), self)
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
