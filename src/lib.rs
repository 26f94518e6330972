//! Crowd Player - Real-time playback of crowd-simulation streams.
//!
//! This crate reads the binary stream a crowd simulator writes (people
//! positions, headings, density fields and final statistics) and replays it
//! through a render sink, paced to the simulation's own clock.
//!
//! # Architecture
//!
//! - `protocol`: byte reader, message decoder and the matching encoder
//! - `playback`: wall-clock pacing and the playback state machine
//! - `render`: the render sink interface, density overlay and sprite table
//! - `schema`: player configuration
//! - `synth`: synthetic simulator output for demos
//!
//! # Example
//!
//! ```rust,no_run
//! use std::io;
//!
//! use crowd_player::{
//!     playback::{SystemClock, play},
//!     render::HeadlessRenderer,
//!     schema::PlayerConfig,
//! };
//!
//! let config = PlayerConfig::default();
//! let mut renderer = HeadlessRenderer::new(&config.window_title);
//!
//! let report = play(io::stdin().lock(), &mut renderer, SystemClock::new(), &config)?;
//! if let Some(summary) = &report.summary {
//!     println!("{}", summary);
//! }
//! # Ok::<(), crowd_player::PlayerError>(())
//! ```

pub mod error;
pub mod playback;
pub mod protocol;
pub mod render;
pub mod schema;
pub mod synth;

// Re-export commonly used types
pub use error::PlayerError;
pub use playback::{PlaybackReport, PlaybackScheduler, play};
pub use protocol::{Message, MessageDecoder, MessageWriter};
pub use render::{HeadlessRenderer, RenderSink};
pub use schema::PlayerConfig;
