//! Real-time playback of a decoded simulator stream.
//!
//! The scheduler runs a small state machine:
//!
//! ```text
//! Streaming ──statistics──> ShowingSummary ──dismiss──> ShutDown
//!     └────────────end of stream─────────────────────────────┘
//! ```
//!
//! While streaming, every message produces exactly one presented frame. A
//! frame is held back until the wall clock has caught up with the latest
//! `CurrentTime`; frames are never dropped when playback falls behind.

mod clock;
mod scheduler;
mod summary;

use std::io::BufRead;

pub use clock::{Clock, PlaybackClock, SystemClock, VirtualClock};
pub use scheduler::{
    EndReason, PlaybackOptions, PlaybackReport, PlaybackScheduler, PlaybackState, SceneAssets,
};
pub use summary::StatisticsSummary;

use crate::error::PlayerError;
use crate::protocol::{ByteReader, MessageDecoder};
use crate::render::RenderSink;
use crate::schema::PlayerConfig;

/// Read the handshake from `input`, load the scene into `sink` and play the
/// stream to the end.
pub fn play<R, S, C>(
    input: R,
    sink: &mut S,
    clock: C,
    config: &PlayerConfig,
) -> Result<PlaybackReport, PlayerError>
where
    R: BufRead,
    S: RenderSink,
    C: Clock,
{
    let mut decoder = MessageDecoder::new(
        ByteReader::new(input, config.float_order),
        config.decode_limits(),
    );
    let init = decoder.read_handshake()?;
    let assets = SceneAssets::load(sink, &init, &config.sprite_path, config.sprite_scale)?;

    PlaybackScheduler::new(decoder, sink, clock, assets)
        .with_options(config.playback_options())
        .run()
}
