//! The playback state machine.

use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, trace, warn};

use super::clock::{Clock, PlaybackClock};
use super::summary::StatisticsSummary;
use crate::error::PlayerError;
use crate::protocol::{DensitySample, InitMessage, Message, MessageDecoder, PersonPose};
use crate::render::{DensityThresholds, RenderError, RenderSink, SpriteTable};

/// Tunables for one playback run.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackOptions {
    /// Hold frames back until the wall clock catches up with simulation time.
    pub pace: bool,
    /// Sleep between dismiss-signal polls while the summary is shown.
    pub poll_interval: Duration,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            pace: true,
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Textures and colour map loaded once from the handshake.
pub struct SceneAssets<I> {
    /// Scene drawn under every frame.
    pub background: I,
    /// Person sprite at every rotation.
    pub sprites: SpriteTable<I>,
    pub thresholds: DensityThresholds,
}

impl<I: Send> SceneAssets<I> {
    /// Load the background named in the handshake and the person sprite.
    ///
    /// The sprite is drawn at `scene_scale / sprite_scale`, where
    /// `sprite_scale` is the sprite artwork's own pixels per simulation unit.
    pub fn load<S>(
        sink: &mut S,
        init: &InitMessage,
        sprite_path: &Path,
        sprite_scale: f64,
    ) -> Result<Self, RenderError>
    where
        S: RenderSink<Image = I>,
    {
        let background = sink.load_background(Path::new(&init.scene_file))?;

        let scale = init.scene_scale / sprite_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RenderError::ResourceLoad {
                path: sprite_path.to_path_buf(),
                reason: format!(
                    "invalid sprite scale {} (scene scale {} / sprite scale {})",
                    scale, init.scene_scale, sprite_scale
                ),
            });
        }
        let sprites = sink.load_agent_sprites(sprite_path, scale)?;

        Ok(Self {
            background,
            sprites,
            thresholds: DensityThresholds::new(init.density_min, init.density_max),
        })
    }
}

/// Where the scheduler is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Streaming,
    ShowingSummary(StatisticsSummary),
    ShutDown,
}

/// Why streaming stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Statistics arrived and the summary was dismissed.
    Dismissed,
    /// The producer closed the stream before sending statistics.
    EndOfStream,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    /// Messages decoded, unknown tags included.
    pub messages: u64,
    /// Unknown tag bytes that were skipped.
    pub unknown_tags: u64,
    /// Frames handed to the sink, summary frames included.
    pub frames_presented: u64,
    /// Density samples that fell outside the scene and were skipped.
    pub out_of_bounds_cells: u64,
    /// Statistics shown before the summary was dismissed.
    pub summary: Option<StatisticsSummary>,
    pub ended_by: EndReason,
}

/// Drives the render sink from the decoded stream, paced to simulation time.
///
/// Usage:
/// ```ignore
/// let assets = SceneAssets::load(&mut renderer, &init, sprite_path, 1.0)?;
/// let report = PlaybackScheduler::new(decoder, &mut renderer, SystemClock::new(), assets)
///     .run()?;
/// ```
pub struct PlaybackScheduler<'a, R, S: RenderSink, C> {
    decoder: MessageDecoder<R>,
    sink: &'a mut S,
    clock: C,
    assets: SceneAssets<S::Image>,
    options: PlaybackOptions,
    timeline: PlaybackClock,
    banner: Option<S::Image>,
    frames_presented: u64,
    out_of_bounds_cells: u64,
    ended_by: EndReason,
}

impl<'a, R, S, C> PlaybackScheduler<'a, R, S, C>
where
    R: BufRead,
    S: RenderSink,
    C: Clock,
{
    pub fn new(
        decoder: MessageDecoder<R>,
        sink: &'a mut S,
        clock: C,
        assets: SceneAssets<S::Image>,
    ) -> Self {
        let timeline = PlaybackClock::start(clock.now());
        Self {
            decoder,
            sink,
            clock,
            assets,
            options: PlaybackOptions::default(),
            timeline,
            banner: None,
            frames_presented: 0,
            out_of_bounds_cells: 0,
            ended_by: EndReason::EndOfStream,
        }
    }

    pub fn with_options(mut self, options: PlaybackOptions) -> Self {
        self.options = options;
        self
    }

    /// Play the stream to completion, then release the sink.
    ///
    /// Any decode or render failure aborts immediately; the sink is not shut
    /// down in that case.
    pub fn run(mut self) -> Result<PlaybackReport, PlayerError> {
        self.timeline = PlaybackClock::start(self.clock.now());
        info!("Streaming");

        let mut state = PlaybackState::Streaming;
        let mut summary = None;
        while !matches!(state, PlaybackState::ShutDown) {
            state = match state {
                PlaybackState::Streaming => {
                    let next = self.stream_step()?;
                    if let PlaybackState::ShowingSummary(current) = &next {
                        info!("Showing summary: {}", current);
                    }
                    next
                }
                PlaybackState::ShowingSummary(current) => {
                    if self.summary_step(&current)? {
                        summary = Some(current);
                        PlaybackState::ShutDown
                    } else {
                        PlaybackState::ShowingSummary(current)
                    }
                }
                PlaybackState::ShutDown => PlaybackState::ShutDown,
            };
        }

        let report = PlaybackReport {
            messages: self.decoder.messages_decoded(),
            unknown_tags: self.decoder.unknown_tags(),
            frames_presented: self.frames_presented,
            out_of_bounds_cells: self.out_of_bounds_cells,
            summary,
            ended_by: self.ended_by,
        };
        self.shutdown();
        Ok(report)
    }

    /// Decode and draw one message.
    fn stream_step(&mut self) -> Result<PlaybackState, PlayerError> {
        if !self.decoder.wait_ready()? {
            info!(
                "Stream ended after {} messages without statistics",
                self.decoder.messages_decoded()
            );
            self.ended_by = EndReason::EndOfStream;
            return Ok(PlaybackState::ShutDown);
        }

        self.sink.clear_frame();
        self.sink.draw_image(&self.assets.background)?;

        let mut next = PlaybackState::Streaming;
        match self.decoder.decode_next()? {
            Message::CurrentTime { timestamp } => self.timeline.set_simulation_time(timestamp),
            Message::Locations { people } => self.draw_people(&people)?,
            Message::DensityMap { cells } => self.apply_density(&cells)?,
            Message::Statistics(stats) => {
                next = PlaybackState::ShowingSummary(StatisticsSummary::new(stats));
            }
            Message::Unknown { .. } => {}
        }

        self.pace();
        self.present()?;
        Ok(next)
    }

    fn draw_people(&mut self, people: &[PersonPose]) -> Result<(), PlayerError> {
        for person in people {
            let sprite = self.assets.sprites.for_heading(person.heading);
            self.sink.draw_agent(sprite, person.x, person.y)?;
        }
        Ok(())
    }

    fn apply_density(&mut self, cells: &[DensitySample]) -> Result<(), PlayerError> {
        self.sink.clear_density_grid();
        let mut skipped = 0u64;
        for cell in cells {
            let color = self.assets.thresholds.color(cell.density);
            if !self.sink.set_density_cell(cell.x, cell.y, color) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            warn!(
                "Skipped {} of {} density cells outside the scene",
                skipped,
                cells.len()
            );
            self.out_of_bounds_cells += skipped;
        }
        self.sink.draw_density_overlay()?;
        Ok(())
    }

    /// Sleep until the wall clock reaches the current simulation time.
    fn pace(&mut self) {
        if !self.options.pace {
            return;
        }
        let now = self.clock.now();
        match self.timeline.delay(now) {
            Some(delay) => {
                debug!("Ahead of data by {:.3} s, waiting", delay.as_secs_f64());
                self.clock.sleep(delay);
            }
            None => trace!("Behind data by {:.3} s", -self.timeline.lead(now)),
        }
    }

    fn present(&mut self) -> Result<(), PlayerError> {
        self.sink.present()?;
        self.frames_presented += 1;
        Ok(())
    }

    /// Show the banner once and check for dismissal. Returns `true` once
    /// dismissed.
    fn summary_step(&mut self, summary: &StatisticsSummary) -> Result<bool, PlayerError> {
        if self.banner.is_none() {
            self.banner = Some(self.sink.render_statistics_banner(summary.text())?);
        }

        self.sink.clear_frame();
        self.sink.draw_image(&self.assets.background)?;
        if let Some(banner) = &self.banner {
            self.sink.draw_image(banner)?;
        }
        self.present()?;

        if self.sink.poll_dismiss_signal() {
            info!("Summary dismissed");
            self.ended_by = EndReason::Dismissed;
            return Ok(true);
        }
        self.clock.sleep(self.options.poll_interval);
        Ok(false)
    }

    fn shutdown(self) {
        let Self {
            sink,
            assets,
            banner,
            ..
        } = self;
        drop(banner);
        drop(assets);
        sink.shutdown();
    }
}
