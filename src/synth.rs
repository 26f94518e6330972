//! Synthetic simulator output for demos and benchmarks.
//!
//! Produces the stream the crowd simulator would: a handshake, then per tick a
//! `CurrentTime`, a `DensityMap` once per simulated second, and `Locations`.
//! People walk towards the right-hand edge of the scene and leave once they
//! reach it; their travel times feed the closing `Statistics`.

use std::io::{self, Write};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::protocol::{DensitySample, InitMessage, Message, MessageWriter, PersonPose, Statistics};

/// Shape of the generated run.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Scene resource named in the handshake.
    pub scene_file: String,
    /// Scene width in pixels.
    pub width: u16,
    /// Scene height in pixels.
    pub height: u16,
    /// People walking at the start.
    pub people: usize,
    /// Ticks to simulate at most.
    pub ticks: u32,
    /// Simulated seconds per tick.
    pub tick: f64,
    /// Walking speed in pixels per simulated second.
    pub speed: f64,
    /// Side of a density bucket in pixels.
    pub density_cell: u16,
    /// Density colour map lower threshold; sparser buckets are not sent.
    pub density_min: f64,
    /// Density colour map upper threshold.
    pub density_max: f64,
    /// RNG seed; equal seeds give identical streams.
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            scene_file: "scene.svg".to_string(),
            width: 640,
            height: 480,
            people: 50,
            ticks: 600,
            tick: 0.1,
            speed: 60.0,
            density_cell: 16,
            density_min: 1.0,
            density_max: 5.0,
            seed: 42,
        }
    }
}

/// Running min/max/mean/variance over travel times.
#[derive(Debug, Clone, Copy)]
struct TravelTimes {
    min: f64,
    max: f64,
    sum: f64,
    sum_of_squares: f64,
    count: u32,
}

impl TravelTimes {
    fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            sum_of_squares: 0.0,
            count: 0,
        }
    }

    fn record(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.sum_of_squares += value * value;
        self.count += 1;
    }

    fn statistics(&self) -> Statistics {
        if self.count == 0 {
            return Statistics {
                min: 0.0,
                max: 0.0,
                count: 0,
                avg: 0.0,
                variance: 0.0,
                std_deviation: 0.0,
            };
        }
        let n = self.count as f64;
        let avg = self.sum / n;
        let variance = (self.sum_of_squares / n - avg * avg).max(0.0);
        Statistics {
            min: self.min,
            max: self.max,
            count: self.count.min(i32::MAX as u32) as i32,
            avg,
            variance,
            std_deviation: variance.sqrt(),
        }
    }
}

struct Walker {
    x: f64,
    y: f64,
    heading: f64,
}

/// Write a complete synthetic run and return the statistics it ended with.
pub fn write_synthetic<W: Write>(
    writer: &mut MessageWriter<W>,
    config: &SyntheticConfig,
) -> io::Result<Statistics> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (width, height) = (config.width as f64, config.height as f64);

    writer.write_handshake(&InitMessage {
        scene_file: config.scene_file.clone(),
        scene_scale: 1.0,
        density_min: config.density_min,
        density_max: config.density_max,
    })?;

    let mut walkers: Vec<Walker> = (0..config.people)
        .map(|_| Walker {
            x: rng.gen_range(0.0..width * 0.25),
            y: rng.gen_range(0.0..height),
            heading: rng.gen_range(-0.3..0.3),
        })
        .collect();

    let ticks_per_density = (1.0 / config.tick).ceil().max(1.0) as u32;
    let mut travel = TravelTimes::new();

    for tick in 0..config.ticks {
        let time = tick as f64 * config.tick;
        writer.write_message(&Message::CurrentTime { timestamp: time })?;

        if tick % ticks_per_density == 0 {
            writer.write_message(&density_map(&walkers, config))?;
        }

        writer.write_message(&Message::Locations {
            people: walkers
                .iter()
                .map(|w| PersonPose {
                    x: w.x.round() as i16,
                    y: w.y.round() as i16,
                    heading: w.heading,
                })
                .collect(),
        })?;

        let step = config.speed * config.tick;
        for walker in &mut walkers {
            walker.heading = (walker.heading + rng.gen_range(-0.1..0.1)).clamp(-1.0, 1.0);
            walker.x += step * walker.heading.cos();
            walker.y = (walker.y + step * walker.heading.sin()).clamp(0.0, height - 1.0);
        }
        walkers.retain(|w| {
            let arrived = w.x >= width - 1.0;
            if arrived {
                travel.record(time + config.tick);
            }
            !arrived
        });

        if walkers.is_empty() {
            break;
        }
    }

    let stats = travel.statistics();
    writer.write_message(&Message::Statistics(stats))?;
    writer.flush()?;
    Ok(stats)
}

/// Bucket people into square cells; cells above the minimum threshold are sent.
fn density_map(walkers: &[Walker], config: &SyntheticConfig) -> Message {
    let cell = config.density_cell.max(1) as usize;
    let cols = (config.width as usize).div_ceil(cell).max(1);
    let rows = (config.height as usize).div_ceil(cell).max(1);
    let mut counts = vec![0u32; cols * rows];
    for w in walkers {
        let col = (w.x.max(0.0) as usize / cell).min(cols - 1);
        let row = (w.y.max(0.0) as usize / cell).min(rows - 1);
        counts[row * cols + col] += 1;
    }

    let mut cells = Vec::new();
    for (i, &count) in counts.iter().enumerate() {
        let density = count as f64;
        if density <= config.density_min {
            continue;
        }
        let (col, row) = (i % cols, i / cols);
        for dy in 0..cell {
            for dx in 0..cell {
                let (x, y) = (col * cell + dx, row * cell + dy);
                if x < config.width as usize && y < config.height as usize {
                    cells.push(DensitySample {
                        x: x as i16,
                        y: y as i16,
                        density,
                    });
                }
            }
        }
    }
    Message::DensityMap { cells }
}
