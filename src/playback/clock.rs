//! Wall-clock abstraction and the pacing arithmetic built on it.

use std::thread;
use std::time::{Duration, Instant};

/// Source of wall-clock time for the playback loop.
///
/// # Implementations
///
/// - [`SystemClock`]: monotonic OS time, real sleeps
/// - [`VirtualClock`]: sleeping advances a counter; used for deterministic tests
pub trait Clock {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Suspend the calling thread.
    fn sleep(&mut self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Monotonic OS clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Clock that only moves when slept on or advanced by hand.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.iter().sum()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now += duration;
    }
}

/// Alignment between simulation time and wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    start: Duration,
    simulation_time: f64,
}

impl PlaybackClock {
    /// Start the timeline at wall-clock `now` and simulation time 0.
    pub fn start(now: Duration) -> Self {
        Self {
            start: now,
            simulation_time: 0.0,
        }
    }

    pub fn set_simulation_time(&mut self, seconds: f64) {
        self.simulation_time = seconds;
    }

    /// Signed lead of the data over the wall clock, in seconds.
    pub fn lead(&self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.start).as_secs_f64();
        self.simulation_time - elapsed
    }

    /// How long to wait before presenting, if playback is ahead of the data.
    ///
    /// `None` when the frame is due (or overdue), when the lead is below one
    /// nanosecond, and for leads that are not a representable duration (NaN
    /// or infinite timestamps).
    pub fn delay(&self, now: Duration) -> Option<Duration> {
        let lead = self.lead(now);
        if lead > 0.0 {
            Duration::try_from_secs_f64(lead)
                .ok()
                .filter(|d| !d.is_zero())
        } else {
            None
        }
    }
}
