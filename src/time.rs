//! Host-side frame clock.
//!
//! The engine itself never reads a clock; it is handed absolute time values.
//! [`FrameClock`] is what a host render loop uses to produce them: wall time
//! with pause and restart, or a manual clock stepped by hand for tests and
//! offline rendering.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! loop {
//!     let t = clock.tick();
//!     portal.step(t, progress);
//! }
//! ```

use std::time::{Duration, Instant};

/// Largest delta reported for one frame (seconds).
///
/// A stalled window reports at most this much so per-frame effects do not
/// lurch after a pause in event delivery.
pub const MAX_DELTA: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
enum Source {
    Wall { start: Instant, last: Instant },
    Manual { now: f32 },
}

/// Elapsed time, delta time, frame count and FPS for a render loop.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    elapsed: f32,
    delta: f32,
    frame: u64,
    fps: f32,
    fps_frames: u64,
    fps_window: f32,
    paused: bool,
    /// Wall time spent paused, subtracted from elapsed.
    paused_for: Duration,
}

impl FrameClock {
    /// How often FPS is recomputed (seconds).
    const FPS_WINDOW: f32 = 0.5;

    /// Clock reading wall time from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self::with_source(Source::Wall { start: now, last: now })
    }

    /// Clock that only moves when [`FrameClock::advance`] is called.
    pub fn manual() -> Self {
        Self::with_source(Source::Manual { now: 0.0 })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            elapsed: 0.0,
            delta: 0.0,
            frame: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_window: 0.0,
            paused: false,
            paused_for: Duration::ZERO,
        }
    }

    /// Step a manual clock forward by `seconds`. No effect on a wall clock.
    pub fn advance(&mut self, seconds: f32) {
        if let Source::Manual { now } = &mut self.source {
            if seconds.is_finite() && seconds > 0.0 {
                *now += seconds;
            }
        }
    }

    /// Sample the clock for a new frame and return the elapsed time.
    pub fn tick(&mut self) -> f32 {
        let (elapsed, raw_delta) = match &mut self.source {
            Source::Wall { start, last } => {
                let now = Instant::now();
                let raw = now.duration_since(*last).as_secs_f32();
                *last = now;
                if self.paused {
                    self.paused_for += Duration::from_secs_f32(raw);
                }
                let running = now.duration_since(*start).saturating_sub(self.paused_for);
                (running.as_secs_f32(), raw)
            }
            Source::Manual { now } => (*now, *now - self.elapsed),
        };

        if self.paused {
            self.delta = 0.0;
            if let Source::Manual { now } = &mut self.source {
                *now = self.elapsed;
            }
            return self.elapsed;
        }

        self.delta = raw_delta.clamp(0.0, MAX_DELTA);
        self.elapsed = elapsed.max(self.elapsed);
        self.frame += 1;

        self.fps_window += raw_delta.max(0.0);
        if self.fps_window >= Self::FPS_WINDOW {
            self.fps = (self.frame - self.fps_frames) as f32 / self.fps_window;
            self.fps_frames = self.frame;
            self.fps_window = 0.0;
        }

        self.elapsed
    }

    /// Seconds since start, excluding pauses.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds covered by the last tick, capped at [`MAX_DELTA`].
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Ticks since start (paused ticks excluded).
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Frames per second over the last measurement window.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze elapsed time.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continue from where the clock was paused.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Start over from zero, keeping the clock source kind.
    pub fn restart(&mut self) {
        let source = match self.source {
            Source::Wall { .. } => {
                let now = Instant::now();
                Source::Wall { start: now, last: now }
            }
            Source::Manual { .. } => Source::Manual { now: 0.0 },
        };
        *self = Self::with_source(source);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
