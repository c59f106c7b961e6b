//! Simulated request progress for hosts without a real progress source.
//!
//! A pending request rarely reports progress, so the host fakes it: fast
//! steps up to the knee, slow steps after, never past the cap until the
//! request actually completes. Completion jumps straight to 100 and holds for
//! a short linger so the whiteout can play before the host hides the portal.
//!
//! ```ignore
//! let mut script = ProgressScript::new(0.0).with_complete_after(6.0);
//! match script.sample(now) {
//!     ScriptPhase::Loading(percent) | ScriptPhase::Completing(percent) => portal.step(now, percent),
//!     ScriptPhase::Finished => portal.unmount(),
//! }
//! ```

/// What the host should do at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptPhase {
    /// Request pending; simulated percent.
    Loading(f32),
    /// Request done; percent is 100 while the completion effect plays.
    Completing(f32),
    /// Linger elapsed; the host should unmount.
    Finished,
}

/// Tick-based progress simulation.
#[derive(Debug, Clone)]
pub struct ProgressScript {
    started_at: f32,
    percent: f32,
    ticks: u64,
    tick: f32,
    fast_step: f32,
    slow_step: f32,
    knee: f32,
    cap: f32,
    complete_after: Option<f32>,
    linger: f32,
}

impl ProgressScript {
    /// Start a run at `now` that never completes on its own.
    pub fn new(now: f32) -> Self {
        Self {
            started_at: now,
            percent: 0.0,
            ticks: 0,
            tick: 0.05,
            fast_step: 2.0,
            slow_step: 0.2,
            knee: 50.0,
            cap: 95.0,
            complete_after: None,
            linger: 0.5,
        }
    }

    /// Mark the simulated request complete `seconds` after start.
    pub fn with_complete_after(mut self, seconds: f32) -> Self {
        self.complete_after = Some(seconds.max(0.0));
        self
    }

    /// How long 100% is held before finishing.
    pub fn with_linger(mut self, seconds: f32) -> Self {
        self.linger = seconds.max(0.0);
        self
    }

    /// Interval between simulated increments.
    pub fn with_tick(mut self, seconds: f32) -> Self {
        self.tick = seconds.max(1e-3);
        self
    }

    /// Begin again at `now`, keeping the tuning.
    pub fn restart(&mut self, now: f32) {
        self.started_at = now;
        self.percent = 0.0;
        self.ticks = 0;
    }

    /// Percent reached by the tick simulation so far.
    pub fn percent(&self) -> f32 {
        self.percent
    }

    /// Advance to `now` and report the phase.
    ///
    /// Time that goes backwards is treated as no time passing.
    pub fn sample(&mut self, now: f32) -> ScriptPhase {
        let elapsed = (now - self.started_at).max(0.0);

        if let Some(done) = self.complete_after {
            if elapsed >= done + self.linger {
                return ScriptPhase::Finished;
            }
            if elapsed >= done {
                return ScriptPhase::Completing(100.0);
            }
        }

        let due = (elapsed / self.tick) as u64;
        while self.ticks < due && self.percent < self.cap {
            let step = if self.percent < self.knee {
                self.fast_step
            } else {
                self.slow_step
            };
            self.percent = (self.percent + step).min(self.cap);
            self.ticks += 1;
        }
        self.ticks = self.ticks.max(due);
        ScriptPhase::Loading(self.percent)
    }
}
