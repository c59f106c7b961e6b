//! Mount lifecycle and the shared animation phase.
//!
//! ```text
//!            mount                 progress > 0            progress ≥ 99
//! Unmounted ──────▶ Idle ─────────────────────▶ Animating ───────────────▶ Terminal
//!     ▲                                                                        │
//!     └──────────────────────────────── unmount ───────────────────────────────┘
//! ```
//!
//! Transitions are driven solely by the progress signal the host reports.
//! Nothing here owns a timer or advances progress on its own. `Terminal`
//! latches: it only clears on the next mount.

use crate::progress::ProgressSignal;
use std::fmt;

/// Animation phase shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Mounted, no progress reported yet.
    #[default]
    Idle,
    /// Progress is moving.
    Animating,
    /// Completion reached; ambient animation gives way to the whiteout.
    Terminal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Animating => write!(f, "animating"),
            Phase::Terminal => write!(f, "terminal"),
        }
    }
}

/// Tracks whether the engine is mounted and which phase it is in.
///
/// `mount` and `unmount` are idempotent: calling either redundantly (e.g.
/// while recovering from a lost rendering context) is harmless and reports
/// that nothing changed.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    mounted: bool,
    generation: u32,
    phase: Phase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount; returns `true` if this call changed anything.
    ///
    /// Every effective mount starts a new generation in the idle phase.
    pub fn mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        self.generation = self.generation.wrapping_add(1);
        self.phase = Phase::Idle;
        log::debug!("mounted (generation {})", self.generation);
        true
    }

    /// Unmount; returns `true` if this call changed anything.
    pub fn unmount(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        self.mounted = false;
        self.phase = Phase::Idle;
        log::debug!("unmounted (generation {})", self.generation);
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Number of effective mounts so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Update the phase from a progress sample.
    ///
    /// Returns the previous phase when it changed. Ignored while unmounted.
    pub fn observe(&mut self, progress: ProgressSignal) -> Option<Phase> {
        if !self.mounted || self.phase == Phase::Terminal {
            return None;
        }
        let next = if progress.is_terminal() {
            Phase::Terminal
        } else if progress.is_started() {
            Phase::Animating
        } else {
            Phase::Idle
        };
        if next == self.phase {
            return None;
        }
        log::debug!("phase {} -> {}", self.phase, next);
        Some(std::mem::replace(&mut self.phase, next))
    }
}
