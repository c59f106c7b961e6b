//! Progress choreography: status text, transient flashes, the terminal
//! whiteout and a rolling process log.
//!
//! The choreographer turns a stream of progress samples into *edges*. The
//! host can call [`ProgressChoreographer::update`] as often as it likes with
//! the same sample; only real changes produce [`ChoreoEvent`]s.
//!
//! | Percent | Status | Console lines |
//! |---------|--------|---------------|
//! | `[0, 10)` | initializing | `// INIT_GPU_CLUSTERS` |
//! | `[10, 40)` | allocating | `// OPTIMIZING_NEURAL_PATH`, `>> ALLOCATING_VRAM` |
//! | `[40, 70)` | synchronizing | `// WEAVING_DATA_THREADS`, `>> SYNCHRONIZING_CORE` |
//! | `[70, 95)` | finalizing | `// RENDERING_REALITY`, `>> FINAL_COMPILE` |
//! | `[95, 100]` | complete | `>> EXECUTION_COMPLETE` |
//!
//! Status only moves forward within one cycle. A jump from 5% to 80%
//! goes straight to finalizing and a dip back below a boundary does not
//! regress it; [`ProgressChoreographer::reset`] starts a new cycle.

use crate::progress::{ProgressSignal, TERMINAL_PERCENT};
use crate::random::keyed;
use std::collections::VecDeque;
use std::fmt;

/// Percent values around which a flash fires.
pub const FLASH_THRESHOLDS: [f32; 3] = [25.0, 50.0, 75.0];

/// Half-width of the band around a flash threshold.
pub const FLASH_BAND: f32 = 1.0;

/// How long a flash stays up (seconds).
pub const FLASH_DURATION: f32 = 0.1;

/// Peak opacity of a flash.
pub const FLASH_OPACITY: f32 = 0.3;

/// Time for the whiteout to reach full opacity (seconds).
pub const WHITEOUT_RAMP: f32 = 0.1;

/// Process log lines kept for display.
pub const LOG_CAPACITY: usize = 5;

/// Process log lines and the percent each appears above.
const LOG_SCRIPT: [(f32, &str); 6] = [
    (5.0, "> CONNECTING_TO_SATELLITE..."),
    (20.0, "> HANDSHAKE_ESTABLISHED"),
    (40.0, "> DOWNLOADING_NEURAL_MAP..."),
    (60.0, "> DECRYPTING_GIFT_MATRIX..."),
    (80.0, "> OPTIMIZING_HOLOGRAM_CORE..."),
    (95.0, "> FINALIZING_RENDER_SEQUENCE"),
];

/// Coarse loading status, ordered by progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    Initializing,
    Allocating,
    Synchronizing,
    Finalizing,
    Complete,
}

impl Status {
    /// Status band containing `percent`.
    pub fn from_percent(percent: f32) -> Self {
        match percent {
            p if p >= 95.0 => Status::Complete,
            p if p >= 70.0 => Status::Finalizing,
            p if p >= 40.0 => Status::Synchronizing,
            p if p >= 10.0 => Status::Allocating,
            _ => Status::Initializing,
        }
    }

    /// Console lines shown while in this status.
    pub fn messages(self) -> &'static [&'static str] {
        match self {
            Status::Initializing => &["// INIT_GPU_CLUSTERS"],
            Status::Allocating => &["// OPTIMIZING_NEURAL_PATH", ">> ALLOCATING_VRAM"],
            Status::Synchronizing => &["// WEAVING_DATA_THREADS", ">> SYNCHRONIZING_CORE"],
            Status::Finalizing => &["// RENDERING_REALITY", ">> FINAL_COMPILE"],
            Status::Complete => &[">> EXECUTION_COMPLETE"],
        }
    }

    /// The line displayed prominently (the last console line).
    pub fn headline(self) -> &'static str {
        self.messages().last().copied().unwrap_or_default()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Initializing => "initializing",
            Status::Allocating => "allocating",
            Status::Synchronizing => "synchronizing",
            Status::Finalizing => "finalizing",
            Status::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Something that changed during one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChoreoEvent {
    /// Status advanced.
    StatusChanged { from: Status, to: Status },
    /// A flash fired at this threshold percent.
    Flash { threshold: f32 },
    /// The terminal whiteout latched.
    Terminal,
    /// A process log line was appended.
    LogLine(&'static str),
}

/// Overlay state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChoreoFrame {
    pub status: Status,
    /// Opacity of the white flash overlay.
    pub flash_opacity: f32,
    /// Opacity of the terminal whiteout overlay.
    pub whiteout_opacity: f32,
    /// Whether the terminal state has latched.
    pub terminal: bool,
}

/// Edge detector for one flash threshold.
#[derive(Debug, Clone, Copy)]
struct FlashGate {
    threshold: f32,
    armed: bool,
}

impl FlashGate {
    fn new(threshold: f32) -> Self {
        Self { threshold, armed: true }
    }

    /// Whether this sample fires the flash.
    ///
    /// Arms below the band, fires on the first sample inside it, disarms
    /// once fired or once progress is above the band.
    fn observe(&mut self, percent: f32) -> bool {
        let low = self.threshold - FLASH_BAND;
        let high = self.threshold + FLASH_BAND;
        if percent <= low {
            self.armed = true;
            false
        } else if percent < high {
            std::mem::replace(&mut self.armed, false)
        } else {
            self.armed = false;
            false
        }
    }
}

/// Maps progress to status, flashes, whiteout and log lines.
#[derive(Debug, Clone)]
pub struct ProgressChoreographer {
    status: Status,
    gates: [FlashGate; 3],
    flash_started: Option<f32>,
    terminal_since: Option<f32>,
    log: VecDeque<&'static str>,
    logged: [bool; LOG_SCRIPT.len()],
    headline: DecodedText,
    events: Vec<ChoreoEvent>,
    seed: u64,
}

impl ProgressChoreographer {
    /// Fresh cycle at "initializing".
    pub fn new(seed: u64) -> Self {
        Self {
            status: Status::Initializing,
            gates: FLASH_THRESHOLDS.map(FlashGate::new),
            flash_started: None,
            terminal_since: None,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            logged: [false; LOG_SCRIPT.len()],
            headline: DecodedText::new(Status::Initializing.headline(), 0.0, seed),
            events: Vec::with_capacity(8),
            seed,
        }
    }

    /// Start a new cycle.
    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    /// Feed one progress sample and return what changed.
    pub fn update(&mut self, time: f32, progress: ProgressSignal) -> &[ChoreoEvent] {
        self.events.clear();
        let percent = progress.percent();

        let next = Status::from_percent(percent);
        if next > self.status {
            log::debug!("status {} -> {}", self.status, next);
            self.events.push(ChoreoEvent::StatusChanged {
                from: self.status,
                to: next,
            });
            self.status = next;
            self.headline = DecodedText::new(next.headline(), time, self.seed);
        }

        for gate in &mut self.gates {
            if gate.observe(percent) {
                log::debug!("flash at {}%", gate.threshold);
                self.flash_started = Some(time);
                self.events.push(ChoreoEvent::Flash {
                    threshold: gate.threshold,
                });
            }
        }

        if self.terminal_since.is_none() && percent >= TERMINAL_PERCENT {
            log::info!("terminal state reached");
            self.terminal_since = Some(time);
            self.events.push(ChoreoEvent::Terminal);
        }

        for (i, &(above, line)) in LOG_SCRIPT.iter().enumerate() {
            if !self.logged[i] && percent > above {
                self.logged[i] = true;
                if self.log.len() == LOG_CAPACITY {
                    self.log.pop_front();
                }
                self.log.push_back(line);
                self.events.push(ChoreoEvent::LogLine(line));
            }
        }

        &self.events
    }

    /// Events from the most recent update.
    pub fn events(&self) -> &[ChoreoEvent] {
        &self.events
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Console lines for the current status.
    pub fn messages(&self) -> &'static [&'static str] {
        self.status.messages()
    }

    /// Scrambling headline for the current status.
    pub fn headline(&self) -> &DecodedText {
        &self.headline
    }

    /// The last [`LOG_CAPACITY`] log lines, oldest first.
    pub fn log_lines(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.log.iter().copied()
    }

    /// Whether the terminal state has latched this cycle.
    pub fn is_terminal(&self) -> bool {
        self.terminal_since.is_some()
    }

    /// Clock time the terminal state latched.
    pub fn terminal_since(&self) -> Option<f32> {
        self.terminal_since
    }

    /// Overlay opacities at `time`.
    pub fn frame(&self, time: f32) -> ChoreoFrame {
        let flash_opacity = match self.flash_started {
            Some(start) if time >= start && time - start < FLASH_DURATION => FLASH_OPACITY,
            _ => 0.0,
        };
        let whiteout_opacity = match self.terminal_since {
            Some(since) => {
                let t = ((time - since) / WHITEOUT_RAMP).clamp(0.0, 1.0);
                if t.is_nan() {
                    0.0
                } else {
                    t * t
                }
            }
            None => 0.0,
        };
        ChoreoFrame {
            status: self.status,
            flash_opacity,
            whiteout_opacity,
            terminal: self.is_terminal(),
        }
    }
}

// =========================================================================
// DECODED TEXT
// =========================================================================

/// Glyph pool for scrambled characters.
pub const GLYPHS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890@#$%&";

/// Only the letters are drawn while scrambling.
const SCRAMBLE_GLYPHS: usize = 26;

/// Interval between reveal ticks (seconds).
pub const DECODE_TICK: f32 = 0.03;

/// Ticks needed to reveal one more character.
pub const TICKS_PER_CHAR: u32 = 3;

/// Text that resolves left to right out of random glyphs.
///
/// Unrevealed positions show a letter keyed by seed, position and tick, so
/// the scramble flickers every 30 ms but is reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    target: Vec<char>,
    started_at: f32,
    seed: u64,
}

impl DecodedText {
    pub fn new(text: &str, started_at: f32, seed: u64) -> Self {
        Self {
            target: text.chars().collect(),
            started_at,
            seed,
        }
    }

    /// Final text.
    pub fn target(&self) -> String {
        self.target.iter().collect()
    }

    fn tick(&self, time: f32) -> u32 {
        let elapsed = time - self.started_at;
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        (elapsed / DECODE_TICK).floor() as u32
    }

    /// Characters revealed at `time`.
    pub fn revealed(&self, time: f32) -> usize {
        let revealed = self.tick(time).div_ceil(TICKS_PER_CHAR) as usize;
        revealed.min(self.target.len())
    }

    /// Whether the text has fully resolved.
    pub fn is_done(&self, time: f32) -> bool {
        self.revealed(time) >= self.target.len()
    }

    /// Text as displayed at `time`.
    pub fn render(&self, time: f32) -> String {
        let mut out = String::with_capacity(self.target.len());
        self.render_into(time, &mut out);
        out
    }

    /// Write the displayed text into a reusable buffer.
    pub fn render_into(&self, time: f32, out: &mut String) {
        out.clear();
        let tick = self.tick(time);
        let revealed = self.revealed(time);
        let glyphs = GLYPHS.as_bytes();
        for (i, &c) in self.target.iter().enumerate() {
            if i < revealed {
                out.push(c);
            } else {
                let salt = tick.wrapping_mul(0x9E37_79B9) ^ i as u32;
                let pick = (keyed(self.seed, i as u32, salt) * SCRAMBLE_GLYPHS as f32) as usize;
                out.push(glyphs[pick.min(SCRAMBLE_GLYPHS - 1)] as char);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(choreo: &mut ProgressChoreographer, time: f32, percent: f32) -> Vec<ChoreoEvent> {
        choreo.update(time, ProgressSignal::from_percent(percent)).to_vec()
    }

    fn flashes(events: &[ChoreoEvent]) -> usize {
        events.iter().filter(|e| matches!(e, ChoreoEvent::Flash { .. })).count()
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(Status::from_percent(0.0), Status::Initializing);
        assert_eq!(Status::from_percent(9.99), Status::Initializing);
        assert_eq!(Status::from_percent(10.0), Status::Allocating);
        assert_eq!(Status::from_percent(39.9), Status::Allocating);
        assert_eq!(Status::from_percent(40.0), Status::Synchronizing);
        assert_eq!(Status::from_percent(70.0), Status::Finalizing);
        assert_eq!(Status::from_percent(94.9), Status::Finalizing);
        assert_eq!(Status::from_percent(95.0), Status::Complete);
        assert_eq!(Status::from_percent(100.0), Status::Complete);
    }

    #[test]
    fn test_status_skips_and_never_regresses() {
        let mut choreo = ProgressChoreographer::new(1);
        feed(&mut choreo, 0.0, 5.0);
        let events = feed(&mut choreo, 0.1, 80.0);
        assert_eq!(
            events.iter().filter(|e| matches!(e, ChoreoEvent::StatusChanged { .. })).count(),
            1
        );
        assert!(events.contains(&ChoreoEvent::StatusChanged {
            from: Status::Initializing,
            to: Status::Finalizing
        }));

        feed(&mut choreo, 0.2, 30.0);
        assert_eq!(choreo.status(), Status::Finalizing);
    }

    #[test]
    fn test_repeated_sample_emits_nothing() {
        let mut choreo = ProgressChoreographer::new(1);
        assert!(!feed(&mut choreo, 1.0, 50.0).is_empty());
        assert!(feed(&mut choreo, 1.0, 50.0).is_empty());
        assert!(feed(&mut choreo, 1.1, 50.0).is_empty());
    }

    #[test]
    fn test_flash_once_per_crossing() {
        let mut choreo = ProgressChoreographer::new(1);
        feed(&mut choreo, 0.0, 20.0);
        assert_eq!(flashes(&feed(&mut choreo, 0.1, 24.5)), 1);
        assert_eq!(flashes(&feed(&mut choreo, 0.2, 25.0)), 0);
        assert_eq!(flashes(&feed(&mut choreo, 0.3, 25.8)), 0);
        assert_eq!(flashes(&feed(&mut choreo, 0.4, 27.0)), 0);
        // Dropping back below the band re-arms
        assert_eq!(flashes(&feed(&mut choreo, 0.5, 23.0)), 0);
        assert_eq!(flashes(&feed(&mut choreo, 0.6, 25.2)), 1);
    }

    #[test]
    fn test_flash_entered_from_above_does_not_fire() {
        let mut choreo = ProgressChoreographer::new(1);
        feed(&mut choreo, 0.0, 30.0);
        assert_eq!(flashes(&feed(&mut choreo, 0.1, 25.2)), 0);
        assert_eq!(flashes(&feed(&mut choreo, 0.2, 24.5)), 0);
        // Only a rise from below the band counts
        feed(&mut choreo, 0.3, 23.5);
        assert_eq!(flashes(&feed(&mut choreo, 0.4, 24.5)), 1);
    }

    #[test]
    fn test_flash_skipped_band_does_not_fire() {
        let mut choreo = ProgressChoreographer::new(1);
        feed(&mut choreo, 0.0, 10.0);
        assert_eq!(flashes(&feed(&mut choreo, 0.1, 30.0)), 0);
    }

    #[test]
    fn test_flash_overlay_duration() {
        let mut choreo = ProgressChoreographer::new(1);
        feed(&mut choreo, 2.0, 50.0);
        assert_eq!(choreo.frame(2.05).flash_opacity, FLASH_OPACITY);
        assert_eq!(choreo.frame(2.2).flash_opacity, 0.0);
    }

    #[test]
    fn test_terminal_latches() {
        let mut choreo = ProgressChoreographer::new(1);
        feed(&mut choreo, 0.0, 98.0);
        assert!(!choreo.is_terminal());
        let events = feed(&mut choreo, 1.0, 99.5);
        assert!(events.contains(&ChoreoEvent::Terminal));
        feed(&mut choreo, 1.1, 40.0);
        assert!(choreo.is_terminal());
        assert_eq!(choreo.frame(1.0).whiteout_opacity, 0.0);
        assert_eq!(choreo.frame(1.5).whiteout_opacity, 1.0);
        assert!(choreo.frame(1.05).whiteout_opacity < 0.5);

        choreo.reset();
        assert!(!choreo.is_terminal());
        assert_eq!(choreo.status(), Status::Initializing);
    }

    #[test]
    fn test_log_lines_once_and_capped() {
        let mut choreo = ProgressChoreographer::new(1);
        feed(&mut choreo, 0.0, 4.0);
        assert_eq!(choreo.log_lines().count(), 0);
        feed(&mut choreo, 0.1, 21.0);
        assert_eq!(
            choreo.log_lines().collect::<Vec<_>>(),
            vec!["> CONNECTING_TO_SATELLITE...", "> HANDSHAKE_ESTABLISHED"]
        );
        feed(&mut choreo, 0.2, 21.0);
        assert_eq!(choreo.log_lines().count(), 2);
        feed(&mut choreo, 0.3, 100.0);
        let lines: Vec<_> = choreo.log_lines().collect();
        assert_eq!(lines.len(), LOG_CAPACITY);
        assert_eq!(lines[0], "> HANDSHAKE_ESTABLISHED");
        assert_eq!(lines[4], "> FINALIZING_RENDER_SEQUENCE");
    }

    #[test]
    fn test_headline_follows_status() {
        let mut choreo = ProgressChoreographer::new(1);
        assert_eq!(choreo.headline().target(), "// INIT_GPU_CLUSTERS");
        feed(&mut choreo, 3.0, 45.0);
        assert_eq!(choreo.headline().target(), ">> SYNCHRONIZING_CORE");
        assert_eq!(choreo.messages().len(), 2);
    }

    #[test]
    fn test_decoded_text_reveals() {
        let text = DecodedText::new("HELLO", 1.0, 3);
        assert_eq!(text.revealed(1.0), 0);
        assert_eq!(text.render(1.0).chars().count(), 5);
        // Three ticks reveal one character
        assert_eq!(text.revealed(1.0 + 3.5 * DECODE_TICK), 1);
        assert!(text.render(1.0 + 3.5 * DECODE_TICK).starts_with('H'));
        assert!(text.is_done(1.0 + 16.0 * DECODE_TICK));
        assert_eq!(text.render(2.0), "HELLO");
        assert_eq!(text.render(1.05), text.render(1.05));
    }

    #[test]
    fn test_decoded_text_scrambles_with_letters() {
        let text = DecodedText::new("0123456789", 0.0, 9);
        let shown = text.render(0.0);
        assert!(shown.chars().all(|c| c.is_ascii_uppercase()));
    }
}
