//! The round state machine, kept free of clocks and I/O. Callers drive it
//! with logical 1-second ticks; everything sub-second comes back out as a
//! [`TimerCmd`] request carrying the slot stamp it was issued under, so a
//! timer that fires after the slot has moved on is a provable no-op.

use rand::Rng;

pub const SLOT_COUNT: usize = 9;
pub const DEFAULT_DURATION_SECS: u32 = 60;

/// How long a struck mole stays on screen before hiding again.
const STRUCK_HIDE_MS: u64 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Stopped,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Hidden,
    Visible,
    Struck,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    state: SlotState,
    stamp: u64,
}

/// A deferred hide requested by the machine. `stamp` is the slot's stamp at
/// issue time; `apply` it back via [`Round::slot_timer_elapsed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerCmd {
    pub slot: usize,
    pub stamp: u64,
    pub after_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSummary {
    pub score: u32,
    pub hit_rate: f64,
}

#[derive(Debug)]
pub enum TickOutcome {
    /// Not running; the tick did nothing.
    Ignored,
    /// Reveal policy ran; the returned timers schedule the slot expiries.
    Revealed(Vec<TimerCmd>),
    /// This tick hit the duration limit. No reveal happens on it.
    Finished(RoundSummary),
}

#[derive(Debug)]
pub enum HitOutcome {
    Ignored,
    Miss,
    /// Slot was visible: scored, expiry cancelled, hide again after the
    /// returned timer.
    Hit(TimerCmd),
}

pub struct Round {
    duration_secs: u32,
    elapsed_secs: u32,
    attempts: u32,
    hits: u32,
    phase: Phase,
    slots: [Slot; SLOT_COUNT],
}

impl Round {
    pub fn new() -> Self {
        Self::with_duration(DEFAULT_DURATION_SECS)
    }

    pub fn with_duration(duration_secs: u32) -> Self {
        Round {
            duration_secs: duration_secs.max(1),
            elapsed_secs: 0,
            attempts: 0,
            hits: 0,
            phase: Phase::Idle,
            slots: [Slot {
                state: SlotState::Hidden,
                stamp: 0,
            }; SLOT_COUNT],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn slot_state(&self, index: usize) -> SlotState {
        self.slots[index].state
    }

    /// `Idle -> Running`. Returns false (and does nothing) from any other
    /// phase; a finished or stopped round must be reset first.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.phase = Phase::Running;
        true
    }

    /// One logical second. Terminal check runs before the reveal policy, so
    /// the finishing tick never spawns fresh moles.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> TickOutcome {
        if self.phase != Phase::Running {
            return TickOutcome::Ignored;
        }
        self.elapsed_secs += 1;
        if self.elapsed_secs >= self.duration_secs {
            self.phase = Phase::Finished;
            return TickOutcome::Finished(self.summary());
        }

        // Difficulty curve: up to ceil(elapsed/8) reveal attempts per tick,
        // each against a uniformly random slot. Already-visible slots are
        // left alone, so late-game ticks often reveal fewer than k moles.
        let cap = ((self.elapsed_secs + 7) / 8).max(1);
        let count = rng.gen_range(1..=cap);
        let mut timers = Vec::new();
        for _ in 0..count {
            let index = rng.gen_range(0..SLOT_COUNT);
            if let Some(cmd) = self.reveal(index, rng) {
                timers.push(cmd);
            }
        }
        TickOutcome::Revealed(timers)
    }

    fn reveal<R: Rng>(&mut self, index: usize, rng: &mut R) -> Option<TimerCmd> {
        let slot = &mut self.slots[index];
        if slot.state != SlotState::Hidden {
            return None;
        }
        slot.state = SlotState::Visible;
        slot.stamp += 1;
        let (lo, hi) = self.reveal_window();
        Some(TimerCmd {
            slot: index,
            stamp: self.slots[index].stamp,
            after_ms: rng.gen_range(lo..=hi),
        })
    }

    /// Visibility window shrinks by 10 ms per elapsed second, clamped so
    /// rounds longer than the window's 90/180 second zero-crossings stay
    /// valid instead of panicking in `gen_range`.
    fn reveal_window(&self) -> (u64, u64) {
        let c = i64::from(self.elapsed_secs);
        let lo = (900 - c * 10).max(1);
        let hi = (1800 - c * 10).max(lo);
        (lo as u64, hi as u64)
    }

    /// Player whacked slot `index`. Every whack while running costs an
    /// attempt; only a currently visible mole scores.
    pub fn user_hit(&mut self, index: usize) -> HitOutcome {
        if self.phase != Phase::Running || index >= SLOT_COUNT {
            return HitOutcome::Ignored;
        }
        self.attempts += 1;
        let slot = &mut self.slots[index];
        if slot.state != SlotState::Visible {
            return HitOutcome::Miss;
        }
        slot.state = SlotState::Struck;
        // New stamp stales the pending expiry, so hit and expiry can never
        // both fire for the same reveal.
        slot.stamp += 1;
        let stamp = slot.stamp;
        self.hits += 1;
        HitOutcome::Hit(TimerCmd {
            slot: index,
            stamp,
            after_ms: STRUCK_HIDE_MS,
        })
    }

    /// A previously issued [`TimerCmd`] came due. Hides the slot only if it
    /// has not changed state since the timer was issued.
    pub fn slot_timer_elapsed(&mut self, index: usize, stamp: u64) {
        if index >= SLOT_COUNT {
            return;
        }
        let slot = &mut self.slots[index];
        if slot.stamp != stamp || slot.state == SlotState::Hidden {
            return;
        }
        slot.state = SlotState::Hidden;
        slot.stamp += 1;
    }

    /// Freeze the round without submitting. Counters keep their values for
    /// display; only a reset brings the machine back to `Idle`.
    pub fn stop(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Stopped;
        }
    }

    /// Back to `Idle` from any phase. Bumping every stamp turns all
    /// outstanding timers into no-ops.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.elapsed_secs = 0;
        self.attempts = 0;
        self.hits = 0;
        for slot in &mut self.slots {
            slot.state = SlotState::Hidden;
            slot.stamp += 1;
        }
    }

    /// Percentage with one fractional digit, recomputed on every call.
    pub fn hit_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        let rate = f64::from(self.hits) / f64::from(self.attempts) * 100.0;
        (rate * 10.0).round() / 10.0
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            score: self.hits,
            hit_rate: self.hit_rate(),
        }
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}
