//! Drives a [`Round`] on real (tokio) time: one interval task for the
//! 1-second tick, one short-lived sleep task per slot timer. Stop and reset
//! bump a runner generation; every spawned task rechecks the generation
//! before touching the round, so a timer leaked across a reset is inert.

use crate::engine::round::{HitOutcome, Phase, Round, RoundSummary, TickOutcome, TimerCmd};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Where a finished round's snapshot goes. The server's simulate mode plugs
/// in a sink that writes through the leaderboard service; tests record.
pub trait ScoreSink: Send + Sync + 'static {
    fn submit(&self, summary: RoundSummary);
}

impl<T: ScoreSink + ?Sized> ScoreSink for Arc<T> {
    fn submit(&self, summary: RoundSummary) {
        (**self).submit(summary);
    }
}

struct Shared {
    round: Round,
    generation: u64,
}

pub struct GameRunner<S: ScoreSink> {
    shared: Arc<Mutex<Shared>>,
    sink: Arc<S>,
    tick_period: Duration,
}

impl<S: ScoreSink> GameRunner<S> {
    pub fn new(round: Round, sink: S) -> Self {
        GameRunner {
            shared: Arc::new(Mutex::new(Shared {
                round,
                generation: 0,
            })),
            sink: Arc::new(sink),
            tick_period: Duration::from_secs(1),
        }
    }

    /// Begin ticking. No-op unless the round is `Idle`. The tick task exits
    /// on its own when the round finishes or the generation moves.
    pub fn start(&self) {
        let generation = {
            let mut shared = self.shared.lock().unwrap();
            if !shared.round.start() {
                return;
            }
            shared.generation
        };
        let shared = Arc::clone(&self.shared);
        let sink = Arc::clone(&self.sink);
        let period = self.tick_period;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; the round's
            // first second elapses one period later.
            interval.tick().await;
            loop {
                interval.tick().await;
                let outcome = {
                    let mut guard = shared.lock().unwrap();
                    if guard.generation != generation {
                        return;
                    }
                    let mut rng = rand::thread_rng();
                    guard.round.tick(&mut rng)
                };
                match outcome {
                    TickOutcome::Revealed(timers) => {
                        for cmd in timers {
                            spawn_slot_timer(&shared, generation, cmd);
                        }
                    }
                    TickOutcome::Finished(summary) => {
                        debug!(score = summary.score, hit_rate = summary.hit_rate, "round over");
                        sink.submit(summary);
                        return;
                    }
                    TickOutcome::Ignored => return,
                }
            }
        });
    }

    pub fn hit(&self, index: usize) {
        let (generation, outcome) = {
            let mut shared = self.shared.lock().unwrap();
            (shared.generation, shared.round.user_hit(index))
        };
        if let HitOutcome::Hit(cmd) = outcome {
            spawn_slot_timer(&self.shared, generation, cmd);
        }
    }

    /// Freeze without submitting. The generation bump cancels the tick task
    /// and every pending slot timer.
    pub fn stop(&self) {
        let mut shared = self.shared.lock().unwrap();
        shared.round.stop();
        shared.generation += 1;
    }

    pub fn reset(&self) {
        let mut shared = self.shared.lock().unwrap();
        shared.round.reset();
        shared.generation += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.shared.lock().unwrap().round.phase() == Phase::Finished
    }

    /// Read-only peek at the round under the lock.
    pub fn with_round<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Round) -> T,
    {
        f(&self.shared.lock().unwrap().round)
    }
}

fn spawn_slot_timer(shared: &Arc<Mutex<Shared>>, generation: u64, cmd: TimerCmd) {
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(cmd.after_ms)).await;
        let mut guard = shared.lock().unwrap();
        if guard.generation != generation {
            return;
        }
        guard.round.slot_timer_elapsed(cmd.slot, cmd.stamp);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::round::{SlotState, SLOT_COUNT};

    #[derive(Default)]
    struct RecordingSink {
        submissions: Mutex<Vec<RoundSummary>>,
    }

    impl ScoreSink for RecordingSink {
        fn submit(&self, summary: RoundSummary) {
            self.submissions.lock().unwrap().push(summary);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn finished_round_submits_exactly_once() {
        let sink = Arc::new(RecordingSink::default());
        let runner = GameRunner::new(Round::with_duration(5), Arc::clone(&sink));
        runner.start();

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert!(runner.is_finished());
        assert_eq!(sink.submissions.lock().unwrap().len(), 1);

        // Nothing further comes out of a finished round.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runner.with_round(|r| r.elapsed_secs()), 5);
        assert_eq!(sink.submissions.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_the_clock_and_suppresses_submission() {
        let sink = Arc::new(RecordingSink::default());
        let runner = GameRunner::new(Round::with_duration(5), Arc::clone(&sink));
        runner.start();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        runner.stop();
        let frozen = runner.with_round(|r| r.elapsed_secs());
        assert_eq!(frozen, 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runner.with_round(|r| r.elapsed_secs()), frozen);
        assert!(!runner.is_finished());
        assert!(sink.submissions.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_leaves_no_live_timers_behind() {
        let sink = Arc::new(RecordingSink::default());
        let runner = GameRunner::new(Round::with_duration(60), Arc::clone(&sink));
        runner.start();

        // Let a few reveals (and their expiry timers) accumulate.
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        runner.reset();
        assert_eq!(runner.with_round(|r| r.phase()), Phase::Idle);

        // Outstanding timers fire into the void; the idle round is inert.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runner.with_round(|r| r.phase()), Phase::Idle);
        assert_eq!(runner.with_round(|r| r.elapsed_secs()), 0);
        for i in 0..SLOT_COUNT {
            assert_eq!(runner.with_round(|r| r.slot_state(i)), SlotState::Hidden);
        }
        assert!(sink.submissions.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn runner_scores_hits_against_visible_slots() {
        let sink = Arc::new(RecordingSink::default());
        let runner = GameRunner::new(Round::with_duration(8), Arc::clone(&sink));
        runner.start();

        let mut whacked = 0u32;
        for _ in 0..7 {
            tokio::time::sleep(Duration::from_millis(1_010)).await;
            let visible = runner
                .with_round(|r| (0..SLOT_COUNT).find(|&i| r.slot_state(i) == SlotState::Visible));
            if let Some(index) = visible {
                runner.hit(index);
                whacked += 1;
            }
        }
        assert!(whacked > 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let submissions = sink.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].score, whacked);
        assert_eq!(submissions[0].hit_rate, 100.0);
    }
}
