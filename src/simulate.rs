//! `simulate` subcommand: plays one automated round against the real engine
//! runner and pushes the result through the leaderboard service, end to end.

use crate::db::Db;
use crate::engine::round::{Round, RoundSummary, SlotState, SLOT_COUNT};
use crate::engine::runner::{GameRunner, ScoreSink};
use crate::services::leaderboard as service;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

struct DbSink {
    db: Arc<Db>,
    player_name: String,
}

impl ScoreSink for DbSink {
    fn submit(&self, summary: RoundSummary) {
        match service::submit(
            &self.db,
            &self.player_name,
            i64::from(summary.score),
            summary.hit_rate,
        ) {
            Ok(()) => info!(
                score = summary.score,
                hit_rate = summary.hit_rate,
                "round submitted"
            ),
            Err(e) => error!(error = %e, "round finished but submission failed"),
        }
    }
}

pub async fn run(db: Arc<Db>, duration_secs: u32, player_name: String) {
    info!(duration_secs, player_name = %player_name, "simulating one round");
    let sink = DbSink {
        db: Arc::clone(&db),
        player_name,
    };
    let runner = GameRunner::new(Round::with_duration(duration_secs), sink);
    runner.start();

    // A reasonably sharp bot: whack the first visible mole a few times a
    // second, with the occasional wild swing at an empty hole.
    while !runner.is_finished() {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let target = runner
            .with_round(|r| (0..SLOT_COUNT).find(|&i| r.slot_state(i) == SlotState::Visible));
        match target {
            Some(index) => runner.hit(index),
            None => {
                if rand::thread_rng().gen_ratio(1, 4) {
                    runner.hit(rand::thread_rng().gen_range(0..SLOT_COUNT));
                }
            }
        }
    }

    // Give the sink a beat to land the row before reading it back.
    tokio::time::sleep(Duration::from_millis(200)).await;
    match service::fetch_top(&db, service::TOP_LIMIT) {
        Ok(entries) => {
            for (rank, entry) in entries.iter().enumerate() {
                println!(
                    "{:>2}. {:<32} {:>5}  {:>5.1}%  {}",
                    rank + 1,
                    entry.player_name,
                    entry.score,
                    entry.hit_rate,
                    entry.created_at
                );
            }
        }
        Err(e) => error!(error = %e, "could not read back the leaderboard"),
    }
}
