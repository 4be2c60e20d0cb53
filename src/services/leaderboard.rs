use crate::csrf::{self, CsrfStore};
use crate::db::Db;
use crate::error::AppError;
use crate::models::leaderboard::*;
use crate::validation;
use chrono::Utc;
use rusqlite::params;
use tracing::warn;

pub const TOP_LIMIT: i64 = 10;

/// Decode a raw request body and dispatch it. A body that is not JSON at
/// all gets the same `No data` answer as a structurally wrong one.
pub fn handle_body(db: &Db, tokens: &CsrfStore, body: &str) -> Result<ApiResponse, AppError> {
    let payload: serde_json::Value =
        serde_json::from_str(body).map_err(|_| AppError::MalformedPayload)?;
    handle_action(db, tokens, payload)
}

/// Dispatch a decoded request body on its `action` field, gate it on the
/// matching token scope, and run the operation. The token check runs before
/// anything touches the store.
pub fn handle_action(
    db: &Db,
    tokens: &CsrfStore,
    payload: serde_json::Value,
) -> Result<ApiResponse, AppError> {
    let action = payload
        .get("action")
        .and_then(|v| v.as_str())
        .ok_or(AppError::MalformedPayload)?
        .to_string();

    match action.as_str() {
        "submit" => {
            let req: SubmissionRequest =
                serde_json::from_value(payload).map_err(|_| AppError::MalformedPayload)?;
            if !tokens.validate(csrf::SCOPE_SUBMIT, &req.csrf) {
                warn!(player_name = %req.player_name, "score submission rejected: bad token");
                return Err(AppError::CsrfInvalid);
            }
            submit(db, &req.player_name, req.score, req.hit_rate)?;
            Ok(ApiResponse::SubmitOk)
        }
        "renew" => {
            let req: RenewRequest =
                serde_json::from_value(payload).map_err(|_| AppError::MalformedPayload)?;
            if !tokens.validate(csrf::SCOPE_RENEW, &req.csrf) {
                warn!("leaderboard fetch rejected: bad token");
                return Err(AppError::CsrfInvalid);
            }
            Ok(ApiResponse::RenewOk(fetch_top(db, TOP_LIMIT)?))
        }
        other => Err(AppError::UnknownAction(other.to_string())),
    }
}

/// Append one leaderboard row. Entries are immutable once written; there is
/// no update or delete path.
pub fn submit(db: &Db, player_name: &str, score: i64, hit_rate: f64) -> Result<(), AppError> {
    let player_name = validation::sanitize_player_name(player_name);
    let created_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO leader_boards (player_name, score, hit_rate, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![player_name, score, hit_rate, created_at],
        )?;
        Ok(())
    })?;
    Ok(())
}

/// Top `limit` rows, best score first, ties broken by hit rate and then by
/// insertion order.
pub fn fetch_top(db: &Db, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
    let limit = limit.clamp(1, 100);

    Ok(db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT player_name, score, hit_rate, created_at
             FROM leader_boards
             ORDER BY score DESC, hit_rate DESC, id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(LeaderboardEntry {
                player_name: row.get(0)?,
                score: row.get(1)?,
                hit_rate: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    })?)
}
