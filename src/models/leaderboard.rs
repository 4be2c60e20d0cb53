use serde::{Deserialize, Serialize};

/// Body of an `action: "submit"` request. Score and hit rate are whatever
/// the client's round produced; the server trusts them as-is. A missing
/// token deserializes to empty and fails validation as `CSRF ERROR` rather
/// than as a malformed payload.
#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub player_name: String,
    pub score: i64,
    pub hit_rate: f64,
    #[serde(default)]
    pub csrf: String,
}

/// Body of an `action: "renew"` (fetch leaderboard) request.
#[derive(Debug, Deserialize)]
pub struct RenewRequest {
    #[serde(default)]
    pub csrf: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub score: i64,
    pub hit_rate: f64,
    pub created_at: String,
}

/// Success payloads of the two actions. Errors travel as `AppError` and are
/// rendered by its `WebResponseError` impl.
#[derive(Debug)]
pub enum ApiResponse {
    SubmitOk,
    RenewOk(Vec<LeaderboardEntry>),
}

impl ApiResponse {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ApiResponse::SubmitOk => serde_json::json!({ "status": "ok" }),
            ApiResponse::RenewOk(entries) => serde_json::json!({
                "status": "ok",
                "datas": entries,
                "message": "",
            }),
        }
    }
}
