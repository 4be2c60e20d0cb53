use ntex::web::{HttpResponse, WebResponseError};
use std::fmt;

/// Request-boundary error taxonomy. Every variant is recovered into the
/// `{status:"error", message}` wire shape; nothing here escapes as a crash.
#[derive(Debug)]
pub enum AppError {
    /// Token absent or not matching the server-held value for the scope.
    CsrfInvalid,
    /// Body decoded as JSON but a required field was missing or mistyped.
    MalformedPayload,
    /// The `action` discriminator named no known operation.
    UnknownAction(String),
    /// The leaderboard store could not be reached or the statement failed.
    Storage(rusqlite::Error),
}

impl AppError {
    /// Message the client sees. `CSRF ERROR` and `No data` are part of the
    /// wire contract and must not be reworded.
    pub fn wire_message(&self) -> &str {
        match self {
            AppError::CsrfInvalid => "CSRF ERROR",
            AppError::MalformedPayload => "No data",
            AppError::UnknownAction(_) => "Unknown action",
            AppError::Storage(_) => "Storage unavailable",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::CsrfInvalid => write!(f, "anti-forgery token rejected"),
            AppError::MalformedPayload => write!(f, "malformed request payload"),
            AppError::UnknownAction(action) => write!(f, "unknown action: {}", action),
            AppError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl WebResponseError for AppError {
    // The endpoint always answers 200 with a structured body; clients
    // dispatch on `status`, not on the HTTP code.
    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        HttpResponse::Ok().json(&serde_json::json!({
            "status": "error",
            "message": self.wire_message(),
        }))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Storage(e)
    }
}
