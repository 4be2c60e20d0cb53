use crate::csrf::{self, CsrfStore};
use crate::db::Db;
use crate::error::AppError;
use crate::services::leaderboard as service;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

/// The single game endpoint: JSON body, dispatched on its `action` field.
/// The body is taken raw so an undecodable payload still gets the
/// structured `No data` answer instead of the extractor's bare 400.
pub async fn dispatch(
    db: web::types::State<Arc<Db>>,
    tokens: web::types::State<Arc<CsrfStore>>,
    body: String,
) -> Result<HttpResponse, AppError> {
    let response = service::handle_body(&db, &tokens, &body)?;
    Ok(HttpResponse::Ok().json(&response.to_json()))
}

/// Hands the client fresh tokens for both action scopes, the way the
/// original page embedded them at render time. Each call rotates them.
pub async fn issue_tokens(tokens: web::types::State<Arc<CsrfStore>>) -> HttpResponse {
    HttpResponse::Ok().json(&serde_json::json!({
        "csrf_submit": tokens.generate(csrf::SCOPE_SUBMIT),
        "csrf_renew": tokens.generate(csrf::SCOPE_RENEW),
    }))
}
