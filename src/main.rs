mod csrf;
mod db;
mod engine;
mod error;
mod handlers;
mod models;
mod services;
mod simulate;
mod validation;

use csrf::CsrfStore;
use db::Db;
use ntex::web;
use ntex_cors::Cors;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[ntex::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    let db_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| "whack-a-mole.db".into());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let db = Arc::new(Db::open(&db_path).expect("Failed to open database"));

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("simulate") {
        let duration_secs = args.next().and_then(|s| s.parse().ok()).unwrap_or(15);
        let player_name = args.next().unwrap_or_else(|| "Practice Bot".into());
        simulate::run(db, duration_secs, player_name).await;
        return Ok(());
    }

    let tokens = Arc::new(CsrfStore::new());
    info!(%host, port, db = %db_path, "whack-a-mole server starting");

    web::HttpServer::new(move || {
        web::App::new()
            .state(db.clone())
            .state(tokens.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type"])
                    .max_age(3600)
                    .finish(),
            )
            .route("/api/health", web::get().to(health))
            .route("/api/tokens", web::get().to(handlers::leaderboard::issue_tokens))
            .route(
                "/api/leaderboard",
                web::post().to(handlers::leaderboard::dispatch),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}

async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
