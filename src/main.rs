use anyhow::Context;
use clap::Parser;

use schoold::api::{create_router, AppState};
use schoold::config::Config;
use schoold::{bootstrap, db, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cfg = Config::parse();
    logging::init_tracing(&cfg.log_level);

    let conn = db::open_db(&cfg.database_path)?;
    tracing::info!(path = %cfg.database_path.display(), "database ready");
    if let Some(guest) = cfg.guest_admin() {
        bootstrap::seed_guest_admin(&conn, &guest, cfg.bcrypt_cost)?;
    }

    let app = create_router(AppState::new(conn, cfg.bcrypt_cost));
    let address = format!("0.0.0.0:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("server listening on {}", address);
    axum::serve(listener, app)
        .await
        .context("server terminated")?;
    Ok(())
}
