use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use linkfolio_server::{auth::jwt::JwtSessionVerifier, config::Config, state::AppState};

/// `linkfolio health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$LINKFOLIO_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("LINKFOLIO_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

/// `linkfolio token <owner_id>` — mint a dashboard session token.
///
/// Requires `LINKFOLIO_SESSION_SECRET`; a random per-process secret would
/// produce a token no running server accepts.
fn run_issue_token(owner_id: Option<&str>) -> Result<()> {
    let owner_id = owner_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("usage: linkfolio token <owner_id>"))?;
    let cfg = Config::from_env().map_err(|e| anyhow!(e))?;
    let secret = cfg
        .session_secret
        .ok_or_else(|| anyhow!("LINKFOLIO_SESSION_SECRET must be set to issue tokens"))?;
    let (token, expires_at) =
        JwtSessionVerifier::new(secret).issue(owner_id, cfg.session_days)?;
    println!("{token}");
    eprintln!("expires at {expires_at}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("health") => run_health_check(),
        Some("token") => return run_issue_token(args.get(2).map(|s| s.as_str())),
        _ => {}
    }

    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linkfolio=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/linkfolio.db", cfg.data_dir);
    let db = linkfolio_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    let state = Arc::new(AppState::new(db, cfg.clone()));

    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            state.run_buffer_flush_loop().await;
        });
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = linkfolio_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, timezone = %cfg.timezone, "Linkfolio listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let state_for_shutdown = Arc::clone(&state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        tokio::signal::ctrl_c().await.ok();
    })
    .await?;

    // Buffered record commands must not be lost on shutdown.
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state_for_shutdown.flush_buffer(),
    )
    .await
    .ok();

    Ok(())
}
