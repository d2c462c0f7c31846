mod badge;
mod config;
mod counter;
mod error;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod state;
mod store;
mod validator;

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::store::{CounterStore, MemoryStore, SqliteStore};
use crate::validator::GitHubValidator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env first so clap can see its values
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("view_counter=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let validator = GitHubValidator::new(
        &args.directory_url,
        args.directory_token.clone(),
        Duration::from_millis(args.directory_timeout_ms),
    )?;

    let store: Arc<dyn CounterStore> = match &args.database_url {
        Some(url) => Arc::new(SqliteStore::connect(url).await?),
        None => {
            warn!("No DATABASE_URL set, counts are kept in memory and lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState {
        store,
        validator: Arc::new(validator),
        rate_limiter: RateLimiter::new(args.rate_limit, Duration::from_secs(args.rate_window)),
        reset_policy: args.reset_policy,
        trusted_proxy_hops: args.trusted_proxy_hops,
        public_dir: args.public_dir.clone(),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("View counter running on http://localhost:{}", args.port);
    info!("Checking identities against {}", args.directory_url);
    info!("Reset policy: {:?}", args.reset_policy);
    info!(
        "Rate limit: {} increments per {} seconds per source",
        args.rate_limit, args.rate_window
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
