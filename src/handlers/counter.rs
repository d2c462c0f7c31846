use axum::{
    Json,
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;

use super::source_address;
use crate::counter::{self, Mode};
use crate::error::AppError;
use crate::metrics::{INCREMENTS_TOTAL, NOT_FOUND_TOTAL, RATE_LIMITED_TOTAL, RATE_LIMIT_SOURCES};
use crate::models::CounterResponse;
use crate::state::AppState;
use crate::store::load_or_create;

pub(crate) async fn ensure_exists(state: &AppState, identity: &str) -> Result<(), AppError> {
    if state.validator.exists(identity).await? {
        return Ok(());
    }
    NOT_FOUND_TOTAL.inc();
    tracing::debug!(identity, "unknown identity");
    Err(AppError::IdentityNotFound)
}

// load-or-create -> increment -> save, shared by the increment and image routes
pub(crate) async fn record_view(
    state: &AppState,
    identity: &str,
    source: &str,
) -> Result<CounterResponse, AppError> {
    let now = Utc::now();
    let mut record = load_or_create(state.store.as_ref(), identity, now).await?.record;
    let step = counter::apply(&mut record, now, source, Mode::Increment, state.reset_policy);
    if step.reset {
        tracing::info!(identity, "counter window reset");
    }
    state.store.save(&record).await?;
    INCREMENTS_TOTAL.inc();
    Ok(step.report)
}

pub async fn get_counter(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<CounterResponse>, AppError> {
    ensure_exists(&state, &identity).await?;

    let now = Utc::now();
    let source = source_address(&state, peer, &headers);
    let loaded = load_or_create(state.store.as_ref(), &identity, now).await?;
    if loaded.created {
        tracing::info!(identity = %identity, "tracking new identity");
    }
    let mut record = loaded.record;
    let step = counter::apply(&mut record, now, &source, Mode::Read, state.reset_policy);

    // a read can still clear an expired window
    if step.changed {
        tracing::info!(identity = %identity, "counter window reset");
        state.store.save(&record).await?;
    }
    Ok(Json(step.report))
}

pub async fn increment_counter(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<CounterResponse>, AppError> {
    let source = source_address(&state, peer, &headers);

    let admitted = state.rate_limiter.admit(&source);
    RATE_LIMIT_SOURCES.set(state.rate_limiter.tracked_sources() as f64);
    if !admitted {
        RATE_LIMITED_TOTAL.inc();
        tracing::warn!(source = %source, identity = %identity, "rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    ensure_exists(&state, &identity).await?;
    record_view(&state, &identity, &source).await.map(Json)
}
