mod counter;
mod health;
mod image;
mod metrics;

pub use counter::{get_counter, increment_counter};
pub use health::health_handler;
pub use image::counter_image;
pub use metrics::metrics_handler;

use axum::{
    Router,
    extract::Request,
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/counter/{username}", get(get_counter))
        .route("/api/counter/{username}/increment", post(increment_counter))
        .route("/api/counter/{username}/image", get(counter_image))
        .route_layer(middleware::from_fn(track_requests));

    Router::new()
        .merge(api)
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback_service(ServeDir::new(&state.public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn track_requests(req: Request, next: Next) -> Response {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();
    let res = next.run(req).await;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    res
}

// Each trusted proxy appends the address it saw, so only the rightmost
// `trusted_proxy_hops` entries are trustworthy. Anything left of them is
// client-supplied. Too few entries means the request skipped a proxy.
pub(crate) fn source_address(state: &AppState, peer: SocketAddr, headers: &HeaderMap) -> String {
    let hops = state.trusted_proxy_hops;
    if hops > 0 {
        let entries: Vec<&str> = headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .collect();
        if entries.len() >= hops {
            let ip = entries[entries.len() - hops];
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }
    peer.ip().to_string()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use crate::config::ResetPolicy;
    use crate::rate_limit::RateLimiter;
    use crate::store::{CounterStore, MemoryStore};
    use std::time::Duration;

    fn state(trusted_proxy_hops: usize) -> AppState {
        AppState {
            store: Arc::new(MemoryStore::new()),
            validator: Arc::new(StubValidator::knowing(&[])),
            rate_limiter: RateLimiter::new(10, Duration::from_secs(60)),
            reset_policy: ResetPolicy::Rolling,
            trusted_proxy_hops,
            public_dir: "does-not-exist".into(),
        }
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn forwarded_header_ignored_without_proxies() {
        let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let headers = forwarded("1.2.3.4, 10.0.0.1");
        assert_eq!(source_address(&state(0), peer, &headers), "10.0.0.1");
    }

    #[test]
    fn forwarded_entries_are_counted_from_the_right() {
        let proxy: SocketAddr = "172.16.0.1:5000".parse().unwrap();
        let headers = forwarded("6.6.6.6, 1.2.3.4, 10.0.0.1");

        assert_eq!(source_address(&state(1), proxy, &headers), "10.0.0.1");
        assert_eq!(source_address(&state(2), proxy, &headers), "1.2.3.4");
        assert_eq!(source_address(&state(3), proxy, &headers), "6.6.6.6");
    }

    #[test]
    fn short_forwarded_chain_falls_back_to_peer() {
        let proxy: SocketAddr = "172.16.0.1:5000".parse().unwrap();
        assert_eq!(source_address(&state(2), proxy, &forwarded("10.0.0.1")), "172.16.0.1");
        assert_eq!(source_address(&state(1), proxy, &HeaderMap::new()), "172.16.0.1");
        assert_eq!(source_address(&state(1), proxy, &forwarded("1.2.3.4, ")), "172.16.0.1");
    }

    #[tokio::test]
    async fn client_written_forwarded_entries_do_not_split_one_visitor() {
        let app = TestApp::behind_proxies(StubValidator::knowing(&["octocat"]), 1);

        // the proxy appends the real client 10.0.0.1 after whatever the client sent
        let mut admitted = 0;
        for i in 0..30 {
            let chain = format!("6.6.6.{i}, 10.0.0.1");
            let (status, _, _) = send_with_headers(
                &app.state,
                "POST",
                "/api/counter/octocat/increment",
                "172.16.0.1",
                &[("x-forwarded-for", chain.as_str())],
            )
            .await;
            match status {
                StatusCode::OK => admitted += 1,
                StatusCode::TOO_MANY_REQUESTS => {}
                other => panic!("unexpected status {other}"),
            }
        }
        assert_eq!(admitted, 10);

        let record = app.store.find("octocat").await.unwrap().unwrap();
        assert_eq!(record.count, 10);
        assert_eq!(record.unique_visitor_count, 1);
        assert!(record.views.iter().all(|v| v.source == "10.0.0.1"));
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let app = TestApp::new(StubValidator::knowing(&[]));
        let (status, _, body) = send(&app.state, "GET", "/health", "1.2.3.4").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn metrics_are_exposed() {
        let app = TestApp::new(StubValidator::knowing(&["octocat"]));
        send(&app.state, "GET", "/api/counter/octocat", "1.2.3.4").await;
        let (status, _, body) = send(&app.state, "GET", "/metrics", "1.2.3.4").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("view_counter_requests_total"));
    }

    #[tokio::test]
    async fn unknown_paths_fall_through_to_static_files() {
        let app = TestApp::new(StubValidator::knowing(&[]));
        let (status, _, _) = send(&app.state, "GET", "/missing.css", "1.2.3.4").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
