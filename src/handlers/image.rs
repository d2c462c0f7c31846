use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::counter::{ensure_exists, record_view};
use super::source_address;
use crate::badge::{count_badge, error_badge, svg_response};
use crate::error::{AppError, NOT_FOUND_MESSAGE, SERVER_ERROR_MESSAGE};
use crate::state::AppState;

// Every outcome is an SVG so embedded images never break on a JSON body
pub async fn counter_image(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let source = source_address(&state, peer, &headers);

    let result = match ensure_exists(&state, &identity).await {
        Ok(()) => record_view(&state, &identity, &source).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(report) => svg_response(StatusCode::OK, count_badge(report.count)),
        Err(AppError::IdentityNotFound) => {
            svg_response(StatusCode::OK, error_badge(NOT_FOUND_MESSAGE))
        }
        Err(err) => {
            tracing::error!(error = %err, identity = %identity, "badge request failed");
            svg_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_badge(SERVER_ERROR_MESSAGE),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use std::sync::Arc;

    use crate::store::CounterStore;

    #[tokio::test]
    async fn badge_counts_views() {
        let app = TestApp::new(StubValidator::knowing(&["octocat"]));
        let (status, content_type, body) =
            send(&app.state, "GET", "/api/counter/octocat/image", "1.2.3.4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
        assert!(body.contains("Profile views: 1"));

        let (_, _, body) = send(&app.state, "GET", "/api/counter/octocat/image", "1.2.3.4").await;
        assert!(body.contains("Profile views: 2"));

        let record = app.store.find("octocat").await.unwrap().unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(record.unique_visitor_count, 1);
    }

    #[tokio::test]
    async fn unknown_identity_gets_error_badge_without_side_effects() {
        let app = TestApp::new(StubValidator::knowing(&["octocat"]));
        let (status, content_type, body) =
            send(&app.state, "GET", "/api/counter/doesnotexist123/image", "1.2.3.4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
        assert!(body.contains("#b60e0e"));
        assert!(body.contains("Cannot find a GitHub account with your username"));
        assert!(app.store.find("doesnotexist123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn badge_is_not_rate_limited() {
        let app = TestApp::new(StubValidator::knowing(&["octocat"]));
        for _ in 0..12 {
            let (status, _, _) =
                send(&app.state, "GET", "/api/counter/octocat/image", "1.2.3.4").await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn store_failure_still_renders_svg() {
        let state = state_with_store(StubValidator::knowing(&["octocat"]), Arc::new(BrokenStore));
        let (status, content_type, body) =
            send(&state, "GET", "/api/counter/octocat/image", "1.2.3.4").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
        assert!(body.contains("Server error"));
    }

    #[tokio::test]
    async fn directory_outage_is_not_reported_as_missing_user() {
        let app = TestApp::new(StubValidator::down());
        let (status, content_type, body) =
            send(&app.state, "GET", "/api/counter/octocat/image", "1.2.3.4").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
        assert!(!body.contains("Cannot find"));
    }
}
