//! HTTP endpoints: `/metrics`, `/healthz` and `/readyz`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use gh_workflow_config::ServerConfig;
use log::info;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};

use crate::exposition::CONTENT_TYPE;
use crate::store::MetricStore;

pub fn router(store: Arc<MetricStore>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .with_state(store)
}

/// Bound reading the request body by `read` and the whole response by
/// `write`; a request over the limit gets `408 Request Timeout`
fn with_timeouts(router: Router, read: Duration, write: Duration) -> Router {
    router
        .layer(RequestBodyTimeoutLayer::new(read))
        .layer(TimeoutLayer::new(write))
}

/// Serve until the listener fails
pub async fn serve(config: &ServerConfig, store: Arc<MetricStore>) -> Result<()> {
    let addr = listen_address(&config.bind);
    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        "Listening on {}",
        listener.local_addr().map(|a| a.to_string()).unwrap_or(addr)
    );
    let app = with_timeouts(router(store), config.read_timeout, config.write_timeout);
    axum::serve(listener, app)
        .await
        .context("metrics server failed")
}

/// Expand a bare `:port` to all interfaces; `host:port` (hostnames included)
/// is passed through for the resolver
fn listen_address(bind: &str) -> String {
    if bind.starts_with(':') {
        format!("0.0.0.0{}", bind)
    } else {
        bind.to_string()
    }
}

async fn metrics_handler(State(store): State<Arc<MetricStore>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", CONTENT_TYPE)],
        store.text().await,
    )
}

async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "Ok")
}

async fn readyz_handler(State(store): State<Arc<MetricStore>>) -> impl IntoResponse {
    if store.is_ready().await {
        (StatusCode::OK, "Ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not ready: no scrape cycle completed yet")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::response::Response;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_listen_address() {
        assert_eq!(listen_address(":8080"), "0.0.0.0:8080");
        assert_eq!(listen_address("127.0.0.1:9100"), "127.0.0.1:9100");
        assert_eq!(listen_address("localhost:8080"), "localhost:8080");
    }

    #[tokio::test]
    async fn test_hostname_bind_resolves() {
        let listener = tokio::net::TcpListener::bind(listen_address("localhost:0").as_str())
            .await
            .unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_times_out() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "done"
            }),
        );
        let app = with_timeouts(slow, Duration::from_secs(5), Duration::from_secs(10));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_router_serves_within_timeouts() {
        let store = Arc::new(MetricStore::new());
        let app = with_timeouts(router(store), Duration::from_secs(5), Duration::from_secs(10));

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "Ok");
    }

    #[tokio::test]
    async fn test_readyz_follows_first_publish() {
        let store = Arc::new(MetricStore::new());

        let response = readyz_handler(State(store.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        store.publish("up 1\n".to_string(), Utc::now()).await;

        let response = readyz_handler(State(store)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "Ok");
    }

    #[tokio::test]
    async fn test_healthz_always_ok() {
        let response = healthz_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "Ok");
    }

    #[tokio::test]
    async fn test_metrics_serves_snapshot() {
        let store = Arc::new(MetricStore::new());
        store.publish("github_repository_info{org=\"o\"} 1\n".to_string(), Utc::now()).await;

        let response = metrics_handler(State(store)).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], CONTENT_TYPE);
        assert_eq!(body(response).await, "github_repository_info{org=\"o\"} 1\n");
    }
}
