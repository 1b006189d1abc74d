//! Middleware layers: correlation-ID tracking and CORS.
//!
//! The correlation layer gives every request a UUID (taken from the
//! `X-Correlation-ID` header when the client sent one), stores it in request
//! extensions, wraps the request in a tracing span carrying it, and echoes
//! it back on the response.
//!
//! The CORS layer is built from the configured origin allow-list: exact
//! origins, plus `*.suffix` entries for preview-deployment hosts.

use axum::{extract::Request, http::HeaderValue, response::Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation IDs, request and response side.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create the correlation-ID layer.
#[must_use]
pub fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation-ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation-ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            uri = %req.uri(),
        );

        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.instrument(span).await?;
            if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                response
                    .headers_mut()
                    .insert(CORRELATION_ID_HEADER, header_value);
            }
            Ok(response)
        })
    }
}

/// Build the CORS layer from an origin allow-list.
///
/// Entries are matched exactly, except entries of the form `*.suffix`, which
/// match any origin whose host ends with `.suffix` (preview deployments get
/// fresh subdomains per push). Requests without an `Origin` header (curl,
/// server-to-server) are not subject to CORS at all.
#[must_use]
pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    use axum::http::Method;

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin
                .to_str()
                .is_ok_and(|origin| origin_allowed(origin, &allowed_origins))
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
            axum::http::header::ORIGIN,
        ])
        .expose_headers([
            axum::http::header::CONTENT_LENGTH,
            axum::http::header::CONTENT_TYPE,
        ])
}

fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|entry| {
        if let Some(suffix) = entry.strip_prefix("*.") {
            // Wildcard entries match one-or-more labels before the suffix,
            // never the bare suffix itself.
            origin.len() > suffix.len() + 1
                && origin.ends_with(suffix)
                && origin.as_bytes()[origin.len() - suffix.len() - 1] == b'.'
        } else {
            origin == entry
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn correlation_id_generated_when_missing() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(correlation_id_layer());

        let response = app
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("correlation header present");
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn correlation_id_echoed_back() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(correlation_id_layer());

        let id = Uuid::new_v4();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/test")
                    .header(CORRELATION_ID_HEADER, id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(CORRELATION_ID_HEADER)
                .unwrap()
                .to_str()
                .unwrap(),
            id.to_string()
        );
    }

    #[tokio::test]
    async fn malformed_correlation_id_replaced() {
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(correlation_id_layer());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/test")
                    .header(CORRELATION_ID_HEADER, "not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let header = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(Uuid::parse_str(header).is_ok());
        assert_ne!(header, "not-a-uuid");
    }

    #[test]
    fn exact_origins_match() {
        let allowed = vec!["https://despachos.example.com".to_string()];
        assert!(origin_allowed("https://despachos.example.com", &allowed));
        assert!(!origin_allowed("https://evil.example.com", &allowed));
    }

    #[test]
    fn wildcard_origins_match_subdomains_only() {
        let allowed = vec!["*.vercel.app".to_string()];
        assert!(origin_allowed("https://preview-abc123.vercel.app", &allowed));
        assert!(!origin_allowed("vercel.app", &allowed));
        assert!(!origin_allowed("https://notvercel.app", &allowed));
    }
}
