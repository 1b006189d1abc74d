//! Custom Axum extractors.
//!
//! - [`BearerToken`]: the `Authorization: Bearer …` credential
//! - [`ClientIp`] / [`UserAgent`]: proxy-aware request origin, used to stamp
//!   audit records
//! - [`RequestClient`]: both of the above in one extractor
//! - [`CorrelationId`]: the request's tracing id
//!
//! All origin extractors are infallible; missing headers degrade to
//! defaults rather than rejecting the request, because their only consumer
//! is the audit trail.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::net::IpAddr;
use uuid::Uuid;

use crate::error::AppError;

/// Bearer token extracted from the `Authorization` header.
///
/// Rejects with 401 when the header is missing or not in `Bearer <token>`
/// form. Token *validation* is the application's job.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format, expected 'Bearer <token>'")
            })?
            .trim();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// Correlation ID for request tracing.
///
/// Reads `X-Correlation-ID`, or generates a fresh UUID v4 when the header is
/// absent or malformed.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Prefer the id the middleware stored; fall back to the raw header.
        let from_extensions = parts.extensions.get::<Uuid>().copied();
        let id = from_extensions.unwrap_or_else(|| {
            parts
                .headers
                .get(crate::middleware::CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok())
                .unwrap_or_else(Uuid::new_v4)
        });
        Ok(Self(id))
    }
}

/// Client IP address, proxy-aware.
///
/// Priority: first entry of `X-Forwarded-For`, then `X-Real-IP`, then
/// loopback. The deployment sits behind a reverse proxy, so the forwarded
/// headers are normally present.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip_from_headers(&parts.headers)))
    }
}

fn client_ip_from_headers(headers: &HeaderMap) -> IpAddr {
    if let Some(forwarded) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = forwarded
            .split(',')
            .next()
            .and_then(|first| first.trim().parse::<IpAddr>().ok())
        {
            return ip;
        }
    }

    if let Some(ip) = headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<IpAddr>().ok())
    {
        return ip;
    }

    IpAddr::from([127, 0, 0, 1])
}

/// The `User-Agent` header, or `"Unknown"`.
#[derive(Debug, Clone)]
pub struct UserAgent(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();
        Ok(Self(user_agent))
    }
}

/// Request origin bundle for audit records: client IP plus user agent.
#[derive(Debug, Clone)]
pub struct RequestClient {
    /// Client IP, proxy-aware.
    pub ip: IpAddr,
    /// Client user agent.
    pub user_agent: String,
}

impl RequestClient {
    /// Convert into the core audit representation.
    #[must_use]
    pub fn into_origin(self) -> despacho_core::audit::RequestOrigin {
        despacho_core::audit::RequestOrigin {
            ip_address: Some(self.ip.to_string()),
            user_agent: Some(self.user_agent),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestClient
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = client_ip_from_headers(&parts.headers);
        let user_agent = parts
            .headers
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();
        Ok(Self { ip, user_agent })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_for(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[tokio::test]
    async fn bearer_token_happy_path() {
        let req = Request::builder()
            .header("authorization", "Bearer abc123")
            .body(())
            .expect("valid request");
        let token = BearerToken::from_request_parts(&mut parts_for(req), &())
            .await
            .expect("token extracts");
        assert_eq!(token.0, "abc123");
    }

    #[tokio::test]
    async fn bearer_token_rejects_basic_auth() {
        let req = Request::builder()
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .expect("valid request");
        let err = BearerToken::from_request_parts(&mut parts_for(req), &())
            .await
            .err()
            .expect("should reject");
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_token_rejects_missing_header() {
        let req = Request::builder().body(()).expect("valid request");
        assert!(BearerToken::from_request_parts(&mut parts_for(req), &())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn client_ip_prefers_forwarded_for() {
        let req = Request::builder()
            .header("X-Forwarded-For", "203.0.113.1, 198.51.100.1")
            .header("X-Real-IP", "198.51.100.9")
            .body(())
            .expect("valid request");
        let ip = ClientIp::from_request_parts(&mut parts_for(req), &())
            .await
            .expect("infallible");
        assert_eq!(ip.0.to_string(), "203.0.113.1");
    }

    #[tokio::test]
    async fn client_ip_falls_back_to_real_ip_then_loopback() {
        let req = Request::builder()
            .header("X-Real-IP", "198.51.100.9")
            .body(())
            .expect("valid request");
        let ip = ClientIp::from_request_parts(&mut parts_for(req), &())
            .await
            .expect("infallible");
        assert_eq!(ip.0.to_string(), "198.51.100.9");

        let bare = Request::builder().body(()).expect("valid request");
        let ip = ClientIp::from_request_parts(&mut parts_for(bare), &())
            .await
            .expect("infallible");
        assert_eq!(ip.0.to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn request_client_becomes_audit_origin() {
        let req = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7")
            .header("User-Agent", "Mozilla/5.0 (Test)")
            .body(())
            .expect("valid request");
        let client = RequestClient::from_request_parts(&mut parts_for(req), &())
            .await
            .expect("infallible");
        let origin = client.into_origin();
        assert_eq!(origin.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(origin.user_agent.as_deref(), Some("Mozilla/5.0 (Test)"));
    }

    #[tokio::test]
    async fn correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Correlation-ID", uuid.to_string())
            .body(())
            .expect("valid request");
        let id = CorrelationId::from_request_parts(&mut parts_for(req), &())
            .await
            .expect("infallible");
        assert_eq!(id.0, uuid);
    }
}
