//! Request middleware for the watcher routes.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;
use crate::error::TrackerError;

/// Rejects the request with 429 once its client exhausts the window budget.
///
/// # Errors
///
/// Returns [`TrackerError::RateLimited`] when the limiter refuses the call.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, TrackerError> {
    if let Some(limiter) = &state.rate_limiter {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let client = client_key(request.headers(), peer, limiter.trusts_forwarded());
        limiter.check(&client).await?;
    }
    Ok(next.run(request).await)
}

/// Identifies the caller by socket peer. Behind a trusted proxy the first
/// forwarded hop, then `x-real-ip`, take precedence.
fn client_key(headers: &HeaderMap, peer: Option<String>, trust_forwarded: bool) -> String {
    if !trust_forwarded {
        return peer.unwrap_or_else(|| "anonymous".to_string());
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    };
    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or(peer)
        .unwrap_or_else(|| "anonymous".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        assert_eq!(client_key(&headers, None, true), "10.0.0.1");
    }

    #[test]
    fn untrusted_forwarded_headers_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        assert_eq!(
            client_key(&headers, Some("192.168.1.5".to_string()), false),
            "192.168.1.5"
        );
    }

    #[test]
    fn falls_back_to_peer_then_anonymous() {
        let headers = HeaderMap::new();
        assert_eq!(
            client_key(&headers, Some("127.0.0.1".to_string()), true),
            "127.0.0.1"
        );
        assert_eq!(client_key(&headers, None, true), "anonymous");
        assert_eq!(client_key(&headers, None, false), "anonymous");
    }
}
