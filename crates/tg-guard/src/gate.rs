//! Membership gate middleware
//!
//! Axum middleware that forwards a request only when the connecting
//! peer's address is present in the current directory snapshot. The
//! check is purely address-based and trusts the transport's reported
//! remote address; keeping the listener bound to the tailnet interface
//! is what makes that trust sound.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::cache::DirectoryCache;

/// Authorize one request against the member directory
///
/// Fails closed: any uncertainty about the directory or the remote
/// address is a 500, and only a confirmed member is forwarded.
pub async fn require_member(
    State(cache): State<DirectoryCache>,
    req: Request,
    next: Next,
) -> Response {
    let snapshot = match cache.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("directory lookup failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to look up member directory",
            )
                .into_response();
        }
    };

    // The listener must be built with connect info for the remote
    // address to be present; its absence means a misconfigured server,
    // not a hostile client.
    let Some(remote) = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
    else {
        tracing::error!("request carries no remote address; was the listener set up with connect info?");
        return (StatusCode::INTERNAL_SERVER_ERROR, "remote address unavailable").into_response();
    };

    if !snapshot.contains(remote.ip()) {
        tracing::debug!("rejected non-member {}", remote.ip());
        return (StatusCode::UNAUTHORIZED, "not a tailnet member").into_response();
    }

    next.run(req).await
}

/// Wrap a router so every route requires tailnet membership
pub fn protect(router: Router, cache: DirectoryCache) -> Router {
    router.layer(axum::middleware::from_fn_with_state(cache, require_member))
}

/// Default bound on one directory fetch for [`protect_with_ttl`]
const DEFAULT_FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Wrap a router with a freshly built cache over the `tailscale` CLI
///
/// Convenience for services that do not need to share or inject the
/// cache. A zero TTL disables caching and fetches on every request.
pub fn protect_with_ttl(router: Router, cache_ttl: std::time::Duration) -> Router {
    let source = tg_core::tailscale::TailscaleCli::new(DEFAULT_FETCH_TIMEOUT);
    protect(router, DirectoryCache::new(source, cache_ttl))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;
    use crate::testutil::{peer, ScriptedSource, SharedSource};

    fn scripted_cache(
        script: impl IntoIterator<Item = Result<Vec<tg_core::Peer>, String>>,
        ttl: Duration,
    ) -> DirectoryCache {
        DirectoryCache::new(ScriptedSource::new(script), ttl)
    }

    fn app(cache: DirectoryCache) -> Router {
        let router = Router::new().route("/", get(|| async { "ok" }));
        protect(router, cache)
    }

    fn request_from(remote: &str) -> HttpRequest<Body> {
        let mut req = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        let addr: SocketAddr = remote.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req
    }

    #[tokio::test]
    async fn test_member_is_forwarded() {
        let cache = scripted_cache(
            [Ok(vec![peer("alice", "100.64.0.9")])],
            Duration::from_secs(30),
        );
        let response = app(cache)
            .oneshot(request_from("100.64.0.9:5000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_member_port_is_ignored() {
        let cache = scripted_cache(
            [Ok(vec![peer("alice", "100.64.0.9")])],
            Duration::from_secs(30),
        );
        let response = app(cache)
            .oneshot(request_from("100.64.0.9:61234"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_member_is_rejected() {
        let cache = scripted_cache(
            [Ok(vec![peer("alice", "100.64.0.9")])],
            Duration::from_secs(30),
        );
        let response = app(cache)
            .oneshot(request_from("100.64.0.1:5000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_directory_failure_is_server_error() {
        let cache = scripted_cache([Err("backend stopped".to_string())], Duration::from_secs(30));
        let response = app(cache)
            .oneshot(request_from("100.64.0.9:5000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_remote_address_is_server_error() {
        let cache = scripted_cache(
            [Ok(vec![peer("alice", "100.64.0.9")])],
            Duration::from_secs(30),
        );
        // No ConnectInfo extension on this request.
        let req = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(cache).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_repeated_requests_share_the_cache() {
        let source = Arc::new(ScriptedSource::new([Ok(vec![peer("alice", "100.64.0.9")])]));
        let cache = DirectoryCache::new(SharedSource(Arc::clone(&source)), Duration::from_secs(30));
        let app = app(cache);

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(request_from("100.64.0.9:5000"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(source.calls(), 1);
    }
}
