//! Client-identifier extraction.
//!
//! The lockout tracker and rate limiters key on the client's source address.
//! Behind a proxy the socket address is the proxy, so `X-Forwarded-For` is
//! consulted first, trusting the configured number of proxy hops at the tail
//! of the chain. Unattributable requests share the "unknown" bucket.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Extractor form of [`client_id`], usable alongside `Json`/`Multipart`.
#[derive(Debug, Clone)]
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let socket_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        Ok(ClientId(client_id(
            &parts.headers,
            socket_addr,
            trusted_proxy_count(),
        )))
    }
}

/// Number of proxy hops to trust in `X-Forwarded-For`, from the environment
/// (`TRUSTED_PROXY_COUNT`, default 1 for a typical load-balancer setup).
pub fn trusted_proxy_count() -> usize {
    std::env::var("TRUSTED_PROXY_COUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1)
}

/// Resolve the client identifier for a request.
pub fn client_id(
    headers: &HeaderMap,
    socket_addr: Option<SocketAddr>,
    trusted_proxies: usize,
) -> String {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| forwarded_client(chain, trusted_proxies))
    {
        return ip;
    }

    match socket_addr {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

/// Pick the client entry out of an `X-Forwarded-For` chain.
///
/// The chain reads `client, proxy1, proxy2, ...`; with N trusted proxies the
/// client sits N entries from the end. A chain shorter than the trust depth,
/// or a non-IP entry, yields `None` so the caller falls back to the socket.
fn forwarded_client(chain: &str, trusted_proxies: usize) -> Option<String> {
    let hops: Vec<&str> = chain
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let candidate = if trusted_proxies == 0 || hops.len() <= trusted_proxies {
        // Nothing (or not enough) to trust: use the hop closest to us.
        *hops.last()?
    } else {
        hops[hops.len() - trusted_proxies - 1]
    };

    candidate.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_xff(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_single_hop() {
        assert_eq!(
            forwarded_client("192.168.1.1", 1),
            Some("192.168.1.1".to_string())
        );
    }

    #[test]
    fn test_client_before_trusted_proxy() {
        assert_eq!(
            forwarded_client("192.168.1.1, 10.0.0.1", 1),
            Some("192.168.1.1".to_string())
        );
        assert_eq!(
            forwarded_client("192.168.1.1, 10.0.0.1, 10.0.0.2", 2),
            Some("192.168.1.1".to_string())
        );
    }

    #[test]
    fn test_untrusted_chain_uses_nearest_hop() {
        assert_eq!(
            forwarded_client("192.168.1.1, 10.0.0.1", 0),
            Some("10.0.0.1".to_string())
        );
    }

    #[test]
    fn test_invalid_entries_rejected() {
        assert_eq!(forwarded_client("not.an.ip", 0), None);
        assert_eq!(forwarded_client("", 1), None);
    }

    #[test]
    fn test_socket_fallback() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
        assert_eq!(client_id(&HeaderMap::new(), Some(addr), 1), "127.0.0.1");
        assert_eq!(client_id(&HeaderMap::new(), None, 1), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_header_wins_over_socket() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
        assert_eq!(
            client_id(&headers_with_xff("203.0.113.9"), Some(addr), 1),
            "203.0.113.9"
        );
    }
}
