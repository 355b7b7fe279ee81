//! Client IP extraction.
//!
//! Tracking installs sit behind a reverse proxy in practice, so the
//! forwarding headers are preferred over the peer address.

use actix_web::HttpRequest;

/// Extracts the client IP for click records.
///
/// Order: first hop of `X-Forwarded-For`, then `X-Real-IP`, then the
/// connection peer. Returns None on a unix socket with no headers set.
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    extract_forwarded_ip_from_headers(req.headers())
        .or_else(|| req.connection_info().peer_addr().map(strip_port))
}

/// Pulls the forwarded client IP out of a header map.
pub fn extract_forwarded_ip_from_headers(
    headers: &actix_web::http::header::HeaderMap,
) -> Option<String> {
    // X-Forwarded-For lists hops client-first
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Peer addresses arrive as `ip:port` for TCP; the click record wants
/// just the address.
fn strip_port(addr: &str) -> String {
    if let Ok(socket_addr) = addr.parse::<std::net::SocketAddr>() {
        return socket_addr.ip().to_string();
    }
    addr.to_string()
}
