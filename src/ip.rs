//! Client IP extraction for review attribution and moderation.

use actix_web::HttpRequest;
use std::net::IpAddr;

fn header_ip(req: &HttpRequest, name: &str) -> Option<String> {
    let raw = req.headers().get(name)?.to_str().ok()?;
    // For proxy chains, the first entry is the original client
    let candidate = raw.split(',').next()?.trim();
    candidate.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

/// The client address behind `req`, in order of preference: first entry of
/// X-Forwarded-For, then X-Real-IP, then the remote peer address. Header
/// values that do not parse as an IP address are skipped.
///
/// Addresses are stored on reviews for moderation; hosts with retention
/// requirements should scrub the column themselves.
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    header_ip(req, "x-forwarded-for")
        .or_else(|| header_ip(req, "x-real-ip"))
        .or_else(|| req.peer_addr().map(|peer| peer.ip().to_string()))
}
