//! Request-level middleware: rate limiting.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Requests allowed per source IP per window.
const RATE_LIMIT_PER_WINDOW: u32 = 120;

/// Fixed window length.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// In-memory rate limiter state.
///
/// Uses a simple fixed window counter keyed by source IP.
#[derive(Clone, Debug, Default)]
pub struct RateLimiter {
    state: Arc<Mutex<HashMap<IpAddr, (u32, Instant)>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the request is allowed.
    ///
    /// Returns `true` if allowed, `false` if limit exceeded.
    pub fn check(&self, ip: IpAddr, limit: u32) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // Lock poisoned by a panicked thread. Recover with the stale
                // counters rather than refusing every request.
                tracing::error!("rate limiter lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };
        let now = Instant::now();

        let entry = state.entry(ip).or_insert((0, now));
        if now.duration_since(entry.1) > RATE_LIMIT_WINDOW {
            *entry = (0, now);
        }

        if entry.0 >= limit {
            return false;
        }
        entry.0 += 1;
        true
    }
}

/// Middleware that applies the fixed-window limit per source IP.
///
/// Falls back to the loopback address when the transport provides no peer
/// address (unit tests drive the router without a socket).
pub async fn rate_limit_middleware(
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let limiter = req
        .extensions()
        .get::<Arc<crate::AppState>>()
        .map(|state| state.rate_limiter.clone())
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    if !limiter.check(ip, RATE_LIMIT_PER_WINDOW) {
        tracing::warn!(%ip, "rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}
