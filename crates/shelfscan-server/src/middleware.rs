use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

#[derive(Debug)]
struct ClientWindows {
    clients: HashMap<IpAddr, RateLimitWindow>,
    last_pruned: Instant,
}

/// Fixed-window limiter with one window per client IP.
///
/// Requests without connection info (e.g. router tests that skip
/// `into_make_service_with_connect_info`) share the unspecified address.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<ClientWindows>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(ClientWindows {
                clients: HashMap::new(),
                last_pruned: Instant::now(),
            })),
        }
    }
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
            addr.ip()
        })
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing a fixed request-per-window limit for each client IP.
///
/// Expired windows are dropped at most once per window length.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    let mut windows = rate_limit.state.lock().await;

    if windows.last_pruned.elapsed() >= rate_limit.window {
        windows
            .clients
            .retain(|_, w| w.started_at.elapsed() < rate_limit.window);
        windows.last_pruned = Instant::now();
    }

    let window = windows
        .clients
        .entry(ip)
        .or_insert_with(|| RateLimitWindow {
            started_at: Instant::now(),
            count: 0,
        });

    if window.started_at.elapsed() >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        drop(windows);
        tracing::warn!(
            client = %ip,
            max_requests = rate_limit.max_requests,
            "rate limit exceeded"
        );
        return ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate limit exceeded, try again later",
            Some("rate_limited"),
        )
        .into_response();
    }

    window.count += 1;
    drop(windows);

    next.run(req).await
}
