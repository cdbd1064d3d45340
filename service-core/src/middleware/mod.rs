pub mod metrics;
pub mod rate_limit;
pub mod security_headers;
pub mod tracing;

pub use self::metrics::metrics_middleware;
pub use self::rate_limit::{
    IpRateLimiter, UnkeyedRateLimiter, create_ip_rate_limiter, create_unkeyed_rate_limiter,
    ip_rate_limit_middleware, rate_limit_middleware,
};
pub use self::security_headers::security_headers_middleware;
pub use self::tracing::{REQUEST_ID_HEADER, request_id_middleware};
