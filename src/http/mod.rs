//! HTTP layer for the Recharge API
//!
//! Provides:
//! - `RechargeClient` - Authenticated client with retry and rate limiting
//! - `RateLimiter` - Client-side request budget (100 calls per minute)
//! - `RequestConfig` - Per-request query/header configuration

mod client;
mod rate_limit;

pub use client::{
    HttpClientConfig, HttpClientConfigBuilder, RechargeClient, RequestConfig, API_VERSION,
    BASE_URL, LEGACY_API_VERSION, MAX_PARSE_RETRIES,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
