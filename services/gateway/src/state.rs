//! Shared application state
//!
//! The engine is an explicit value owned here and injected into handlers
//! through axum state; there is no process-global.

use crate::rate_limit::RateLimiter;
use matching_engine::MatchingEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchingEngine>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(engine: Arc<MatchingEngine>) -> Self {
        Self {
            engine,
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }
}
