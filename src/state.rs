use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ResetPolicy;
use crate::rate_limit::RateLimiter;
use crate::store::CounterStore;
use crate::validator::IdentityValidator;
// app's shared state

pub struct AppState {
    pub store: Arc<dyn CounterStore>,
    pub validator: Arc<dyn IdentityValidator>,
    pub rate_limiter: RateLimiter,  // the only in-process mutable state
    pub reset_policy: ResetPolicy,
    pub trusted_proxy_hops: usize,
    pub public_dir: PathBuf,
}
