use std::sync::Arc;

use crate::domain::service::AvailabilityService;
use crate::infrastructure::cache::client::RedisCache;

pub struct AvailabilityAppState {
    pub availability: Arc<AvailabilityService>,
    /// Best-effort cache for the read-heavy calendar/analytics endpoints.
    /// `None` when Redis is not configured; handlers fall through to the
    /// engine either way.
    pub cache: Option<RedisCache>,
}
