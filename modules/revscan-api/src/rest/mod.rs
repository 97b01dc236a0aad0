pub mod analyze;
pub mod rate_limit;

pub use analyze::api_analyze;
pub use rate_limit::{RateLimiter, ANALYSES_PER_HOUR};
