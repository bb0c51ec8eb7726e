pub mod config_providers;
pub mod middleware;

/// Re-export commonly used types from adapters
pub use config_providers::FileConfigProvider;
pub use middleware::{GuardState, guard_middleware, reject_response, with_guard};
