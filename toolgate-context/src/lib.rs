mod config;
mod middleware;
mod optimizer;
mod truncate;

pub use config::ContextConfig;
pub use middleware::ContextMiddleware;
pub use optimizer::optimize_result;
pub use truncate::{truncate_utf8_safe, SENTINEL};
