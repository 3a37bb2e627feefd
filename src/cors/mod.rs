//! Cross-Origin Resource Sharing (CORS) for browser clients.
//!
//! Disabled unless `CORS_ENABLED=true`. When enabled the defaults admit the
//! cookie-carrying single-page app the service was built for.

mod config;
mod layer;

pub use config::CorsConfig;
pub use layer::build_cors_layer;
