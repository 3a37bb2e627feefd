//! HTTP surface: response envelope, handlers and routes.

pub mod handlers;
pub mod response;
pub mod routes;

pub use response::{ApiResponse, JsonResponse};
pub use routes::router;
