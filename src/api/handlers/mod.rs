//! HTTP request handlers.

pub mod auth_handler;
pub mod template_handler;
pub mod user_handler;

pub use auth_handler::auth_routes;
pub use template_handler::template_routes;
pub use user_handler::user_routes;
