//! API routes module.

pub mod auth_handlers;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
