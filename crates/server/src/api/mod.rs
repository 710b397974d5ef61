pub mod channels;
pub mod handlers;
pub mod middleware;
pub mod releases;
pub mod routes;
pub mod subscriptions;

pub use routes::create_router;
