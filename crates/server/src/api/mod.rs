pub mod events;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
