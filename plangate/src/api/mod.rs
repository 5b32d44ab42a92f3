pub mod dto;
mod extractors;
mod handlers;
mod middleware;
pub mod openapi;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
