pub mod confirmation;
pub mod gateway;
mod routes;
pub mod service;
mod utils;

pub use routes::get_router;
