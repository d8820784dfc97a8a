pub mod repository;
mod routes;
pub mod service;

pub use routes::{get_admin_router, get_router};
