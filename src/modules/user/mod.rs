pub mod repository;
mod routes;

pub use routes::{get_admin_router, get_router};
