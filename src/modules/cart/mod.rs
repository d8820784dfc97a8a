pub mod repository;
mod routes;

pub use routes::{build_cart, get_router, load_cart, Cart};
