mod repository;
mod routes;

pub use routes::get_admin_router;
