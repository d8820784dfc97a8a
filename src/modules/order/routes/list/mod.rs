mod handler;
mod service;
mod types;

pub use handler::{admin_handler, handler};
