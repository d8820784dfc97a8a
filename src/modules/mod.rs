pub mod address;
pub mod auth;
pub mod back_in_stock;
pub mod cart;
pub mod dashboard;
pub mod discount;
pub mod newsletter;
pub mod notification;
pub mod offer;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod user;
pub mod wishlist;

mod router;
pub use router::get_router;
