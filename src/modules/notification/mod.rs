pub mod service;
pub mod whatsapp;
