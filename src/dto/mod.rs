pub mod admin;
pub mod appointments;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod profile;
