pub mod addresses;
pub mod admin;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod dashboard;
pub mod favorites;
pub mod orders;
pub mod payments;
pub mod products;
