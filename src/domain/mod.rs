//! Business rules that do not touch the database: pricing, order expiry,
//! guest cart reconciliation, slugs and the admin capability table.

pub mod capabilities;
pub mod cart;
pub mod order;
pub mod slug;
