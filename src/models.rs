pub mod auth;
pub mod backup;
pub mod client;
pub mod product;
pub mod rent;
