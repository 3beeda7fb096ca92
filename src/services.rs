pub mod auth;
pub mod backup_service;
pub mod client_service;
pub mod file_service;
pub mod mailer;
pub mod product_service;
pub mod rent_service;
pub mod scheduler;
pub mod user_service;
