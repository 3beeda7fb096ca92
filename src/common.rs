pub mod error;
pub mod extract;
pub mod lenient;
pub mod response;
pub mod search;
