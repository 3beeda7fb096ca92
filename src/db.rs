pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod rent_repo;
pub use rent_repo::RentRepository;
pub mod user_repo;
pub use user_repo::UserRepository;

pub mod memory;
pub mod mongo;
pub mod postgres;

pub mod storage;
pub use storage::{Repositories, Storage};
