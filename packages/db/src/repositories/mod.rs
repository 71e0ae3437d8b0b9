//! Repository implementations for database operations.

mod item_repo;

pub use item_repo::ItemRepository;
