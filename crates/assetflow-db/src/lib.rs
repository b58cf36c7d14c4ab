//! Assetflow metadata persistence
//!
//! Durable key-value storage for committed `AssetRecord`s. The services crate
//! only sees the `PersistentStore` trait; backends are an in-memory map, a
//! JSON file written atomically, and a PostgreSQL table holding one JSONB row
//! per record.

pub mod factory;
pub mod json_file;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use assetflow_core::StoreBackend;
pub use factory::create_store;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use postgres::PgAssetStore;
pub use traits::{PersistentStore, StoreError, StoreResult};
