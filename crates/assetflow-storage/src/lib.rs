//! Assetflow Storage Library
//!
//! Object storage abstraction for assetflow. It includes the `Storage` trait,
//! a local filesystem backend and an in-memory backend.
//!
//! # Storage key format
//!
//! - **Assets**: `services/{category}/{millis}-{suffix}-{filename}`
//! - **Thumbnails**: `thumbnails/{category}/{millis}-{suffix}-{filename}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.
//!
//! `Storage::put` is create-only: writing to an existing key fails with
//! `StorageError::AlreadyExists` and leaves the stored object untouched.

pub mod factory;
pub mod keys;
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use assetflow_core::StorageBackend;
pub use factory::create_storage;
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use traits::{compute_etag, Storage, StorageError, StorageResult};
