pub mod fixtures;
pub mod index;
pub mod storage;
pub mod store;

use std::sync::Arc;

use assetflow_core::PipelineConfig;
use assetflow_db::{MemoryStore, PersistentStore};
use assetflow_services::{AssetIndex, PipelineContext};
use assetflow_storage::{MemoryStorage, Storage};

/// Context over in-memory backends, with handles to the backends for assertions
pub struct TestApp {
    pub ctx: Arc<PipelineContext>,
    pub storage: Arc<MemoryStorage>,
    pub store: Arc<MemoryStore>,
}

pub fn setup_test_app() -> TestApp {
    setup_with_config(fixtures::fast_config())
}

pub fn setup_with_config(config: PipelineConfig) -> TestApp {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(MemoryStore::new());
    let ctx = PipelineContext::new(config, storage.clone(), store.clone())
        .expect("test config is valid");
    TestApp {
        ctx,
        storage,
        store,
    }
}

/// Context over caller-provided backends
pub fn setup_with(
    storage: Arc<dyn Storage>,
    store: Arc<dyn PersistentStore>,
    index: Option<Arc<dyn AssetIndex>>,
) -> Arc<PipelineContext> {
    let config = fixtures::fast_config();
    let ctx = match index {
        Some(index) => PipelineContext::with_index(config, storage, store, index),
        None => PipelineContext::new(config, storage, store),
    };
    ctx.expect("test config is valid")
}
