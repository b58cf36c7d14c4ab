use std::sync::Arc;

use anyhow::Context;
use assetflow_core::{AssetRecord, PipelineConfig, StorageSettings, StoreSettings};
use assetflow_db::create_store;
use assetflow_services::PipelineContext;
use assetflow_storage::create_storage;
use serde::Serialize;

/// Build the context from `ASSETFLOW_*` variables and warm it up from the store.
pub async fn build_context() -> anyhow::Result<Arc<PipelineContext>> {
    let config = PipelineConfig::from_env().context("Invalid pipeline configuration")?;
    let storage_settings = StorageSettings::from_env().context("Invalid storage configuration")?;
    let store_settings = StoreSettings::from_env().context("Invalid store configuration")?;
    store_settings.validate()?;

    let storage = create_storage(&storage_settings)
        .await
        .context("Failed to initialize object storage")?;
    let store = create_store(&store_settings)
        .await
        .context("Failed to initialize metadata store")?;

    let ctx = PipelineContext::new(config, storage, store)?;
    let loaded = ctx.warm_up().await.context("Failed to load existing records")?;
    tracing::debug!(records = loaded, "Context warmed up");
    Ok(ctx)
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// One table line per record for `list` and `search`.
pub fn record_line(record: &AssetRecord) -> String {
    format!(
        "{}  {:<12} {:<32} {:>10}  {}{}",
        record.id,
        truncate_string(&record.category, 12),
        truncate_string(&record.original_name, 32),
        record.size_bytes,
        record.storage_url,
        if record.is_featured { "  *" } else { "" }
    )
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("portfolio-projekt1.jpg", 12), "portfolio...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_counts_chars() {
        assert_eq!(truncate_string("größenänderung", 8), "größe...");
    }
}
