use crate::traits::{PersistentStore, StoreResult};
use assetflow_core::{AssetRecord, StoreBackend};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

/// PostgreSQL-backed store: one row per asset, the record kept as JSONB.
#[derive(Clone)]
pub struct PgAssetStore {
    pool: PgPool,
}

impl PgAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and create the schema if it is missing.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        tracing::info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Database connected successfully");

        let store = Self::new(pool);
        store.initialize().await?;
        Ok(store)
    }

    /// Create the assets table and its indexes
    pub async fn initialize(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS assets (
                id UUID PRIMARY KEY,
                category TEXT NOT NULL,
                uploaded_at TIMESTAMPTZ NOT NULL,
                record JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_assets_category_uploaded ON assets (category, uploaded_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("PostgreSQL asset store initialized");
        Ok(())
    }
}

#[async_trait]
impl PersistentStore for PgAssetStore {
    #[tracing::instrument(skip(self, record), fields(db.table = "assets", db.operation = "upsert", db.record_id = %record.id))]
    async fn put(&self, record: &AssetRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assets (id, category, uploaded_at, record)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET record = EXCLUDED.record
            "#,
        )
        .bind(record.id)
        .bind(&record.category)
        .bind(record.uploaded_at)
        .bind(Json(record))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> StoreResult<Option<AssetRecord>> {
        let row = sqlx::query_scalar::<Postgres, Json<AssetRecord>>(
            "SELECT record FROM assets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(record)| record))
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select"))]
    async fn scan_all(&self) -> StoreResult<Vec<AssetRecord>> {
        let rows = sqlx::query_scalar::<Postgres, Json<AssetRecord>>(
            "SELECT record FROM assets ORDER BY uploaded_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|Json(record)| record).collect())
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Postgres
    }
}
