mod helpers;

use std::sync::Arc;

use assetflow_core::SearchFilters;
use assetflow_db::{JsonFileStore, MemoryStore};
use assetflow_services::{AssetIndex, IngestItem, PipelineContext, SearchIndexer};
use assetflow_storage::MemoryStorage;
use chrono::{Duration, Utc};
use helpers::fixtures::{create_test_png, fast_config, png_item, text_item};
use helpers::setup_test_app;

#[tokio::test]
async fn test_name_and_tag_tokens_are_searchable() {
    let app = setup_test_app();
    let result = app
        .ctx
        .pipeline()
        .ingest(vec![IngestItem::from_bytes(
            "portfolio-projekt1.jpg",
            "image/png",
            "sup",
            create_test_png(32, 32),
        )])
        .await;
    let id = result.succeeded[0].id;

    let mut selection = app.ctx.selection();
    selection.select(id);
    selection.tag_selected(&["outdoor"]).await;

    let none = SearchFilters::default();
    for query in ["projekt", "outdoor", "PORTFOLIO", "sup"] {
        let hits = app.ctx.search(query, &none).await.unwrap();
        assert_eq!(hits.len(), 1, "query {query}");
        assert_eq!(hits[0].id, id);
    }
    assert!(app.ctx.search("unrelated", &none).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reindexing_keeps_single_postings() {
    let index = Arc::new(SearchIndexer::new());
    let ctx = PipelineContext::with_index(
        fast_config(),
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryStore::new()),
        index.clone(),
    )
    .unwrap();

    let result = ctx.pipeline().ingest(vec![text_item("lake.txt", "sup", 8)]).await;
    let record = &result.succeeded[0];

    ctx.metadata().put(record).await.unwrap();
    index.index(record).await.unwrap();
    index.index(record).await.unwrap();

    assert_eq!(index.postings("lake").await, vec![record.id]);
    assert_eq!(index.len().await, 1);
    assert_eq!(ctx.metadata().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_filters_and_ordering() {
    let app = setup_test_app();
    let result = app
        .ctx
        .pipeline()
        .ingest(vec![
            png_item("board.png", "sup", 8, 8),
            text_item("board-rules.txt", "sup", 8),
            text_item("board.txt", "photobox", 8),
        ])
        .await;
    assert_eq!(result.succeeded.len(), 3);

    let sup = SearchFilters {
        category: Some("sup".to_string()),
        ..Default::default()
    };
    let hits = app.ctx.search("board", &sup).await.unwrap();
    assert_eq!(hits.len(), 2);

    let images = SearchFilters {
        major_type: Some("image".to_string()),
        ..Default::default()
    };
    let hits = app.ctx.search("board", &images).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].original_name, "board.png");

    let future = SearchFilters {
        from: Some(Utc::now() + Duration::hours(1)),
        ..Default::default()
    };
    assert!(app.ctx.search("board", &future).await.unwrap().is_empty());

    let today = SearchFilters {
        from: Some(Utc::now() - Duration::hours(1)),
        to: Some(Utc::now() + Duration::hours(1)),
        ..Default::default()
    };
    assert_eq!(app.ctx.search("", &today).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_warm_up_restores_index_and_analytics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    let storage = Arc::new(MemoryStorage::new());

    {
        let store = Arc::new(JsonFileStore::open(path.clone()).await.unwrap());
        let ctx = PipelineContext::new(fast_config(), storage.clone(), store).unwrap();
        let result = ctx
            .pipeline()
            .ingest(vec![
                text_item("harbour.txt", "wohnmobil", 1000),
                text_item("dunes.txt", "wohnmobil", 2000),
            ])
            .await;
        assert_eq!(result.succeeded.len(), 2);
    }

    let store = Arc::new(JsonFileStore::open(path.clone()).await.unwrap());
    let ctx = PipelineContext::new(fast_config(), storage, store).unwrap();
    assert!(ctx.search("harbour", &SearchFilters::default()).await.unwrap().is_empty());

    assert_eq!(ctx.warm_up().await.unwrap(), 2);
    assert_eq!(ctx.search("harbour", &SearchFilters::default()).await.unwrap().len(), 1);

    let stats = ctx.stats().await;
    assert_eq!(stats.total_count, 2);
    assert_eq!(stats.average_file_size, 1500);
    assert_eq!(stats.most_used_category.as_deref(), Some("wohnmobil"));
}
