//! Full-text search over committed records
//!
//! Tokens come from the original name, the tags and the category. A query
//! token matches a record token exactly or as a substring; all query tokens
//! must match (AND). Results rank by the number of exact matches, then by
//! upload time (newest first), then by id.

use std::collections::{BTreeSet, HashMap, HashSet};

use assetflow_core::{AssetRecord, SearchFilters};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::IndexError;

/// Lower-case, split on non-alphanumeric boundaries, deduplicate.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

pub fn record_tokens(record: &AssetRecord) -> BTreeSet<String> {
    let mut tokens = tokenize(&record.original_name);
    tokens.extend(tokenize(&record.category));
    for tag in &record.tags {
        tokens.extend(tokenize(tag));
    }
    tokens
}

/// Search seam used by the pipeline, the bulk coordinator and tests.
#[async_trait]
pub trait AssetIndex: Send + Sync {
    /// Replace the postings of `record.id`.
    async fn index(&self, record: &AssetRecord) -> Result<(), IndexError>;

    async fn remove(&self, id: Uuid) -> Result<(), IndexError>;

    /// Matching ids in rank order.
    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<Vec<Uuid>, IndexError>;

    /// Drop everything and index `records`.
    async fn rebuild(&self, records: &[AssetRecord]) -> Result<(), IndexError>;

    async fn len(&self) -> usize;

    async fn contains(&self, id: Uuid) -> bool;
}

#[derive(Debug, Clone)]
struct IndexedDoc {
    tokens: BTreeSet<String>,
    category: String,
    mime_type: String,
    uploaded_at: DateTime<Utc>,
}

#[derive(Default)]
struct IndexState {
    docs: HashMap<Uuid, IndexedDoc>,
    postings: HashMap<String, HashSet<Uuid>>,
}

impl IndexState {
    fn insert(&mut self, record: &AssetRecord) {
        self.evict(record.id);
        let doc = IndexedDoc {
            tokens: record_tokens(record),
            category: record.category.clone(),
            mime_type: record.mime_type.clone(),
            uploaded_at: record.uploaded_at,
        };
        for token in &doc.tokens {
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(record.id);
        }
        self.docs.insert(record.id, doc);
    }

    fn evict(&mut self, id: Uuid) {
        let Some(doc) = self.docs.remove(&id) else {
            return;
        };
        for token in &doc.tokens {
            if let Some(ids) = self.postings.get_mut(token) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(token);
                }
            }
        }
    }

    /// Ids whose tokens contain `needle` (exact or substring).
    fn candidates(&self, needle: &str) -> HashSet<Uuid> {
        self.postings
            .iter()
            .filter(|(token, _)| token.contains(needle))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    fn search(&self, query: &str, filters: &SearchFilters) -> Vec<Uuid> {
        let query_tokens = tokenize(query);

        let matching: Vec<Uuid> = if query_tokens.is_empty() {
            self.docs.keys().copied().collect()
        } else {
            let mut iter = query_tokens.iter();
            let mut acc = match iter.next() {
                Some(first) => self.candidates(first),
                None => HashSet::new(),
            };
            for token in iter {
                if acc.is_empty() {
                    break;
                }
                let next = self.candidates(token);
                acc.retain(|id| next.contains(id));
            }
            acc.into_iter().collect()
        };

        let mut ranked: Vec<(usize, DateTime<Utc>, Uuid)> = matching
            .into_iter()
            .filter_map(|id| {
                let doc = self.docs.get(&id)?;
                if !filters.matches_parts(&doc.category, &doc.mime_type, doc.uploaded_at) {
                    return None;
                }
                let exact = query_tokens
                    .iter()
                    .filter(|t| doc.tokens.contains(*t))
                    .count();
                Some((exact, doc.uploaded_at, id))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        ranked.into_iter().map(|(_, _, id)| id).collect()
    }
}

/// In-memory inverted index
#[derive(Default)]
pub struct SearchIndexer {
    state: RwLock<IndexState>,
}

impl SearchIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids posted under an exact token, sorted.
    pub async fn postings(&self, token: &str) -> Vec<Uuid> {
        let state = self.state.read().await;
        let mut ids: Vec<Uuid> = state
            .postings
            .get(token)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub async fn token_count(&self) -> usize {
        self.state.read().await.postings.len()
    }
}

#[async_trait]
impl AssetIndex for SearchIndexer {
    async fn index(&self, record: &AssetRecord) -> Result<(), IndexError> {
        self.state.write().await.insert(record);
        tracing::debug!(asset_id = %record.id, "Record indexed");
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), IndexError> {
        self.state.write().await.evict(id);
        Ok(())
    }

    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<Vec<Uuid>, IndexError> {
        Ok(self.state.read().await.search(query, filters))
    }

    async fn rebuild(&self, records: &[AssetRecord]) -> Result<(), IndexError> {
        let mut fresh = IndexState::default();
        for record in records {
            fresh.insert(record);
        }
        *self.state.write().await = fresh;
        tracing::info!(records = records.len(), "Search index rebuilt");
        Ok(())
    }

    async fn len(&self) -> usize {
        self.state.read().await.docs.len()
    }

    async fn contains(&self, id: Uuid) -> bool {
        self.state.read().await.docs.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetflow_core::AssetKind;
    use chrono::Duration;

    fn record(name: &str, category: &str, tags: &[&str], age_minutes: i64) -> AssetRecord {
        AssetRecord {
            id: Uuid::new_v4(),
            category: category.to_string(),
            original_name: name.to_string(),
            size_bytes: 1,
            mime_type: "image/jpeg".to_string(),
            kind: AssetKind::Image,
            storage_key: format!("services/{}/{}", category, name),
            storage_url: String::new(),
            etag: String::new(),
            stored_content_type: "image/jpeg".to_string(),
            stored_size_bytes: 1,
            width: None,
            height: None,
            thumbnail: None,
            uploaded_at: Utc::now() - Duration::minutes(age_minutes),
            is_featured: false,
            sort_order: 0,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_tokenize() {
        let tokens: Vec<_> = tokenize("Portfolio-Projekt1.JPG projekt1").into_iter().collect();
        assert_eq!(tokens, vec!["jpg", "portfolio", "projekt1"]);
        assert!(tokenize(" -_. ").is_empty());
    }

    #[tokio::test]
    async fn test_substring_and_tag_matches() {
        let index = SearchIndexer::new();
        let r = record("portfolio-projekt1.jpg", "sup", &["outdoor"], 0);
        index.index(&r).await.unwrap();

        let none = SearchFilters::default();
        assert_eq!(index.search("projekt", &none).await.unwrap(), vec![r.id]);
        assert_eq!(index.search("outdoor", &none).await.unwrap(), vec![r.id]);
        assert!(index.search("unrelated", &none).await.unwrap().is_empty());
        assert!(index.search("projekt unrelated", &none).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exact_matches_rank_first() {
        let index = SearchIndexer::new();
        let substring_only = record("boards-summer.jpg", "sup", &[], 0);
        let exact = record("board.jpg", "sup", &[], 60);
        index.index(&substring_only).await.unwrap();
        index.index(&exact).await.unwrap();

        let hits = index.search("board", &SearchFilters::default()).await.unwrap();
        assert_eq!(hits, vec![exact.id, substring_only.id]);
    }

    #[tokio::test]
    async fn test_empty_query_returns_newest_first() {
        let index = SearchIndexer::new();
        let old = record("a.jpg", "sup", &[], 30);
        let new = record("b.jpg", "sup", &[], 1);
        let other = record("c.jpg", "photobox", &[], 0);
        for r in [&old, &new, &other] {
            index.index(r).await.unwrap();
        }

        let filters = SearchFilters {
            category: Some("sup".to_string()),
            ..Default::default()
        };
        assert_eq!(index.search("  ", &filters).await.unwrap(), vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn test_reindex_replaces_postings() {
        let index = SearchIndexer::new();
        let mut r = record("sunset.jpg", "sup", &[], 0);
        index.index(&r).await.unwrap();
        index.index(&r).await.unwrap();
        assert_eq!(index.postings("sunset").await, vec![r.id]);

        r.tags.insert("beach".to_string());
        index.index(&r).await.unwrap();
        assert_eq!(index.postings("beach").await, vec![r.id]);
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_drops_empty_postings() {
        let index = SearchIndexer::new();
        let r = record("unique-name.jpg", "sup", &[], 0);
        index.index(&r).await.unwrap();
        let before = index.token_count().await;

        index.remove(r.id).await.unwrap();
        assert!(index.postings("unique").await.is_empty());
        assert_eq!(index.token_count().await, 0);
        assert!(before > 0);
        assert!(!index.contains(r.id).await);
    }
}
