//! Upload analytics
//!
//! Counters keyed by `{category, major type, day}`. Each counter is a pair of
//! atomics; the map lock is only taken for writing when a new key appears.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use assetflow_core::models::analytics::average;
use assetflow_core::models::DayStats;
use assetflow_core::{
    AggregateKey, AggregateRow, AnalyticsSummary, AssetRecord, CategoryStats, StorageUsage,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct Counters {
    count: AtomicU64,
    total_bytes: AtomicU64,
}

impl Counters {
    fn add(&self, size_bytes: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(size_bytes, Ordering::Relaxed);
    }

    fn load(&self) -> (u64, u64) {
        (
            self.count.load(Ordering::Relaxed),
            self.total_bytes.load(Ordering::Relaxed),
        )
    }
}

#[derive(Default)]
pub struct AnalyticsCollector {
    counters: RwLock<HashMap<AggregateKey, Arc<Counters>>>,
    seeded: AtomicBool,
    storage_quota_bytes: u64,
}

impl AnalyticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage_quota(storage_quota_bytes: u64) -> Self {
        Self {
            storage_quota_bytes,
            ..Self::default()
        }
    }

    fn key_for(record: &AssetRecord) -> AggregateKey {
        AggregateKey {
            category: record.category.clone(),
            major_type: record.major_type(),
            day: record.upload_day(),
        }
    }

    /// Count one committed record (declared size).
    pub async fn record(&self, record: &AssetRecord) {
        let key = Self::key_for(record);

        let existing = self.counters.read().await.get(&key).cloned();
        let counters = match existing {
            Some(counters) => counters,
            None => self.counters.write().await.entry(key).or_default().clone(),
        };
        counters.add(record.size_bytes);
    }

    /// One-time warm-up from existing records. Returns false if already seeded.
    pub async fn seed(&self, records: &[AssetRecord]) -> bool {
        if self.seeded.swap(true, Ordering::SeqCst) {
            return false;
        }
        for record in records {
            self.record(record).await;
        }
        tracing::info!(records = records.len(), "Analytics seeded");
        true
    }

    /// Every aggregate, sorted by key.
    pub async fn snapshot(&self) -> Vec<AggregateRow> {
        let counters = self.counters.read().await;
        let mut rows: Vec<AggregateRow> = counters
            .iter()
            .map(|(key, c)| {
                let (count, total_bytes) = c.load();
                AggregateRow {
                    key: key.clone(),
                    count,
                    total_bytes,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }

    /// `(count, total_bytes)` over everything.
    pub async fn totals(&self) -> (u64, u64) {
        self.snapshot()
            .await
            .iter()
            .fold((0, 0), |(c, t), row| (c + row.count, t + row.total_bytes))
    }

    pub async fn average_file_size(&self) -> u64 {
        let (count, total) = self.totals().await;
        average(total, count)
    }

    /// Category with the highest count; ties go to the smallest name.
    pub async fn most_used_category(&self) -> Option<String> {
        most_used(&self.per_category().await)
    }

    pub async fn per_category(&self) -> Vec<CategoryStats> {
        group_by(&self.snapshot().await, |key| key.category.clone())
    }

    pub async fn category_stats(&self, category: &str) -> CategoryStats {
        self.per_category()
            .await
            .into_iter()
            .find(|s| s.name == category)
            .unwrap_or_else(|| CategoryStats::new(category, 0, 0))
    }

    pub async fn per_major_type(&self) -> Vec<CategoryStats> {
        group_by(&self.snapshot().await, |key| key.major_type.clone())
    }

    pub async fn per_day(&self) -> Vec<DayStats> {
        let mut days: BTreeMap<_, (u64, u64)> = BTreeMap::new();
        for row in self.snapshot().await {
            let entry = days.entry(row.key.day).or_default();
            entry.0 += row.count;
            entry.1 += row.total_bytes;
        }
        days.into_iter()
            .map(|(day, (count, total_bytes))| DayStats {
                day,
                count,
                total_bytes,
            })
            .collect()
    }

    pub async fn summary(&self) -> AnalyticsSummary {
        let rows = self.snapshot().await;
        let by_category = group_by(&rows, |key| key.category.clone());
        let by_major_type = group_by(&rows, |key| key.major_type.clone());
        let (total_count, total_bytes) = rows
            .iter()
            .fold((0, 0), |(c, t), row| (c + row.count, t + row.total_bytes));

        AnalyticsSummary {
            total_count,
            total_bytes,
            average_file_size: average(total_bytes, total_count),
            most_used_category: most_used(&by_category),
            by_category,
            by_major_type,
            per_day: self.per_day().await,
            storage: StorageUsage::new(total_bytes, self.storage_quota_bytes),
        }
    }

    /// Declared bytes of every committed record against the quota.
    pub async fn storage_usage(&self) -> StorageUsage {
        let (_, total_bytes) = self.totals().await;
        StorageUsage::new(total_bytes, self.storage_quota_bytes)
    }
}

fn group_by(rows: &[AggregateRow], name: impl Fn(&AggregateKey) -> String) -> Vec<CategoryStats> {
    let mut groups: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let entry = groups.entry(name(&row.key)).or_default();
        entry.0 += row.count;
        entry.1 += row.total_bytes;
    }
    groups
        .into_iter()
        .map(|(name, (count, total))| CategoryStats::new(name, count, total))
        .collect()
}

/// Input is sorted by name, so the first maximum wins ties.
fn most_used(stats: &[CategoryStats]) -> Option<String> {
    let mut best: Option<&CategoryStats> = None;
    for s in stats.iter().filter(|s| s.count > 0) {
        if best.map_or(true, |b| s.count > b.count) {
            best = Some(s);
        }
    }
    best.map(|s| s.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetflow_core::AssetKind;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn record(category: &str, mime: &str, size: u64, day: u32) -> AssetRecord {
        AssetRecord {
            id: Uuid::new_v4(),
            category: category.to_string(),
            original_name: "x".to_string(),
            size_bytes: size,
            mime_type: mime.to_string(),
            kind: AssetKind::from_mime(mime),
            storage_key: "k".to_string(),
            storage_url: "u".to_string(),
            etag: "e".to_string(),
            stored_content_type: mime.to_string(),
            stored_size_bytes: size,
            width: None,
            height: None,
            thumbnail: None,
            uploaded_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            is_featured: false,
            sort_order: 0,
            tags: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_collector() {
        let analytics = AnalyticsCollector::new();
        assert_eq!(analytics.average_file_size().await, 0);
        assert_eq!(analytics.most_used_category().await, None);
        assert_eq!(analytics.category_stats("sup").await.count, 0);
    }

    #[tokio::test]
    async fn test_most_used_ties_pick_smallest_name() {
        let analytics = AnalyticsCollector::new();
        analytics.record(&record("photobox", "image/jpeg", 1, 1)).await;
        analytics.record(&record("camper", "image/jpeg", 1, 1)).await;
        assert_eq!(analytics.most_used_category().await.as_deref(), Some("camper"));

        analytics.record(&record("photobox", "video/mp4", 1, 2)).await;
        assert_eq!(analytics.most_used_category().await.as_deref(), Some("photobox"));
    }

    #[tokio::test]
    async fn test_breakdowns() {
        let analytics = AnalyticsCollector::new();
        analytics.record(&record("sup", "image/jpeg", 100, 1)).await;
        analytics.record(&record("sup", "image/png", 300, 1)).await;
        analytics.record(&record("sup", "video/mp4", 600, 2)).await;

        let snapshot = analytics.snapshot().await;
        assert_eq!(snapshot.len(), 2);

        let kinds = analytics.per_major_type().await;
        assert_eq!(kinds[0], CategoryStats::new("image", 2, 400));
        assert_eq!(kinds[1], CategoryStats::new("video", 1, 600));

        let days = analytics.per_day().await;
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].count, 2);

        let summary = analytics.summary().await;
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.total_bytes, 1000);
        assert_eq!(summary.average_file_size, 333);
    }

    #[tokio::test]
    async fn test_storage_usage_against_quota() {
        let analytics = AnalyticsCollector::with_storage_quota(4000);
        analytics.record(&record("sup", "image/jpeg", 1000, 1)).await;
        analytics.record(&record("sup", "video/mp4", 1000, 1)).await;

        let usage = analytics.storage_usage().await;
        assert_eq!(usage.used_bytes, 2000);
        assert_eq!(usage.quota_bytes, 4000);
        assert_eq!(usage.percentage, 50.0);
        assert_eq!(analytics.summary().await.storage, usage);
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let analytics = AnalyticsCollector::new();
        let records = vec![record("sup", "image/jpeg", 10, 1)];
        assert!(analytics.seed(&records).await);
        assert!(!analytics.seed(&records).await);
        assert_eq!(analytics.totals().await, (1, 10));
    }
}
