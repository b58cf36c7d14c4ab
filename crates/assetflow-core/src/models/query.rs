use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::asset::{major_type, AssetKind, AssetRecord};

/// Gallery ordering options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    Name,
    Size,
    /// `sort_order` ascending, then newest
    Manual,
}

impl SortBy {
    pub fn compare(&self, a: &AssetRecord, b: &AssetRecord) -> Ordering {
        let newest = b.uploaded_at.cmp(&a.uploaded_at).then_with(|| a.id.cmp(&b.id));
        match self {
            SortBy::Newest => newest,
            SortBy::Oldest => a
                .uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.id.cmp(&b.id)),
            SortBy::Name => a
                .original_name
                .to_lowercase()
                .cmp(&b.original_name.to_lowercase())
                .then(newest),
            SortBy::Size => b.size_bytes.cmp(&a.size_bytes).then(newest),
            SortBy::Manual => a.sort_order.cmp(&b.sort_order).then(newest),
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(SortBy::Newest),
            "oldest" => Ok(SortBy::Oldest),
            "name" => Ok(SortBy::Name),
            "size" => Ok(SortBy::Size),
            "manual" => Ok(SortBy::Manual),
            _ => Err(anyhow::anyhow!("Invalid sort order: {}", s)),
        }
    }
}

/// Listing query over committed records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub kind: Option<AssetKind>,
    #[serde(default)]
    pub featured_only: bool,
    #[serde(default)]
    pub sort: SortBy,
    /// Collapse records sharing name, size and upload time
    #[serde(default)]
    pub dedupe: bool,
}

impl ListQuery {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &AssetRecord) -> bool {
        if let Some(category) = &self.category {
            if &record.category != category {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }
        !self.featured_only || record.is_featured
    }

    /// Filter and order `records` in place.
    pub fn apply(&self, records: &mut Vec<AssetRecord>) {
        records.retain(|r| self.matches(r));
        records.sort_by(|a, b| self.sort.compare(a, b));
        if self.dedupe {
            deduplicate(records);
        }
    }
}

/// Keep the first record per `(original_name, size_bytes, uploaded_at)`.
pub fn deduplicate(records: &mut Vec<AssetRecord>) {
    let mut seen = HashSet::new();
    records.retain(|r| seen.insert((r.original_name.clone(), r.size_bytes, r.uploaded_at)));
}

/// Post-match filters for full-text search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<String>,
    /// Mime major type, e.g. `image`
    pub major_type: Option<String>,
    /// Inclusive lower bound on `uploaded_at`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `uploaded_at`
    pub to: Option<DateTime<Utc>>,
}

impl SearchFilters {
    pub fn matches(&self, record: &AssetRecord) -> bool {
        self.matches_parts(&record.category, &record.mime_type, record.uploaded_at)
    }

    /// Same check as [`SearchFilters::matches`] on the fields an index keeps.
    pub fn matches_parts(&self, category: &str, mime_type: &str, uploaded_at: DateTime<Utc>) -> bool {
        if let Some(wanted) = &self.category {
            if wanted != category {
                return false;
            }
        }
        if let Some(wanted) = &self.major_type {
            if major_type(mime_type) != wanted.to_lowercase() {
                return false;
            }
        }
        if let Some(from) = self.from {
            if uploaded_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if uploaded_at > to {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn record(name: &str, category: &str, size: u64, minutes: i64) -> AssetRecord {
        let uploaded_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
            + Duration::minutes(minutes);
        AssetRecord {
            id: Uuid::new_v4(),
            category: category.to_string(),
            original_name: name.to_string(),
            size_bytes: size,
            mime_type: "image/jpeg".to_string(),
            kind: AssetKind::Image,
            storage_key: format!("services/{}/{}", category, name),
            storage_url: format!("file:///{}", name),
            etag: "etag".to_string(),
            stored_content_type: "image/jpeg".to_string(),
            stored_size_bytes: size,
            width: None,
            height: None,
            thumbnail: None,
            uploaded_at,
            is_featured: false,
            sort_order: 0,
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn test_list_query_filters_and_sorts() {
        let mut records = vec![
            record("b.jpg", "sup", 10, 0),
            record("a.jpg", "sup", 30, 5),
            record("c.jpg", "photobox", 20, 10),
        ];
        records[1].is_featured = true;

        let mut newest = records.clone();
        ListQuery::category("sup").apply(&mut newest);
        let names: Vec<_> = newest.iter().map(|r| r.original_name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);

        let mut featured = records.clone();
        ListQuery {
            featured_only: true,
            ..Default::default()
        }
        .apply(&mut featured);
        assert_eq!(featured.len(), 1);

        let mut by_size = records.clone();
        ListQuery {
            sort: SortBy::Size,
            ..Default::default()
        }
        .apply(&mut by_size);
        assert_eq!(by_size[0].size_bytes, 30);
    }

    #[test]
    fn test_dedupe_collapses_same_name_size_and_time() {
        let original = record("a.jpg", "sup", 10, 0);
        let mut copy = original.clone();
        copy.id = Uuid::new_v4();
        let resized = record("a.jpg", "sup", 11, 0);
        let mut records = vec![original.clone(), copy, resized];

        let mut plain = records.clone();
        ListQuery::default().apply(&mut plain);
        assert_eq!(plain.len(), 3);

        ListQuery {
            dedupe: true,
            ..Default::default()
        }
        .apply(&mut records);
        assert_eq!(records.len(), 2);
        assert_eq!(records.iter().filter(|r| r.size_bytes == 10).count(), 1);
    }

    #[test]
    fn test_manual_sort_uses_sort_order() {
        let mut records = vec![record("x", "sup", 1, 0), record("y", "sup", 1, 1)];
        records[0].sort_order = 2;
        records[1].sort_order = 1;
        ListQuery {
            sort: SortBy::Manual,
            ..Default::default()
        }
        .apply(&mut records);
        assert_eq!(records[0].original_name, "y");
    }

    #[test]
    fn test_search_filters_date_range_is_inclusive() {
        let r = record("x", "sup", 1, 0);
        let filters = SearchFilters {
            from: Some(r.uploaded_at),
            to: Some(r.uploaded_at),
            ..Default::default()
        };
        assert!(filters.matches(&r));

        let later = SearchFilters {
            from: Some(r.uploaded_at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!later.matches(&r));
    }

    #[test]
    fn test_search_filters_major_type() {
        let r = record("x", "sup", 1, 0);
        let image = SearchFilters {
            major_type: Some("Image".to_string()),
            ..Default::default()
        };
        let video = SearchFilters {
            major_type: Some("video".to_string()),
            ..Default::default()
        };
        assert!(image.matches(&r));
        assert!(!video.matches(&r));
    }
}
