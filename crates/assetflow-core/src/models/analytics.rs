use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Dimensions of one analytics counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregateKey {
    pub category: String,
    pub major_type: String,
    pub day: NaiveDate,
}

/// Point-in-time value of one counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: AggregateKey,
    pub count: u64,
    pub total_bytes: u64,
}

/// Totals for one category (or one mime major type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub name: String,
    pub count: u64,
    pub total_bytes: u64,
    pub average_file_size: u64,
}

impl CategoryStats {
    pub fn new(name: impl Into<String>, count: u64, total_bytes: u64) -> Self {
        Self {
            name: name.into(),
            count,
            total_bytes,
            average_file_size: average(total_bytes, count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub day: NaiveDate,
    pub count: u64,
    pub total_bytes: u64,
}

/// Committed bytes against the configured quota.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub quota_bytes: u64,
    /// `used / quota` in percent, 0 without a quota
    pub percentage: f64,
}

impl StorageUsage {
    pub fn new(used_bytes: u64, quota_bytes: u64) -> Self {
        let percentage = if quota_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 / quota_bytes as f64 * 100.0
        };
        Self {
            used_bytes,
            quota_bytes,
            percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_count: u64,
    pub total_bytes: u64,
    pub average_file_size: u64,
    pub most_used_category: Option<String>,
    pub by_category: Vec<CategoryStats>,
    pub by_major_type: Vec<CategoryStats>,
    pub per_day: Vec<DayStats>,
    pub storage: StorageUsage,
}

/// `total / count`, or 0 for an empty bucket.
pub fn average(total_bytes: u64, count: u64) -> u64 {
    if count == 0 {
        0
    } else {
        total_bytes / count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_empty_bucket_is_zero() {
        assert_eq!(average(0, 0), 0);
        assert_eq!(CategoryStats::new("sup", 2, 3000).average_file_size, 1500);
    }

    #[test]
    fn test_storage_usage_percentage() {
        let usage = StorageUsage::new(512, 2048);
        assert_eq!(usage.percentage, 25.0);
        assert_eq!(StorageUsage::new(10, 0).percentage, 0.0);
    }
}
