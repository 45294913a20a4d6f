use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRecord {
    pub prompt: String,
    pub image_url: String,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC). Anything
/// else is treated as absent rather than failing the whole listing.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        DateTime::parse_from_rfc3339(&value)
            .map(|at| at.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}

impl GenerationRecord {
    pub fn new(prompt: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_url: image_url.into(),
            created_at: None,
        }
    }
}

/// Outcome of one best-effort history batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub written: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written + self.failed
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GalleryItem {
    pub prompt: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
}

impl From<GenerationRecord> for GalleryItem {
    fn from(record: GenerationRecord) -> Self {
        let created_on = record
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string());
        GalleryItem {
            prompt: record.prompt,
            image_url: record.image_url,
            created_at: record.created_at,
            created_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_formats() {
        let records: Vec<GenerationRecord> = serde_json::from_value(json!([
            {"prompt": "a", "image_url": "https://img/a.png", "created_at": "2024-11-02T15:30:00Z"},
            {"prompt": "b", "image_url": "https://img/b.png", "created_at": "2024-11-02T15:30:00.123456"},
            {"prompt": "c", "image_url": "https://img/c.png", "created_at": "yesterday"},
            {"prompt": "d", "image_url": "https://img/d.png"}
        ]))
        .unwrap();

        assert!(records[0].created_at.is_some());
        assert_eq!(
            GalleryItem::from(records[1].clone()).created_on.as_deref(),
            Some("2024-11-02")
        );
        assert!(records[2].created_at.is_none());
        assert!(records[3].created_at.is_none());
    }
}
