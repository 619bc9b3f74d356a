//! Response normalization policies.
//!
//! Two policies exist side by side:
//! - conversational tools (`search`, `fetch`) emit a flat [`AssetRecord`] with a fixed key set
//! - listing tools pass DAM items through untouched, wrapped with [`Pagination`] metadata

use crate::model::{Asset, AssetId};
use serde::Serialize;
use serde_json::{Map, Value};

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Human-readable size using binary prefixes, one decimal place above bytes.
///
/// `0` -> `0 B`, `1536` -> `1.5 KB`, `1073741824` -> `1.0 GB`. Never exceeds `PB`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", SIZE_UNITS[unit])
}

/// Flat, LLM-friendly asset record.
///
/// The Markdown rendering is produced from this record, so both output formats always carry the
/// same information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRecord {
    pub id: Option<AssetId>,
    pub title: String,
    pub file_name: Option<String>,
    pub subject: Option<String>,
    pub file_type: String,
    pub file_extension: Option<String>,
    pub file_size: u64,
    pub file_size_human: String,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub created: Option<String>,
    pub uploaded: Option<String>,
    pub modified: Option<String>,
    pub keywords: Vec<String>,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub directory_id: Option<AssetId>,
    pub collection_ids: Vec<AssetId>,
    pub is_archived: bool,
    pub is_locked: bool,
    pub preview_url: Option<String>,
    pub original_url: Option<String>,
}

impl AssetRecord {
    #[must_use]
    pub fn from_asset(asset: &Asset) -> Self {
        let title = asset
            .file_name
            .clone()
            .or_else(|| asset.subject.clone())
            .unwrap_or_else(|| "Untitled Asset".to_string());
        let file_size = asset.file_size.unwrap_or(0);

        Self {
            id: asset.id.clone(),
            title,
            file_name: asset.file_name.clone(),
            subject: asset.subject.clone(),
            file_type: asset
                .file_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            file_extension: asset.file_extension.clone(),
            file_size,
            file_size_human: format_file_size(file_size),
            width: asset.width,
            height: asset.height,
            created: asset.created.clone(),
            uploaded: asset.uploaded.clone(),
            modified: asset.modified.clone(),
            keywords: asset.keywords.clone(),
            rating: asset.rating,
            description: asset.description.clone(),
            directory_id: asset.directory_id.clone(),
            collection_ids: asset.collection_ids.clone(),
            is_archived: asset.is_archived,
            is_locked: asset.is_locked,
            preview_url: asset.preview_url.clone(),
            original_url: asset.original_url.clone(),
        }
    }

    /// Total over any JSON value; unexpected shapes yield a record of defaults.
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        Self::from_asset(&Asset::from_value(raw))
    }
}

/// Pagination metadata attached to search and listing results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u64>,
}

impl Pagination {
    /// Offset-based pagination (search).
    #[must_use]
    pub fn from_offset(total: u64, offset: u64, returned: usize) -> Self {
        let seen = offset.saturating_add(returned as u64);
        let has_more = total > seen;
        Self {
            total,
            count: returned,
            offset: Some(offset),
            page: None,
            page_size: None,
            has_more,
            next_offset: has_more.then_some(seen),
            next_page: None,
        }
    }

    /// Page-based pagination (listing tools). `page` is 1-based.
    ///
    /// When the DAM does not report a total, the returned items are taken as the last page.
    #[must_use]
    pub fn from_page(total: Option<u64>, page: u64, page_size: u64, returned: usize) -> Self {
        let page = page.max(1);
        let offset = (page - 1).saturating_mul(page_size);
        let seen = offset.saturating_add(returned as u64);
        let total = total.unwrap_or(seen);
        let has_more = total > seen;
        Self {
            total,
            count: returned,
            offset: None,
            page: Some(page),
            page_size: Some(page_size),
            has_more,
            next_offset: None,
            next_page: has_more.then_some(page + 1),
        }
    }
}

/// `search` output in the structured format.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub assets: Vec<AssetRecord>,
}

/// Wrap pass-through DAM items under `key`, with pagination fields alongside.
#[must_use]
pub fn listing_envelope(key: &str, items: Vec<Value>, pagination: Option<&Pagination>) -> Value {
    let mut out = Map::new();
    if let Some(p) = pagination
        && let Ok(Value::Object(fields)) = serde_json::to_value(p)
    {
        out.extend(fields);
    } else {
        out.insert("count".to_string(), Value::from(items.len()));
    }
    out.insert(key.to_string(), Value::Array(items));
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_size_uses_binary_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_file_size(1_073_741_824), "1.0 GB");
        assert_eq!(format_file_size(1u64 << 40), "1.0 TB");
        assert_eq!(format_file_size(1u64 << 50), "1.0 PB");
        assert_eq!(format_file_size(1u64 << 60), "1024.0 PB");
        assert!(format_file_size(u64::MAX).ends_with(" PB"));
    }

    #[test]
    fn pagination_reports_next_offset_only_when_more_remain() {
        let p = Pagination::from_offset(55, 20, 20);
        assert!(p.has_more);
        assert_eq!(p.next_offset, Some(40));

        let last = Pagination::from_offset(55, 40, 15);
        assert!(!last.has_more);
        assert_eq!(last.next_offset, None);
        let v = serde_json::to_value(&last).expect("json");
        assert!(v.get("next_offset").is_none());
        assert_eq!(v["has_more"], false);
        assert_eq!(v["offset"], 40);
    }

    #[test]
    fn page_pagination() {
        let p = Pagination::from_page(Some(45), 2, 20, 20);
        assert!(p.has_more);
        assert_eq!(p.next_page, Some(3));

        let last = Pagination::from_page(Some(45), 3, 20, 5);
        assert!(!last.has_more);
        assert_eq!(last.next_page, None);

        let unknown = Pagination::from_page(None, 1, 50, 12);
        assert_eq!(unknown.total, 12);
        assert!(!unknown.has_more);
    }

    #[test]
    fn record_defaults_for_sparse_payloads() {
        let r = AssetRecord::from_value(&json!({"id": 5}));
        assert_eq!(r.id, Some(AssetId::Int(5)));
        assert_eq!(r.title, "Untitled Asset");
        assert_eq!(r.file_type, "unknown");
        assert_eq!(r.file_size, 0);
        assert_eq!(r.file_size_human, "0 B");

        let garbage = AssetRecord::from_value(&json!("not an object"));
        assert_eq!(garbage.id, None);
    }

    #[test]
    fn record_title_falls_back_to_subject() {
        let r = AssetRecord::from_value(&json!({"subject": "Spring campaign"}));
        assert_eq!(r.title, "Spring campaign");
    }

    #[test]
    fn record_has_a_flat_fixed_key_set() {
        let r = AssetRecord::from_value(&json!({
            "id": 1,
            "fileName": "a.jpg",
            "dynamicMetadata": {"nested": {"deep": true}},
            "somethingElse": [1, 2, 3]
        }));
        let v = serde_json::to_value(&r).expect("json");
        let obj = v.as_object().expect("object");
        assert!(!obj.contains_key("dynamicMetadata"));
        assert!(!obj.contains_key("somethingElse"));
        assert!(obj.values().all(|v| !v.is_object()));
    }

    #[test]
    fn listing_envelope_passes_items_through() {
        let items = vec![json!({"id": 1, "custom": {"x": 1}})];
        let p = Pagination::from_page(Some(1), 1, 50, 1);
        let v = listing_envelope("collections", items, Some(&p));
        assert_eq!(v["collections"][0]["custom"]["x"], 1);
        assert_eq!(v["total"], 1);
        assert_eq!(v["has_more"], false);

        let bare = listing_envelope("formats", vec![json!(1), json!(2)], None);
        assert_eq!(bare["count"], 2);
    }
}
