//! Typed views over pixx.io payloads.
//!
//! The DAM may omit any field or return it with a surprising JSON type (numbers as strings,
//! keywords as objects). Every constructor here is total: it reads each field through a fixed
//! precedence list of source keys and falls back to `None`/empty instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// DAM-assigned identifier. pixx.io uses integers, but string ids are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetId {
    Int(i64),
    Str(String),
}

impl AssetId {
    /// `0`, `"0"` and blank strings never address a real object.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        match self {
            Self::Int(n) => *n == 0,
            Self::Str(s) => {
                let s = s.trim();
                s.is_empty() || s == "0"
            }
        }
    }

    #[must_use]
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) if !s.trim().is_empty() => {
                let s = s.trim();
                Some(s.parse::<i64>().map_or_else(|_| Self::Str(s.to_string()), Self::Int))
            }
            _ => None,
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s.trim()),
        }
    }
}

impl From<i64> for AssetId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// A file (asset) as returned by `/files` and `/files/{id}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Asset {
    pub id: Option<AssetId>,
    pub file_name: Option<String>,
    pub subject: Option<String>,
    pub file_extension: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<u64>,
    pub created: Option<String>,
    pub uploaded: Option<String>,
    pub modified: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub rating: Option<f64>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub preview_url: Option<String>,
    pub original_url: Option<String>,
    pub directory_id: Option<AssetId>,
    pub collection_ids: Vec<AssetId>,
    pub is_archived: bool,
    pub is_locked: bool,
    pub metadata: Map<String, Value>,
}

impl Asset {
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return Self::default();
        };

        Self {
            id: pick(obj, &["id", "fileID"]).and_then(AssetId::from_value),
            file_name: pick(obj, &["fileName", "originalFilename", "originalFileName", "name"])
                .and_then(as_text),
            subject: pick(obj, &["subject", "title"]).and_then(as_text),
            file_extension: pick(obj, &["fileExtension", "extension"]).and_then(as_text),
            file_type: pick(obj, &["fileType", "type"]).and_then(as_text),
            file_size: pick(obj, &["fileSize", "filesize", "size"]).and_then(as_u64),
            created: pick(obj, &["createDate", "createdDate", "created"]).and_then(as_text),
            uploaded: pick(obj, &["uploadDate", "uploadedDate", "uploaded"]).and_then(as_text),
            modified: pick(obj, &["modifyDate", "modifiedDate", "modified"]).and_then(as_text),
            description: pick(obj, &["description"]).and_then(as_text),
            keywords: pick(obj, &["keywords", "tags"]).map_or_else(Vec::new, as_string_list),
            rating: pick(obj, &["rating"]).and_then(as_f64),
            width: pick(obj, &["width", "imageWidth", "pixelWidth"]).and_then(as_u64),
            height: pick(obj, &["height", "imageHeight", "pixelHeight"]).and_then(as_u64),
            preview_url: pick(obj, &["previewFileURL", "previewURL", "thumbnailURL"])
                .and_then(as_text),
            original_url: pick(obj, &["originalFileURL", "downloadURL", "fileURL"])
                .and_then(as_text),
            directory_id: pick(obj, &["directoryID", "directoryId"])
                .and_then(AssetId::from_value)
                .or_else(|| {
                    pick(obj, &["directory"])
                        .and_then(Value::as_object)
                        .and_then(|d| pick(d, &["id"]))
                        .and_then(AssetId::from_value)
                }),
            collection_ids: pick(obj, &["collectionIDs", "collections"])
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|c| match c {
                            Value::Object(o) => pick(o, &["id"]).and_then(AssetId::from_value),
                            other => AssetId::from_value(other),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            is_archived: pick(obj, &["isArchived", "archived"])
                .and_then(as_bool)
                .unwrap_or(false),
            is_locked: pick(obj, &["isLocked", "locked"])
                .and_then(as_bool)
                .unwrap_or(false),
            metadata: pick(obj, &["dynamicMetadata", "metadata"])
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// A directory node; `children` is only populated in tree mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Directory {
    pub id: Option<AssetId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub has_children: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Directory>,
}

impl Directory {
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return Self::default();
        };
        let children: Vec<Directory> = pick(obj, &["children", "subdirectories", "directories"])
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Self::from_value).collect())
            .unwrap_or_default();
        let has_children = pick(obj, &["hasChildren", "hasSubdirectories"])
            .and_then(as_bool)
            .unwrap_or(!children.is_empty());

        Self {
            id: pick(obj, &["id"]).and_then(AssetId::from_value),
            name: pick(obj, &["name", "title"])
                .and_then(as_text)
                .unwrap_or_else(|| "Untitled directory".to_string()),
            path: pick(obj, &["path"]).and_then(as_text),
            has_children,
            children,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Collection {
    pub id: Option<AssetId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_dynamic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl Collection {
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return Self::default();
        };
        Self {
            id: pick(obj, &["id"]).and_then(AssetId::from_value),
            name: pick(obj, &["name", "title"])
                .and_then(as_text)
                .unwrap_or_else(|| "Untitled collection".to_string()),
            description: pick(obj, &["description"]).and_then(as_text),
            is_dynamic: pick(obj, &["isDynamic", "dynamic"])
                .and_then(as_bool)
                .unwrap_or(false),
            file_count: pick(obj, &["fileCount", "filesCount", "quantity", "count"])
                .and_then(as_u64),
            created: pick(obj, &["createDate", "createdDate", "created"]).and_then(as_text),
        }
    }
}

/// Keywords arrive either as bare strings or as `{ id, name }` objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Keyword {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AssetId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<u64>,
}

impl Keyword {
    #[must_use]
    pub fn from_value(raw: &Value) -> Option<Self> {
        match raw {
            Value::String(s) if !s.trim().is_empty() => Some(Self {
                name: s.trim().to_string(),
                ..Self::default()
            }),
            Value::Object(obj) => {
                let name = pick(obj, &["name", "keyword", "value"]).and_then(as_text)?;
                Some(Self {
                    id: pick(obj, &["id"]).and_then(AssetId::from_value),
                    name,
                    usage_count: pick(obj, &["count", "usageCount", "quantity"]).and_then(as_u64),
                })
            }
            _ => None,
        }
    }
}

/// A paged list response: the item array plus the DAM's total count, if reported.
#[derive(Debug, Clone, Default)]
pub struct ListPayload {
    pub items: Vec<Value>,
    pub total: Option<u64>,
}

impl ListPayload {
    /// Extract the item array from the first present key in `item_keys`.
    ///
    /// A bare JSON array is accepted as the item list itself.
    #[must_use]
    pub fn from_value(raw: &Value, item_keys: &[&str]) -> Self {
        match raw {
            Value::Array(items) => Self {
                items: items.clone(),
                total: None,
            },
            Value::Object(obj) => Self {
                items: pick(obj, item_keys)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
                total: pick(obj, &["quantity", "total", "totalCount", "count"]).and_then(as_u64),
            },
            _ => Self::default(),
        }
    }
}

/// First non-null value among `keys`, in order.
#[must_use]
pub fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Strings are trimmed (blank becomes `None`); numbers and booleans are stringified.
#[must_use]
pub fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[must_use]
pub fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
        }
        _ => None,
    }
}

#[must_use]
pub fn as_f64(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    f.filter(|f| f.is_finite())
}

#[must_use]
pub fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Keyword-like lists: arrays of strings/objects, or a comma-separated string.
#[must_use]
pub fn as_string_list(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| Keyword::from_value(item).map(|k| k.name))
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
