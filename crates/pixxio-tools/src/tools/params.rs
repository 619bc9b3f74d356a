//! Tool argument types.
//!
//! Every struct rejects unknown fields, trims strings (blank becomes absent) and carries the
//! optional per-call `api_key`/`base_url` overrides.

use crate::config::CredentialOverrides;
use crate::download::{ConvertRequest, DownloadType};
use crate::error::{PixxioError, Result};
use crate::filter::FilterInputs;
use crate::model::AssetId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub const MAX_QUERY_CHARS: usize = 500;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_RATING: u8 = 5;

/// Parse tool arguments; `null` is treated as an empty object.
///
/// # Errors
///
/// Returns [`PixxioError::Validation`] when the arguments do not match `T`.
pub fn parse<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| PixxioError::Validation(e.to_string()))
}

pub trait WithCredentials {
    fn overrides(&self) -> CredentialOverrides;
}

macro_rules! with_credentials {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl WithCredentials for $ty {
                fn overrides(&self) -> CredentialOverrides {
                    CredentialOverrides {
                        api_key: self.api_key.clone(),
                        base_url: self.base_url.clone(),
                    }
                }
            }
        )+
    };
}

with_credentials!(
    SearchParams,
    FetchParams,
    ConvertParams,
    PreviewParams,
    DownloadParams,
    DirectoryParams,
    PageParams,
    KeywordParams,
    UpdateAssetParams,
    FormatOnlyParams,
    CreateCollectionParams,
    ExternalShareParams,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Created,
    Modified,
    Filename,
    Filesize,
}

impl SortBy {
    /// DAM `sortBy` field; relevance is the DAM's own default and is not sent.
    #[must_use]
    pub fn dam_field(self) -> Option<&'static str> {
        match self {
            Self::Relevance => None,
            Self::Created => Some("createDate"),
            Self::Modified => Some("modifyDate"),
            Self::Filename => Some("fileName"),
            Self::Filesize => Some("fileSize"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    #[serde(default, deserialize_with = "trimmed")]
    pub query: Option<String>,
    #[serde(default)]
    pub exact_match: bool,
    #[serde(default = "default_true")]
    pub use_synonyms: bool,
    #[serde(default, deserialize_with = "trimmed")]
    pub file_type: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub file_extension: Option<String>,
    #[serde(default)]
    pub directory_id: Option<AssetId>,
    #[serde(default = "default_true")]
    pub include_subdirectories: bool,
    #[serde(default)]
    pub collection_id: Option<AssetId>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl SearchParams {
    /// # Errors
    ///
    /// Returns [`PixxioError::Validation`] if `query` is too long or `limit` is out of range.
    pub fn validate(&self) -> Result<()> {
        if let Some(q) = &self.query
            && q.chars().count() > MAX_QUERY_CHARS
        {
            return Err(PixxioError::Validation(format!(
                "query must be at most {MAX_QUERY_CHARS} characters"
            )));
        }
        check_range("limit", self.limit, 1, MAX_LIMIT)
    }

    #[must_use]
    pub fn filter_inputs(&self) -> FilterInputs {
        FilterInputs {
            query: self.query.clone(),
            exact_match: self.exact_match,
            use_synonyms: self.use_synonyms,
            file_type: self.file_type.clone(),
            file_extension: self.file_extension.clone(),
            directory_id: self.directory_id.clone(),
            include_subdirectories: self.include_subdirectories,
            collection_id: self.collection_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchParams {
    /// Also accepted as `id` (the MCP `fetch` convention).
    #[serde(alias = "id")]
    pub asset_id: AssetId,
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertParams {
    pub asset_id: AssetId,
    #[serde(default)]
    pub download_type: DownloadType,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default, deserialize_with = "trimmed")]
    pub file_extension: Option<String>,
    #[serde(default)]
    pub download_format_id: Option<AssetId>,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl ConvertParams {
    #[must_use]
    pub fn convert_request(&self) -> ConvertRequest {
        ConvertRequest {
            asset_id: Some(self.asset_id.clone()),
            download_type: self.download_type,
            width: self.width,
            height: self.height,
            quality: self.quality,
            file_extension: self.file_extension.clone(),
            download_format_id: self.download_format_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewParams {
    pub asset_id: AssetId,
    /// Bounding box; when either is set a custom rendition is requested instead of the stock
    /// preview.
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl PreviewParams {
    #[must_use]
    pub fn convert_request(&self) -> ConvertRequest {
        let custom = self.width.is_some() || self.height.is_some();
        ConvertRequest {
            asset_id: Some(self.asset_id.clone()),
            download_type: if custom {
                DownloadType::Custom
            } else {
                DownloadType::Preview
            },
            width: self.width,
            height: self.height,
            file_extension: custom.then(|| "jpg".to_string()),
            ..ConvertRequest::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadParams {
    pub asset_id: AssetId,
    #[serde(default)]
    pub download_type: DownloadType,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default, deserialize_with = "trimmed")]
    pub file_extension: Option<String>,
    #[serde(default)]
    pub download_format_id: Option<AssetId>,
    /// Target file name; an extension is appended when missing.
    #[serde(default, deserialize_with = "trimmed")]
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl DownloadParams {
    #[must_use]
    pub fn convert_request(&self) -> ConvertRequest {
        ConvertRequest {
            asset_id: Some(self.asset_id.clone()),
            download_type: self.download_type,
            width: self.width,
            height: self.height,
            quality: self.quality,
            file_extension: self.file_extension.clone(),
            download_format_id: self.download_format_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryParams {
    #[serde(default)]
    pub parent_id: Option<AssetId>,
    #[serde(default)]
    pub tree: bool,
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl PageParams {
    /// # Errors
    ///
    /// Returns [`PixxioError::Validation`] if `page` is zero or `page_size` is out of range.
    pub fn validate(&self) -> Result<()> {
        check_page(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordParams {
    #[serde(default, deserialize_with = "trimmed")]
    pub query: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl KeywordParams {
    /// # Errors
    ///
    /// Returns [`PixxioError::Validation`] on out-of-range paging or an overlong query.
    pub fn validate(&self) -> Result<()> {
        if let Some(q) = &self.query
            && q.chars().count() > MAX_QUERY_CHARS
        {
            return Err(PixxioError::Validation(format!(
                "query must be at most {MAX_QUERY_CHARS} characters"
            )));
        }
        check_page(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAssetParams {
    pub asset_id: AssetId,
    #[serde(default, deserialize_with = "trimmed")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub subject: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub rating: Option<u8>,
    /// Metadata field values keyed by field name or id.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl UpdateAssetParams {
    /// # Errors
    ///
    /// Returns [`PixxioError::Validation`] if nothing would be updated or `rating` exceeds 5.
    pub fn validate(&self) -> Result<()> {
        if self.asset_id.is_unset() {
            return Err(PixxioError::Validation("asset_id is required".to_string()));
        }
        if let Some(r) = self.rating
            && r > MAX_RATING
        {
            return Err(PixxioError::Validation(format!(
                "rating must be between 0 and {MAX_RATING}, got {r}"
            )));
        }
        if self.form_fields().is_empty() {
            return Err(PixxioError::Validation(
                "Provide at least one of description, subject, keywords, rating or metadata"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Multipart fields for `PUT /files/{id}`; list and map values are JSON-encoded.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if let Some(d) = &self.description {
            fields.push(("description".to_string(), d.clone()));
        }
        if let Some(s) = &self.subject {
            fields.push(("subject".to_string(), s.clone()));
        }
        if let Some(k) = &self.keywords {
            let cleaned: Vec<&str> = k
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            fields.push((
                "keywords".to_string(),
                serde_json::to_string(&cleaned).unwrap_or_else(|_| "[]".to_string()),
            ));
        }
        if let Some(r) = self.rating {
            fields.push(("rating".to_string(), r.to_string()));
        }
        if let Some(m) = self.metadata.as_ref().filter(|m| !m.is_empty()) {
            fields.push((
                "dynamicMetadata".to_string(),
                Value::Object(m.clone()).to_string(),
            ));
        }
        fields
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatOnlyParams {
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCollectionParams {
    #[serde(default, deserialize_with = "trimmed")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub description: Option<String>,
    #[serde(default)]
    pub asset_ids: Vec<AssetId>,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl CreateCollectionParams {
    /// JSON body for `POST /collections`.
    ///
    /// # Errors
    ///
    /// Returns [`PixxioError::Validation`] if `name` is missing.
    pub fn body(&self) -> Result<Value> {
        let Some(name) = &self.name else {
            return Err(PixxioError::Validation("name is required".to_string()));
        };
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(name.clone()));
        if let Some(d) = &self.description {
            body.insert("description".to_string(), Value::String(d.clone()));
        }
        let ids = set_ids(&self.asset_ids);
        if !ids.is_empty() {
            body.insert("fileIDs".to_string(), ids_value(&ids));
        }
        Ok(Value::Object(body))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalShareParams {
    #[serde(default)]
    pub asset_ids: Vec<AssetId>,
    #[serde(default, deserialize_with = "trimmed")]
    pub title: Option<String>,
    /// `YYYY-MM-DD`; passed through to the DAM.
    #[serde(default, deserialize_with = "trimmed")]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub download_format_id: Option<AssetId>,
    #[serde(default = "default_true")]
    pub allow_download: bool,
    #[serde(default, deserialize_with = "trimmed")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub base_url: Option<String>,
}

impl ExternalShareParams {
    /// JSON body for `POST /externalShares`.
    ///
    /// # Errors
    ///
    /// Returns [`PixxioError::Validation`] if no asset id is given.
    pub fn body(&self) -> Result<Value> {
        let ids = set_ids(&self.asset_ids);
        if ids.is_empty() {
            return Err(PixxioError::Validation(
                "asset_ids must contain at least one asset id".to_string(),
            ));
        }
        let mut body = Map::new();
        body.insert("fileIDs".to_string(), ids_value(&ids));
        body.insert("isDownloadable".to_string(), Value::Bool(self.allow_download));
        if let Some(t) = &self.title {
            body.insert("title".to_string(), Value::String(t.clone()));
        }
        if let Some(d) = &self.expiry_date {
            body.insert("expiryDate".to_string(), Value::String(d.clone()));
        }
        if let Some(id) = self.download_format_id.as_ref().filter(|id| !id.is_unset()) {
            body.insert("downloadFormatID".to_string(), id_value(id));
        }
        Ok(Value::Object(body))
    }
}

fn set_ids(ids: &[AssetId]) -> Vec<&AssetId> {
    ids.iter().filter(|id| !id.is_unset()).collect()
}

fn ids_value(ids: &[&AssetId]) -> Value {
    Value::Array(ids.iter().map(|id| id_value(id)).collect())
}

fn id_value(id: &AssetId) -> Value {
    serde_json::to_value(id).unwrap_or(Value::Null)
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PixxioError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )))
    }
}

fn check_page(page: u32, page_size: u32) -> Result<()> {
    if page == 0 {
        return Err(PixxioError::Validation("page must be at least 1".to_string()));
    }
    check_range("page_size", page_size, 1, MAX_PAGE_SIZE)
}

fn trimmed<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn default_true() -> bool {
    true
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse::<FetchParams>(json!({"asset_id": 1, "verbose": true}))
            .expect_err("unknown field");
        assert!(matches!(err, PixxioError::Validation(_)));
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn search_defaults_and_trimming() {
        let p: SearchParams = parse(json!({"query": "  logo  ", "file_type": "   "})).expect("parse");
        assert_eq!(p.query.as_deref(), Some("logo"));
        assert_eq!(p.file_type, None);
        assert_eq!(p.limit, DEFAULT_LIMIT);
        assert_eq!(p.offset, 0);
        assert_eq!(p.sort_by, SortBy::Relevance);
        assert_eq!(p.sort_order, SortOrder::Desc);
        assert_eq!(p.response_format, ResponseFormat::Markdown);
        assert!(p.validate().is_ok());

        let empty: SearchParams = parse(Value::Null).expect("null arguments");
        assert_eq!(empty.query, None);
    }

    #[test]
    fn search_bounds() {
        let p: SearchParams = parse(json!({"limit": 0})).expect("parse");
        assert!(p.validate().is_err());
        let p: SearchParams = parse(json!({"limit": 101})).expect("parse");
        assert!(p.validate().is_err());
        let p: SearchParams = parse(json!({"query": "x".repeat(501)})).expect("parse");
        assert!(p.validate().is_err());
        assert!(parse::<SearchParams>(json!({"offset": -1})).is_err());
        assert!(parse::<SearchParams>(json!({"sort_by": "color"})).is_err());
    }

    #[test]
    fn fetch_accepts_id_alias_and_string_ids() {
        let p: FetchParams = parse(json!({"id": "42"})).expect("parse");
        assert_eq!(p.asset_id.to_string(), "42");
        let p: FetchParams = parse(json!({"asset_id": 7, "response_format": "json"})).expect("parse");
        assert_eq!(p.asset_id, AssetId::Int(7));
        assert_eq!(p.response_format, ResponseFormat::Json);
    }

    #[test]
    fn download_type_parses_camel_case() {
        let p: DownloadParams =
            parse(json!({"asset_id": 1, "download_type": "downloadFormat"})).expect("parse");
        assert_eq!(p.download_type, DownloadType::DownloadFormat);
        assert!(p.convert_request().validate().is_err());
    }

    #[test]
    fn preview_switches_to_custom_when_sized() {
        let p: PreviewParams = parse(json!({"asset_id": 1})).expect("parse");
        assert_eq!(p.convert_request().download_type, DownloadType::Preview);
        let p: PreviewParams = parse(json!({"asset_id": 1, "width": 400})).expect("parse");
        let req = p.convert_request();
        assert_eq!(req.download_type, DownloadType::Custom);
        assert_eq!(req.width, Some(400));
    }

    #[test]
    fn update_requires_a_change() {
        let p: UpdateAssetParams = parse(json!({"asset_id": 1, "description": "  "})).expect("parse");
        assert!(p.validate().is_err());

        let p: UpdateAssetParams = parse(json!({"asset_id": 1, "rating": 6})).expect("parse");
        assert!(p.validate().expect_err("rating").to_string().contains("rating"));

        let p: UpdateAssetParams = parse(json!({
            "asset_id": 1,
            "keywords": ["sky", " ", "sea"],
            "rating": 0,
            "metadata": {"Copyright": "ACME"}
        }))
        .expect("parse");
        assert!(p.validate().is_ok());
        let fields = p.form_fields();
        assert!(fields.contains(&("keywords".to_string(), "[\"sky\",\"sea\"]".to_string())));
        assert!(fields.contains(&("rating".to_string(), "0".to_string())));
        assert!(fields.contains(&(
            "dynamicMetadata".to_string(),
            "{\"Copyright\":\"ACME\"}".to_string()
        )));
    }

    #[test]
    fn collection_and_share_bodies() {
        let p: CreateCollectionParams =
            parse(json!({"name": " Spring ", "asset_ids": [1, "2", 0]})).expect("parse");
        assert_eq!(
            p.body().expect("body"),
            json!({"name": "Spring", "fileIDs": [1, "2"]})
        );
        let nameless: CreateCollectionParams = parse(json!({})).expect("parse");
        assert!(nameless.body().is_err());

        let share: ExternalShareParams = parse(json!({"asset_ids": []})).expect("parse");
        assert!(share.body().is_err());
        let share: ExternalShareParams =
            parse(json!({"asset_ids": [5], "title": "Press kit", "download_format_id": 3}))
                .expect("parse");
        assert_eq!(
            share.body().expect("body"),
            json!({
                "fileIDs": [5],
                "isDownloadable": true,
                "title": "Press kit",
                "downloadFormatID": 3
            })
        );
    }

    #[test]
    fn paging_bounds() {
        let p: PageParams = parse(json!({"page": 0})).expect("parse");
        assert!(p.validate().is_err());
        let p: KeywordParams = parse(json!({"page_size": 500})).expect("parse");
        assert!(p.validate().is_err());
        let p: PageParams = parse(json!({})).expect("parse");
        assert_eq!((p.page, p.page_size), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn credentials_are_forwarded() {
        let p: FormatOnlyParams =
            parse(json!({"api_key": " key-0123456789 ", "base_url": "https://t.pixx.io"}))
                .expect("parse");
        let o = p.overrides();
        assert_eq!(o.api_key.as_deref(), Some("key-0123456789"));
        assert_eq!(o.base_url.as_deref(), Some("https://t.pixx.io"));
    }
}
