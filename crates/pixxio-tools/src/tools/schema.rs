//! JSON Schemas advertised in `tools/list`. They mirror the argument structs in `params`.

use super::params::{
    DEFAULT_LIMIT, DEFAULT_PAGE_SIZE, MAX_LIMIT, MAX_PAGE_SIZE, MAX_QUERY_CHARS, MAX_RATING,
};
use serde_json::{Map, Value, json};

fn object(properties: Value, required: &[&str]) -> Value {
    let mut props = match properties {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    props.insert(
        "api_key".to_string(),
        json!({
            "type": "string",
            "minLength": 10,
            "description": "pixx.io API key. Defaults to the server's configured key."
        }),
    );
    props.insert(
        "base_url".to_string(),
        json!({
            "type": "string",
            "format": "uri",
            "description": "pixx.io instance URL, e.g. https://yourcompany.pixx.io. Defaults to the server's configured URL."
        }),
    );

    let mut schema = json!({
        "type": "object",
        "properties": props,
        "additionalProperties": false,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn id(description: &str) -> Value {
    json!({
        "type": ["integer", "string"],
        "description": description
    })
}

fn response_format() -> Value {
    json!({
        "type": "string",
        "enum": ["markdown", "json"],
        "default": "markdown",
        "description": "markdown for readable text, json for structured data"
    })
}

fn conversion_properties() -> Value {
    json!({
        "asset_id": id("Asset (file) ID"),
        "download_type": {
            "type": "string",
            "enum": ["original", "preview", "custom", "downloadFormat"],
            "default": "original"
        },
        "width": {"type": "integer", "minimum": 1, "description": "Only for download_type=custom"},
        "height": {"type": "integer", "minimum": 1, "description": "Only for download_type=custom"},
        "quality": {"type": "integer", "minimum": 1, "maximum": 100, "description": "Only for download_type=custom"},
        "file_extension": {"type": "string", "description": "Output format, only for download_type=custom (e.g. jpg, png)"},
        "download_format_id": id("Required when download_type=downloadFormat")
    })
}

fn paging_properties() -> Value {
    json!({
        "page": {"type": "integer", "minimum": 1, "default": 1},
        "page_size": {"type": "integer", "minimum": 1, "maximum": MAX_PAGE_SIZE, "default": DEFAULT_PAGE_SIZE},
        "response_format": response_format()
    })
}

#[must_use]
pub fn search() -> Value {
    object(
        json!({
            "query": {"type": "string", "maxLength": MAX_QUERY_CHARS, "description": "Free-text search term"},
            "exact_match": {"type": "boolean", "default": false},
            "use_synonyms": {"type": "boolean", "default": true},
            "file_type": {"type": "string", "description": "File type class, e.g. image, video, document"},
            "file_extension": {"type": "string", "description": "e.g. jpg, pdf"},
            "directory_id": id("Restrict to a directory"),
            "include_subdirectories": {"type": "boolean", "default": true},
            "collection_id": id("Restrict to a collection"),
            "limit": {"type": "integer", "minimum": 1, "maximum": MAX_LIMIT, "default": DEFAULT_LIMIT},
            "offset": {"type": "integer", "minimum": 0, "default": 0},
            "sort_by": {
                "type": "string",
                "enum": ["relevance", "created", "modified", "filename", "filesize"],
                "default": "relevance"
            },
            "sort_order": {"type": "string", "enum": ["asc", "desc"], "default": "desc"},
            "response_format": response_format()
        }),
        &[],
    )
}

#[must_use]
pub fn fetch() -> Value {
    object(
        json!({
            "asset_id": id("Asset (file) ID"),
            "response_format": response_format()
        }),
        &["asset_id"],
    )
}

#[must_use]
pub fn convert() -> Value {
    object(conversion_properties(), &["asset_id"])
}

#[must_use]
pub fn preview() -> Value {
    object(
        json!({
            "asset_id": id("Asset (file) ID"),
            "width": {"type": "integer", "minimum": 1, "description": "Maximum preview width in pixels"},
            "height": {"type": "integer", "minimum": 1, "description": "Maximum preview height in pixels"}
        }),
        &["asset_id"],
    )
}

#[must_use]
pub fn download() -> Value {
    let mut props = conversion_properties();
    props["file_name"] = json!({
        "type": "string",
        "description": "Local file name; the extension is added when missing"
    });
    object(props, &["asset_id"])
}

#[must_use]
pub fn directories() -> Value {
    object(
        json!({
            "parent_id": id("List the children of this directory"),
            "tree": {"type": "boolean", "default": false, "description": "Return the nested tree"},
            "response_format": response_format()
        }),
        &[],
    )
}

#[must_use]
pub fn paged() -> Value {
    object(paging_properties(), &[])
}

#[must_use]
pub fn keywords() -> Value {
    let mut props = paging_properties();
    props["query"] = json!({"type": "string", "maxLength": MAX_QUERY_CHARS, "description": "Keyword prefix"});
    object(props, &[])
}

#[must_use]
pub fn update_asset() -> Value {
    object(
        json!({
            "asset_id": id("Asset (file) ID"),
            "description": {"type": "string"},
            "subject": {"type": "string"},
            "keywords": {"type": "array", "items": {"type": "string"}, "description": "Replaces the keyword set"},
            "rating": {"type": "integer", "minimum": 0, "maximum": MAX_RATING},
            "metadata": {"type": "object", "description": "Metadata field values keyed by field name or id"}
        }),
        &["asset_id"],
    )
}

#[must_use]
pub fn format_only() -> Value {
    object(json!({"response_format": response_format()}), &[])
}

#[must_use]
pub fn create_collection() -> Value {
    object(
        json!({
            "name": {"type": "string", "minLength": 1},
            "description": {"type": "string"},
            "asset_ids": {"type": "array", "items": {"type": ["integer", "string"]}}
        }),
        &["name"],
    )
}

#[must_use]
pub fn external_share() -> Value {
    object(
        json!({
            "asset_ids": {"type": "array", "items": {"type": ["integer", "string"]}, "minItems": 1},
            "title": {"type": "string"},
            "expiry_date": {"type": "string", "format": "date", "description": "YYYY-MM-DD"},
            "download_format_id": id("Download format offered to recipients"),
            "allow_download": {"type": "boolean", "default": true}
        }),
        &["asset_ids"],
    )
}
