use super::params::{
    DirectoryParams, FormatOnlyParams, KeywordParams, PageParams, ResponseFormat, WithCredentials,
    parse,
};
use super::{PixxioToolSource, json_result, path_segment, text_result};
use crate::error::Result;
use crate::markdown::{
    collections_markdown, directory_tree_markdown, keywords_markdown, named_items_markdown,
};
use crate::model::{Collection, Directory, Keyword, ListPayload};
use crate::normalize::{Pagination, listing_envelope};
use rmcp::model::CallToolResult;
use serde_json::Value;

pub(super) async fn directories(
    source: &PixxioToolSource,
    arguments: Value,
) -> Result<CallToolResult> {
    let p: DirectoryParams = parse(arguments)?;
    let mut query = Vec::new();
    if p.tree {
        query.push(("tree", "true".to_string()));
    }
    if let Some(parent) = p.parent_id.as_ref().filter(|id| !id.is_unset()) {
        query.push(("parentID", path_segment(parent)?));
    }
    let ctx = source.context(&p.overrides())?;

    let raw = source.client().get_json(&ctx, "/directories", &query).await?;
    let list = ListPayload::from_value(&raw, &["directories", "data", "items", "children"]);

    match p.response_format {
        ResponseFormat::Json => json_result(&listing_envelope("directories", list.items, None)),
        ResponseFormat::Markdown => {
            let dirs: Vec<Directory> = list.items.iter().map(Directory::from_value).collect();
            Ok(text_result(directory_tree_markdown(&dirs)))
        }
    }
}

pub(super) async fn collections(
    source: &PixxioToolSource,
    arguments: Value,
) -> Result<CallToolResult> {
    let p: PageParams = parse(arguments)?;
    p.validate()?;
    let ctx = source.context(&p.overrides())?;

    let query = [
        ("page", p.page.to_string()),
        ("pageSize", p.page_size.to_string()),
    ];
    let raw = source.client().get_json(&ctx, "/collections", &query).await?;
    let list = ListPayload::from_value(&raw, &["collections", "data", "items"]);
    let pagination = Pagination::from_page(
        list.total,
        u64::from(p.page),
        u64::from(p.page_size),
        list.items.len(),
    );

    match p.response_format {
        ResponseFormat::Json => json_result(&listing_envelope(
            "collections",
            list.items,
            Some(&pagination),
        )),
        ResponseFormat::Markdown => {
            let collections: Vec<Collection> =
                list.items.iter().map(Collection::from_value).collect();
            Ok(text_result(collections_markdown(&collections, &pagination)))
        }
    }
}

pub(super) async fn keywords(source: &PixxioToolSource, arguments: Value) -> Result<CallToolResult> {
    let p: KeywordParams = parse(arguments)?;
    p.validate()?;
    let ctx = source.context(&p.overrides())?;

    let mut query = vec![
        ("page", p.page.to_string()),
        ("pageSize", p.page_size.to_string()),
    ];
    if let Some(q) = &p.query {
        query.push(("query", q.clone()));
    }
    let raw = source.client().get_json(&ctx, "/keywords", &query).await?;
    let list = ListPayload::from_value(&raw, &["keywords", "data", "items"]);
    let pagination = Pagination::from_page(
        list.total,
        u64::from(p.page),
        u64::from(p.page_size),
        list.items.len(),
    );

    match p.response_format {
        ResponseFormat::Json => json_result(&listing_envelope(
            "keywords",
            list.items,
            Some(&pagination),
        )),
        ResponseFormat::Markdown => {
            let keywords: Vec<Keyword> = list.items.iter().filter_map(Keyword::from_value).collect();
            Ok(text_result(keywords_markdown(&keywords, &pagination)))
        }
    }
}

pub(super) async fn metadata_fields(
    source: &PixxioToolSource,
    arguments: Value,
) -> Result<CallToolResult> {
    simple_listing(
        source,
        arguments,
        "/metadataFields",
        &["metadataFields", "fields", "data", "items"],
        "metadata_fields",
        "Metadata fields",
    )
    .await
}

pub(super) async fn download_formats(
    source: &PixxioToolSource,
    arguments: Value,
) -> Result<CallToolResult> {
    simple_listing(
        source,
        arguments,
        "/downloadFormats",
        &["downloadFormats", "formats", "data", "items"],
        "download_formats",
        "Download formats",
    )
    .await
}

/// Unpaged GET listing rendered as a named-item list or a pass-through envelope.
async fn simple_listing(
    source: &PixxioToolSource,
    arguments: Value,
    path: &str,
    item_keys: &[&str],
    envelope_key: &str,
    heading: &str,
) -> Result<CallToolResult> {
    let p: FormatOnlyParams = parse(arguments)?;
    let ctx = source.context(&p.overrides())?;

    let raw = source.client().get_json(&ctx, path, &[]).await?;
    let list = ListPayload::from_value(&raw, item_keys);

    match p.response_format {
        ResponseFormat::Json => json_result(&listing_envelope(envelope_key, list.items, None)),
        ResponseFormat::Markdown => Ok(text_result(named_items_markdown(heading, &list.items))),
    }
}
