use super::params::{
    FetchParams, ResponseFormat, SearchParams, UpdateAssetParams, WithCredentials, parse,
};
use super::{PixxioToolSource, json_result, path_segment, summary_result, text_result};
use crate::client::RequestBody;
use crate::error::Result;
use crate::markdown::{asset_markdown, search_markdown};
use crate::model::ListPayload;
use crate::normalize::{AssetRecord, Pagination, SearchResults};
use reqwest::Method;
use rmcp::model::CallToolResult;
use serde_json::{Value, json};

/// Fields requested from `/files`; the DAM only returns ids unless asked.
const RESPONSE_FIELDS: &[&str] = &[
    "id",
    "fileName",
    "originalFilename",
    "subject",
    "description",
    "fileType",
    "fileExtension",
    "fileSize",
    "width",
    "height",
    "createDate",
    "uploadDate",
    "modifyDate",
    "keywords",
    "rating",
    "previewFileURL",
    "originalFileURL",
    "directory",
    "collections",
    "isArchived",
    "isLocked",
    "dynamicMetadata",
];

const FILE_LIST_KEYS: &[&str] = &["files", "assets", "data", "items"];

fn response_fields() -> String {
    serde_json::to_string(RESPONSE_FIELDS).unwrap_or_default()
}

pub(super) async fn search(source: &PixxioToolSource, arguments: Value) -> Result<CallToolResult> {
    let p: SearchParams = parse(arguments)?;
    p.validate()?;
    let ctx = source.context(&p.overrides())?;

    let mut query = vec![
        ("limit", p.limit.to_string()),
        ("offset", p.offset.to_string()),
        ("responseFields", response_fields()),
    ];
    if let Some(filter) = p.filter_inputs().to_query_value() {
        query.push(("filter", filter));
    }
    if let Some(field) = p.sort_by.dam_field() {
        query.push(("sortBy", field.to_string()));
        query.push(("sortDirection", p.sort_order.as_str().to_string()));
    }

    let raw = source.client().get_json(&ctx, "/files", &query).await?;
    let list = ListPayload::from_value(&raw, FILE_LIST_KEYS);
    let assets: Vec<AssetRecord> = list.items.iter().map(AssetRecord::from_value).collect();
    let total = list
        .total
        .unwrap_or_else(|| p.offset.saturating_add(assets.len() as u64));
    let pagination = Pagination::from_offset(total, p.offset, assets.len());

    match p.response_format {
        ResponseFormat::Json => json_result(&SearchResults { pagination, assets }),
        ResponseFormat::Markdown => Ok(text_result(search_markdown(
            p.query.as_deref(),
            &assets,
            &pagination,
        ))),
    }
}

pub(super) async fn fetch(source: &PixxioToolSource, arguments: Value) -> Result<CallToolResult> {
    let p: FetchParams = parse(arguments)?;
    let id = path_segment(&p.asset_id)?;
    let ctx = source.context(&p.overrides())?;

    let raw = source
        .client()
        .get_json(
            &ctx,
            &format!("/files/{id}"),
            &[("responseFields", response_fields())],
        )
        .await?;
    let file = match &raw {
        Value::Object(obj) => obj.get("file").filter(|f| f.is_object()).unwrap_or(&raw),
        _ => &raw,
    };
    let record = AssetRecord::from_value(file);

    match p.response_format {
        ResponseFormat::Json => json_result(&record),
        ResponseFormat::Markdown => Ok(text_result(asset_markdown(&record))),
    }
}

pub(super) async fn update(source: &PixxioToolSource, arguments: Value) -> Result<CallToolResult> {
    let p: UpdateAssetParams = parse(arguments)?;
    p.validate()?;
    let id = path_segment(&p.asset_id)?;
    let ctx = source.context(&p.overrides())?;

    let fields = p.form_fields();
    let updated: Vec<String> = fields.iter().map(|(k, _)| k.clone()).collect();
    source
        .client()
        .request(
            &ctx,
            Method::PUT,
            &format!("/files/{id}"),
            &[],
            Some(RequestBody::Form(fields)),
        )
        .await?;

    summary_result(
        format!("Asset {id} updated: {}", updated.join(", ")),
        &json!({
            "asset_id": p.asset_id,
            "updated_fields": updated,
        }),
    )
}
