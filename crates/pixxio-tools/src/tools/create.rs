use super::params::{CreateCollectionParams, ExternalShareParams, WithCredentials, parse};
use super::{PixxioToolSource, summary_result};
use crate::client::RequestBody;
use crate::error::Result;
use crate::model::{Collection, as_text, pick};
use reqwest::Method;
use rmcp::model::CallToolResult;
use serde_json::{Map, Value, json};

pub(super) async fn collection(
    source: &PixxioToolSource,
    arguments: Value,
) -> Result<CallToolResult> {
    let p: CreateCollectionParams = parse(arguments)?;
    let body = p.body()?;
    let ctx = source.context(&p.overrides())?;

    let raw = source
        .client()
        .request(&ctx, Method::POST, "/collections", &[], Some(RequestBody::Json(body)))
        .await?;
    let created = nested(&raw, &["collection", "data"]).unwrap_or(&raw);
    let mut collection = Collection::from_value(created);
    if let Some(name) = &p.name
        && pick_object(created, &["name", "title"]).is_none()
    {
        collection.name.clone_from(name);
    }

    let id = collection
        .id
        .as_ref()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);
    summary_result(
        format!("Created collection \"{}\" (ID: {id})", collection.name),
        &json!({ "collection": collection }),
    )
}

pub(super) async fn external_share(
    source: &PixxioToolSource,
    arguments: Value,
) -> Result<CallToolResult> {
    let p: ExternalShareParams = parse(arguments)?;
    let body = p.body()?;
    let ctx = source.context(&p.overrides())?;

    let raw = source
        .client()
        .request(&ctx, Method::POST, "/externalShares", &[], Some(RequestBody::Json(body)))
        .await?;
    let share = nested(&raw, &["externalShare", "share", "data"]).unwrap_or(&raw);
    let url = pick_object(share, &["url", "shareURL", "shareUrl", "link"]).and_then(as_text);
    let id = pick_object(share, &["id"]).and_then(as_text);

    let summary = match &url {
        Some(url) => format!("External share created: {url}"),
        None => "External share created (the DAM did not return a link)".to_string(),
    };
    summary_result(
        summary,
        &json!({
            "share_id": id,
            "share_url": url,
            "share": share,
        }),
    )
}

fn nested<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    raw.as_object()
        .and_then(|obj| pick(obj, keys))
        .filter(|v| v.is_object())
}

fn pick_object<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    v.as_object().and_then(|obj: &Map<String, Value>| pick(obj, keys))
}
