use super::params::{ConvertParams, DownloadParams, PreviewParams, WithCredentials, parse};
use super::{PixxioToolSource, path_segment, summary_result};
use crate::client::RequestBody;
use crate::config::ApiContext;
use crate::download::{
    ConvertRequest, DownloadType, download_url_from_response, inline, persist, resolve_file_name,
};
use crate::error::{PixxioError, Result};
use crate::normalize::format_file_size;
use reqwest::Method;
use rmcp::model::{CallToolResult, Content};
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

/// `POST /files/{id}/convert` and return the absolute download URL.
async fn convert(
    source: &PixxioToolSource,
    ctx: &ApiContext,
    req: &ConvertRequest,
) -> Result<String> {
    let Some(asset_id) = &req.asset_id else {
        return Err(PixxioError::Validation("asset_id is required".to_string()));
    };
    let id = path_segment(asset_id)?;

    let raw = source
        .client()
        .request(
            ctx,
            Method::POST,
            &format!("/files/{id}/convert"),
            &[],
            Some(RequestBody::Form(req.form_fields())),
        )
        .await?;

    let Some(url) = download_url_from_response(&raw) else {
        return Err(PixxioError::UnexpectedResponse(
            "convert response did not include a download URL".to_string(),
        ));
    };
    // Relative paths are resolved against the DAM host.
    let absolute = ctx
        .base_url()
        .join(&url)
        .map_or(url, |u| u.to_string());
    debug!(asset_id = %asset_id, download_type = %req.download_type, "resolved download URL");
    Ok(absolute)
}

pub(super) async fn download_url(
    source: &PixxioToolSource,
    arguments: Value,
) -> Result<CallToolResult> {
    let p: ConvertParams = parse(arguments)?;
    let req = p.convert_request();
    req.validate()?;
    let ctx = source.context(&p.overrides())?;

    let url = convert(source, &ctx, &req).await?;
    summary_result(
        format!(
            "Download URL for asset {} ({}):\n{url}",
            p.asset_id, req.download_type
        ),
        &json!({
            "asset_id": p.asset_id,
            "download_type": req.download_type,
            "download_url": url,
        }),
    )
}

pub(super) async fn preview(source: &PixxioToolSource, arguments: Value) -> Result<CallToolResult> {
    let p: PreviewParams = parse(arguments)?;
    let req = p.convert_request();
    req.validate()?;
    let ctx = source.context(&p.overrides())?;

    let url = convert(source, &ctx, &req).await?;
    let payload = source.client().fetch_binary(&ctx, &url).await?;
    let file_name = resolve_file_name(
        None,
        payload.file_name.as_deref(),
        &p.asset_id,
        payload.content_type.as_deref(),
        url_extension(&url).as_deref(),
    );
    let image = inline(&payload, &file_name);
    if !image.mime_type.starts_with("image/") {
        return Err(PixxioError::UnexpectedResponse(format!(
            "preview is not an image (content type {})",
            image.mime_type
        )));
    }

    let caption = format!(
        "Preview of asset {} ({}, {})",
        p.asset_id,
        image.mime_type,
        format_file_size(image.size)
    );
    Ok(CallToolResult::success(vec![
        Content::image(image.data, image.mime_type),
        Content::text(caption),
    ]))
}

pub(super) async fn download(source: &PixxioToolSource, arguments: Value) -> Result<CallToolResult> {
    let p: DownloadParams = parse(arguments)?;
    let req = p.convert_request();
    req.validate()?;
    let ctx = source.context(&p.overrides())?;

    let url = convert(source, &ctx, &req).await?;
    let payload = source.client().fetch_binary(&ctx, &url).await?;

    let requested_ext = (req.download_type == DownloadType::Custom)
        .then(|| req.file_extension.clone())
        .flatten();
    let fallback_ext = requested_ext.or_else(|| url_extension(&url));
    let file_name = resolve_file_name(
        p.file_name.as_deref(),
        payload.file_name.as_deref(),
        &p.asset_id,
        payload.content_type.as_deref(),
        fallback_ext.as_deref(),
    );

    let saved = persist(&source.settings().download_dir, &file_name, &payload).await?;
    summary_result(
        format!(
            "Downloaded asset {} to {} ({})",
            p.asset_id,
            saved.path.display(),
            saved.size_human
        ),
        &saved,
    )
}

/// Extension of the last path segment of `url`, ignoring query and fragment.
fn url_extension(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?.to_string();
    Path::new(&last)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5)
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::url_extension;

    #[test]
    fn url_extension_ignores_query() {
        assert_eq!(
            url_extension("https://cdn.example/a/b/photo.JPG?token=x#frag").as_deref(),
            Some("jpg")
        );
        assert_eq!(url_extension("https://cdn.example/a/b/"), None);
        assert_eq!(url_extension("https://cdn.example/download"), None);
        assert_eq!(url_extension("not a url"), None);
    }
}
