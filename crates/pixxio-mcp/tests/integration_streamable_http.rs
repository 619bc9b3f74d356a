mod common;

use anyhow::Context as _;
use common::{FakeDam, McpStreamableHttpSession, TEST_API_KEY, first_text, start_http_server};
use serde_json::json;
use std::time::Duration;

async fn fake_dam() -> anyhow::Result<FakeDam> {
    FakeDam::builder()
        .json(
            "GET",
            "/api/v1/files",
            json!({
                "success": true,
                "files": [{"id": 11, "fileName": "harbor.jpg", "fileType": "image", "fileSize": 2048}],
                "quantity": 1
            }),
        )
        .json(
            "POST",
            "/api/v1/files/11/convert",
            json!({"success": true, "downloadURL": "{base}/dl/harbor.jpg"}),
        )
        .bytes(
            "/dl/harbor.jpg",
            "image/jpeg",
            Some("attachment; filename=\"harbor.jpg\""),
            vec![1_u8; 64],
        )
        .start()
        .await
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_configuration() -> anyhow::Result<()> {
    let dam = fake_dam().await?;
    let dir = tempfile::tempdir().context("tempdir")?;
    let (base_url, _server) = start_http_server(dam.base_url(), dir.path()).await?;

    let health: serde_json::Value = reqwest::get(format!("{base_url}/health"))
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["service"], "pixxio-mcp");
    assert_eq!(health["apiKeyConfigured"], true);
    assert_eq!(health["baseUrl"], dam.base_url());
    assert!(health["version"].is_string());
    assert!(!health.to_string().contains(TEST_API_KEY));

    dam.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn tools_list_and_search_roundtrip() -> anyhow::Result<()> {
    let dam = fake_dam().await?;
    let dir = tempfile::tempdir().context("tempdir")?;
    let (base_url, _server) = start_http_server(dam.base_url(), dir.path()).await?;
    let session = McpStreamableHttpSession::connect(&base_url).await?;

    let tools_msg = session
        .request(1, "tools/list", json!({}), Duration::from_secs(10))
        .await?;
    let tools = tools_msg
        .get("result")
        .and_then(|r| r.get("tools"))
        .and_then(serde_json::Value::as_array)
        .context("tools/list missing result.tools")?;
    assert_eq!(tools.len(), 13);
    let search = tools
        .iter()
        .find(|t| t.get("name") == Some(&json!("search")))
        .context("search tool listed")?;
    assert_eq!(search["annotations"]["readOnlyHint"], true);
    assert_eq!(search["inputSchema"]["additionalProperties"], false);

    let call = session
        .call_tool(2, "search", json!({"query": "harbor", "response_format": "json"}))
        .await?;
    let structured = &call["result"]["structuredContent"];
    assert_eq!(structured["total"], 1);
    assert_eq!(structured["assets"][0]["title"], "harbor.jpg");
    assert_eq!(structured["assets"][0]["file_size_human"], "2.0 KB");

    let request = dam
        .requests_to("/api/v1/files")
        .into_iter()
        .next()
        .context("DAM saw the search")?;
    assert_eq!(
        request.authorization.as_deref(),
        Some(format!("Bearer {TEST_API_KEY}").as_str())
    );

    dam.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn download_asset_writes_into_download_dir() -> anyhow::Result<()> {
    let dam = fake_dam().await?;
    let dir = tempfile::tempdir().context("tempdir")?;
    let (base_url, _server) = start_http_server(dam.base_url(), dir.path()).await?;
    let session = McpStreamableHttpSession::connect(&base_url).await?;

    let call = session
        .call_tool(1, "download_asset", json!({"asset_id": 11}))
        .await?;
    assert_eq!(call["result"]["structuredContent"]["file_name"], "harbor.jpg");
    let on_disk = std::fs::read(dir.path().join("harbor.jpg")).context("downloaded file")?;
    assert_eq!(on_disk.len(), 64);

    dam.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failures_are_tool_errors_and_unknown_tools_are_protocol_errors() -> anyhow::Result<()> {
    let dam = fake_dam().await?;
    let dir = tempfile::tempdir().context("tempdir")?;
    let (base_url, _server) = start_http_server(dam.base_url(), dir.path()).await?;
    let session = McpStreamableHttpSession::connect(&base_url).await?;

    let missing = session
        .call_tool(1, "fetch", json!({"asset_id": 999}))
        .await?;
    assert_eq!(missing["result"]["isError"], true);
    assert!(first_text(&missing)?.starts_with("Error: Resource not found."));

    let invalid = session
        .call_tool(2, "search", json!({"query": "x", "colour": "red"}))
        .await?;
    assert_eq!(invalid["result"]["isError"], true);
    assert!(first_text(&invalid)?.starts_with("Error: Invalid parameters:"));

    let unknown = session.call_tool(3, "delete_everything", json!({})).await?;
    assert!(unknown.get("result").is_none());
    assert_eq!(unknown["error"]["code"], -32602);
    assert_eq!(unknown["error"]["message"], "Unknown tool: delete_everything");

    dam.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn legacy_tool_names_are_callable_but_not_listed() -> anyhow::Result<()> {
    let dam = fake_dam().await?;
    let dir = tempfile::tempdir().context("tempdir")?;
    let (base_url, _server) = start_http_server(dam.base_url(), dir.path()).await?;
    let session = McpStreamableHttpSession::connect(&base_url).await?;

    let call = session
        .call_tool(1, "pixxio_search_assets", json!({"query": "harbor"}))
        .await?;
    let text = first_text(&call)?;
    assert!(text.starts_with("# Search Results: \"harbor\""));

    let tools_msg = session
        .request(2, "tools/list", json!({}), Duration::from_secs(10))
        .await?;
    assert!(!tools_msg.to_string().contains("pixxio_search_assets"));

    dam.stop().await;
    Ok(())
}
