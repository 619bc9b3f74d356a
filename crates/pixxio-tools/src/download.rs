//! Binary retrieval: convert requests, file naming, local persistence and inline encoding.

use crate::client::BinaryPayload;
use crate::error::{PixxioError, Result};
use crate::model::{AssetId, as_text, pick};
use crate::normalize::format_file_size;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DownloadType {
    #[default]
    Original,
    Preview,
    Custom,
    DownloadFormat,
}

impl DownloadType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Preview => "preview",
            Self::Custom => "custom",
            Self::DownloadFormat => "downloadFormat",
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for `POST /files/{id}/convert`.
///
/// `width`, `height`, `quality` and `file_extension` only apply to [`DownloadType::Custom`];
/// `download_format_id` only to [`DownloadType::DownloadFormat`]. Values for other types are
/// dropped, not rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertRequest {
    pub asset_id: Option<AssetId>,
    pub download_type: DownloadType,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    pub file_extension: Option<String>,
    pub download_format_id: Option<AssetId>,
}

impl ConvertRequest {
    /// # Errors
    ///
    /// Returns [`PixxioError::Validation`] when the asset id is missing, a `downloadFormat`
    /// request has no format id, or custom dimensions/quality are out of range.
    pub fn validate(&self) -> Result<()> {
        if self.asset_id.as_ref().is_none_or(AssetId::is_unset) {
            return Err(PixxioError::Validation("asset_id is required".to_string()));
        }
        match self.download_type {
            DownloadType::DownloadFormat => {
                if self.download_format_id.as_ref().is_none_or(AssetId::is_unset) {
                    return Err(PixxioError::Validation(
                        "download_format_id is required when download_type is 'downloadFormat'"
                            .to_string(),
                    ));
                }
            }
            DownloadType::Custom => {
                if let Some(q) = self.quality
                    && !(1..=100).contains(&q)
                {
                    return Err(PixxioError::Validation(format!(
                        "quality must be between 1 and 100, got {q}"
                    )));
                }
                if self.width == Some(0) || self.height == Some(0) {
                    return Err(PixxioError::Validation(
                        "width and height must be positive".to_string(),
                    ));
                }
            }
            DownloadType::Original | DownloadType::Preview => {}
        }
        Ok(())
    }

    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("downloadType".to_string(), self.download_type.to_string()),
            ("responseType".to_string(), "path".to_string()),
        ];
        match self.download_type {
            DownloadType::Custom => {
                if let Some(w) = self.width {
                    fields.push(("width".to_string(), w.to_string()));
                }
                if let Some(h) = self.height {
                    fields.push(("height".to_string(), h.to_string()));
                }
                if let Some(q) = self.quality {
                    fields.push(("quality".to_string(), q.to_string()));
                }
                if let Some(ext) = self
                    .file_extension
                    .as_deref()
                    .map(|e| e.trim().trim_start_matches('.'))
                    .filter(|e| !e.is_empty())
                {
                    fields.push(("fileExtension".to_string(), ext.to_ascii_lowercase()));
                }
            }
            DownloadType::DownloadFormat => {
                if let Some(id) = &self.download_format_id {
                    fields.push(("downloadFormatID".to_string(), id.to_string()));
                }
            }
            DownloadType::Original | DownloadType::Preview => {}
        }
        fields
    }
}

/// The generated download URL from a convert response.
#[must_use]
pub fn download_url_from_response(body: &Value) -> Option<String> {
    match body {
        Value::String(_) => as_text(body),
        Value::Object(obj) => pick(obj, &["downloadURL", "downloadUrl", "url", "path"])
            .and_then(as_text)
            .or_else(|| pick(obj, &["data", "result"]).and_then(download_url_from_response)),
        _ => None,
    }
}

/// Conventional file extension for a MIME type, if known.
#[must_use]
pub fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    let mime: mime::Mime = content_type.parse().ok()?;
    let ext = match (mime.type_().as_str(), mime.subtype().as_str()) {
        ("image", "jpeg" | "jpg" | "pjpeg") => "jpg",
        ("image", "png") => "png",
        ("image", "gif") => "gif",
        ("image", "webp") => "webp",
        ("image", "tiff") => "tif",
        ("image", "bmp") => "bmp",
        ("image", "svg") => "svg",
        ("image", "heic") => "heic",
        ("application", "pdf") => "pdf",
        ("application", "zip") => "zip",
        ("application", "postscript") => "eps",
        ("video", "mp4") => "mp4",
        ("video", "quicktime") => "mov",
        ("video", "webm") => "webm",
        ("audio", "mpeg") => "mp3",
        ("audio", "wav" | "x-wav") => "wav",
        ("text", "plain") => "txt",
        ("text", "csv") => "csv",
        _ => return None,
    };
    Some(ext)
}

/// MIME type for a file extension, falling back to `application/octet-stream`.
#[must_use]
pub fn mime_for_extension(ext: &str) -> mime::Mime {
    let essence = match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => return mime::IMAGE_JPEG,
        "png" => return mime::IMAGE_PNG,
        "gif" => return mime::IMAGE_GIF,
        "svg" => return mime::IMAGE_SVG,
        "bmp" => return mime::IMAGE_BMP,
        "pdf" => return mime::APPLICATION_PDF,
        "txt" => return mime::TEXT_PLAIN,
        "csv" => return mime::TEXT_CSV,
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "zip" => "application/zip",
        _ => return mime::APPLICATION_OCTET_STREAM,
    };
    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// Pick the file name for a download.
///
/// Order: caller-supplied, then the response header, then `<asset id>.<ext>`. An extension derived
/// from the content type (or `fallback_ext`) is appended when the chosen name has none.
#[must_use]
pub fn resolve_file_name(
    explicit: Option<&str>,
    from_header: Option<&str>,
    asset_id: &AssetId,
    content_type: Option<&str>,
    fallback_ext: Option<&str>,
) -> String {
    let ext = content_type
        .and_then(extension_for_mime)
        .map(str::to_string)
        .or_else(|| {
            fallback_ext
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
        });

    let chosen = [explicit, from_header]
        .into_iter()
        .flatten()
        .map(sanitize_file_name)
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| sanitize_file_name(&asset_id.to_string()));

    let chosen = if chosen.is_empty() {
        "asset".to_string()
    } else {
        chosen
    };
    match ext {
        Some(ext) if !has_extension(&chosen) => format!("{chosen}.{ext}"),
        _ => chosen,
    }
}

fn has_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|e| !e.is_empty())
}

/// Reduce a name to a single safe path component.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();
    cleaned.trim().trim_start_matches('.').to_string()
}

/// A file persisted by `download_asset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub size_human: String,
    pub mime_type: String,
}

/// Write `payload` to `dir/file_name`, creating the directory if needed. Existing files are
/// overwritten.
///
/// # Errors
///
/// Returns [`PixxioError::Io`] if the directory cannot be created or the file cannot be written.
pub async fn persist(dir: &Path, file_name: &str, payload: &BinaryPayload) -> Result<SavedFile> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, &payload.bytes).await?;

    let size = payload.bytes.len() as u64;
    Ok(SavedFile {
        path,
        file_name: file_name.to_string(),
        size,
        size_human: format_file_size(size),
        mime_type: payload_mime(payload, file_name),
    })
}

/// Inline (base64) form of a binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineContent {
    pub data: String,
    pub mime_type: String,
    pub size: u64,
}

#[must_use]
pub fn inline(payload: &BinaryPayload, file_name: &str) -> InlineContent {
    InlineContent {
        data: base64::engine::general_purpose::STANDARD.encode(&payload.bytes),
        mime_type: payload_mime(payload, file_name),
        size: payload.bytes.len() as u64,
    }
}

fn payload_mime(payload: &BinaryPayload, file_name: &str) -> String {
    payload
        .content_type
        .as_deref()
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .filter(|m| *m != mime::APPLICATION_OCTET_STREAM)
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| {
            Path::new(file_name)
                .extension()
                .and_then(|e| e.to_str())
                .map_or(mime::APPLICATION_OCTET_STREAM, mime_for_extension)
                .essence_str()
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(download_type: DownloadType) -> ConvertRequest {
        ConvertRequest {
            asset_id: Some(AssetId::Int(42)),
            download_type,
            width: Some(800),
            height: Some(600),
            quality: Some(80),
            file_extension: Some(".PNG".to_string()),
            download_format_id: Some(AssetId::Int(3)),
        }
    }

    #[test]
    fn download_format_requires_an_id() {
        let mut req = request(DownloadType::DownloadFormat);
        req.download_format_id = None;
        let err = req.validate().expect_err("missing format id");
        assert!(matches!(err, PixxioError::Validation(_)));
        assert!(err.to_string().contains("download_format_id"));

        req.download_format_id = Some(AssetId::Int(0));
        assert!(req.validate().is_err());
    }

    #[test]
    fn custom_quality_is_bounded() {
        let mut req = request(DownloadType::Custom);
        req.quality = Some(0);
        assert!(req.validate().is_err());
        req.quality = Some(101);
        assert!(req.validate().is_err());
        req.quality = Some(100);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn custom_fields_are_only_sent_for_custom() {
        let custom = request(DownloadType::Custom).form_fields();
        let names: Vec<&str> = custom.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["downloadType", "responseType", "width", "height", "quality", "fileExtension"]
        );
        assert!(custom.contains(&("fileExtension".to_string(), "png".to_string())));

        let preview = request(DownloadType::Preview).form_fields();
        assert_eq!(
            preview,
            vec![
                ("downloadType".to_string(), "preview".to_string()),
                ("responseType".to_string(), "path".to_string()),
            ]
        );

        let format = request(DownloadType::DownloadFormat).form_fields();
        assert!(format.contains(&("downloadFormatID".to_string(), "3".to_string())));
        assert!(!format.iter().any(|(k, _)| k == "width"));
    }

    #[test]
    fn download_url_is_found_in_common_shapes() {
        assert_eq!(
            download_url_from_response(&json!({"success": true, "downloadURL": "https://x/y.jpg"})),
            Some("https://x/y.jpg".to_string())
        );
        assert_eq!(
            download_url_from_response(&json!({"data": {"url": "https://x/z.jpg"}})),
            Some("https://x/z.jpg".to_string())
        );
        assert_eq!(download_url_from_response(&json!({"success": true})), None);
    }

    #[test]
    fn file_name_precedence() {
        let id = AssetId::Int(42);
        assert_eq!(
            resolve_file_name(Some("brief"), Some("server.pdf"), &id, Some("application/pdf"), None),
            "brief.pdf"
        );
        assert_eq!(
            resolve_file_name(None, Some("server.pdf"), &id, Some("application/pdf"), None),
            "server.pdf"
        );
        assert_eq!(
            resolve_file_name(None, None, &id, Some("image/jpeg"), None),
            "42.jpg"
        );
        assert_eq!(resolve_file_name(None, None, &id, None, Some(".PNG")), "42.png");
        assert_eq!(resolve_file_name(None, None, &id, None, None), "42");
        assert_eq!(
            resolve_file_name(Some("../../etc/passwd"), None, &id, Some("text/plain"), None),
            "passwd.txt"
        );
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(extension_for_mime("image/jpeg; charset=binary"), Some("jpg"));
        assert_eq!(extension_for_mime("application/x-unknown"), None);
        assert_eq!(mime_for_extension("JPG"), mime::IMAGE_JPEG);
        assert_eq!(mime_for_extension("webp").essence_str(), "image/webp");
        assert_eq!(mime_for_extension(".tif").essence_str(), "image/tiff");
        assert_eq!(mime_for_extension("psd"), mime::APPLICATION_OCTET_STREAM);
    }

    #[tokio::test]
    async fn persist_creates_directory_and_reports_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested");
        let payload = BinaryPayload {
            bytes: vec![1_u8; 2048],
            content_type: Some("image/png".to_string()),
            file_name: None,
        };

        let saved = persist(&target, "42.png", &payload).await.expect("persist");
        assert_eq!(saved.path, target.join("42.png"));
        assert_eq!(saved.size, 2048);
        assert_eq!(saved.size_human, "2.0 KB");
        assert_eq!(saved.mime_type, "image/png");
        let on_disk = tokio::fs::read(&saved.path).await.expect("read back");
        assert_eq!(on_disk.len(), 2048);
    }

    #[test]
    fn inline_encodes_base64_and_guesses_mime() {
        let payload = BinaryPayload {
            bytes: b"hello".to_vec(),
            content_type: Some("application/octet-stream".to_string()),
            file_name: None,
        };
        let inline = inline(&payload, "preview.jpg");
        assert_eq!(inline.data, "aGVsbG8=");
        assert_eq!(inline.mime_type, "image/jpeg");
        assert_eq!(inline.size, 5);
    }
}
