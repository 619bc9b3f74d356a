//! Markdown renderings for tool results.
//!
//! Section order for an asset is fixed: title, identifier, type, size, timestamps, keywords,
//! description, then URLs. Lines without data are omitted rather than rendered empty.

use crate::model::{Collection, Directory, Keyword, as_text, pick};
use crate::normalize::{AssetRecord, Pagination};
use serde_json::Value;
use std::fmt::Write as _;

#[must_use]
pub fn asset_markdown(record: &AssetRecord) -> String {
    let mut lines = vec![format!("## {}", record.title)];

    let id = record
        .id
        .as_ref()
        .map_or_else(|| "N/A".to_string(), ToString::to_string);
    lines.push(format!("**ID**: {id}"));

    match record.file_extension.as_deref() {
        Some(ext) => lines.push(format!("**Type**: {} ({ext})", record.file_type)),
        None => lines.push(format!("**Type**: {}", record.file_type)),
    }
    lines.push(format!("**Size**: {}", record.file_size_human));
    if let (Some(w), Some(h)) = (record.width, record.height) {
        lines.push(format!("**Dimensions**: {w} x {h} px"));
    }

    for (label, value) in [
        ("Created", &record.created),
        ("Uploaded", &record.uploaded),
        ("Modified", &record.modified),
    ] {
        if let Some(v) = value {
            lines.push(format!("**{label}**: {v}"));
        }
    }

    if !record.keywords.is_empty() {
        lines.push(format!("**Keywords**: {}", record.keywords.join(", ")));
    }
    if let Some(rating) = record.rating {
        lines.push(format!("**Rating**: {rating}"));
    }

    if let Some(subject) = record.subject.as_deref()
        && record.file_name.is_some()
    {
        lines.push(format!("**Subject**: {subject}"));
    }
    if let Some(description) = record.description.as_deref() {
        lines.push(format!("**Description**: {description}"));
    }
    if let Some(dir) = record.directory_id.as_ref() {
        lines.push(format!("**Directory**: {dir}"));
    }
    if !record.collection_ids.is_empty() {
        let ids: Vec<String> = record.collection_ids.iter().map(ToString::to_string).collect();
        lines.push(format!("**Collections**: {}", ids.join(", ")));
    }
    let mut flags = Vec::new();
    if record.is_archived {
        flags.push("archived");
    }
    if record.is_locked {
        flags.push("locked");
    }
    if !flags.is_empty() {
        lines.push(format!("**Status**: {}", flags.join(", ")));
    }

    if let Some(url) = record.preview_url.as_deref() {
        lines.push(format!("**Preview**: {url}"));
    }
    if let Some(url) = record.original_url.as_deref() {
        lines.push(format!("**Original**: {url}"));
    }

    lines.join("\n")
}

#[must_use]
pub fn search_markdown(query: Option<&str>, records: &[AssetRecord], page: &Pagination) -> String {
    let mut out = match query {
        Some(q) => format!("# Search Results: \"{q}\"\n\n"),
        None => "# Search Results\n\n".to_string(),
    };
    let _ = writeln!(
        out,
        "Found {} assets (showing {})",
        page.total,
        records.len()
    );

    if records.is_empty() {
        out.push_str("\nNo assets matched the search criteria.\n");
        return out;
    }

    for record in records {
        out.push('\n');
        out.push_str(&asset_markdown(record));
        out.push_str("\n\n---\n");
    }

    if let Some(next) = page.next_offset {
        let _ = write!(out, "\nMore results available: use offset={next}\n");
    }
    out
}

/// Indented tree; children render one level deeper than their parent, in input order.
#[must_use]
pub fn directory_tree_markdown(dirs: &[Directory]) -> String {
    let mut out = String::from("# Directories\n\n");
    if dirs.is_empty() {
        out.push_str("No directories found.\n");
        return out;
    }
    for d in dirs {
        write_directory(&mut out, d, 0);
    }
    out
}

fn write_directory(out: &mut String, dir: &Directory, depth: usize) {
    let indent = "  ".repeat(depth);
    let id = dir
        .id
        .as_ref()
        .map_or_else(|| "N/A".to_string(), ToString::to_string);
    let _ = write!(out, "{indent}- **{}** (ID: {id})", dir.name);
    if let Some(path) = dir.path.as_deref() {
        let _ = write!(out, " `{path}`");
    }
    if dir.has_children && dir.children.is_empty() {
        out.push_str(" [has subdirectories]");
    }
    out.push('\n');
    for child in &dir.children {
        write_directory(out, child, depth + 1);
    }
}

#[must_use]
pub fn collections_markdown(collections: &[Collection], page: &Pagination) -> String {
    let mut out = String::from("# Collections\n\n");
    let _ = writeln!(
        out,
        "Showing {} of {} collections",
        collections.len(),
        page.total
    );
    for c in collections {
        let id = c
            .id
            .as_ref()
            .map_or_else(|| "N/A".to_string(), ToString::to_string);
        let kind = if c.is_dynamic { "dynamic" } else { "static" };
        let _ = write!(out, "\n## {}\n**ID**: {id}\n**Kind**: {kind}\n", c.name);
        if let Some(n) = c.file_count {
            let _ = writeln!(out, "**Files**: {n}");
        }
        if let Some(created) = c.created.as_deref() {
            let _ = writeln!(out, "**Created**: {created}");
        }
        if let Some(desc) = c.description.as_deref() {
            let _ = writeln!(out, "**Description**: {desc}");
        }
    }
    if let Some(next) = page.next_page {
        let _ = write!(out, "\nMore collections available: use page={next}\n");
    }
    out
}

#[must_use]
pub fn keywords_markdown(keywords: &[Keyword], page: &Pagination) -> String {
    let mut out = String::from("# Keywords\n\n");
    if keywords.is_empty() {
        out.push_str("No keywords found.\n");
        return out;
    }
    for k in keywords {
        let _ = write!(out, "- {}", k.name);
        if let Some(n) = k.usage_count {
            let _ = write!(out, " ({n})");
        }
        out.push('\n');
    }
    if let Some(next) = page.next_page {
        let _ = write!(out, "\nMore keywords available: use page={next}\n");
    }
    out
}

/// Generic list for loosely-structured items (metadata fields, download formats).
#[must_use]
pub fn named_items_markdown(heading: &str, items: &[Value]) -> String {
    let mut out = format!("# {heading}\n\n");
    if items.is_empty() {
        out.push_str("None available.\n");
        return out;
    }
    for item in items {
        let Some(obj) = item.as_object() else {
            let _ = writeln!(out, "- {item}");
            continue;
        };
        let name = pick(obj, &["name", "label", "title"])
            .and_then(as_text)
            .unwrap_or_else(|| "Unnamed".to_string());
        let _ = write!(out, "- **{name}**");
        if let Some(id) = pick(obj, &["id"]).and_then(as_text) {
            let _ = write!(out, " (ID: {id})");
        }
        if let Some(kind) = pick(obj, &["type", "fieldType", "fileExtension"]).and_then(as_text) {
            let _ = write!(out, " - {kind}");
        }
        out.push('\n');
    }
    out
}
