#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The persisted statistics document.
//!
//! The document is a single JSON object whose top-level keys are sections.
//! A run loads the previous document, replaces the sections it computed and
//! writes the result back, so sections it did not compute survive
//! untouched.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Top-level section name → section contents.
pub type Document = Map<String, Value>;

/// Errors that can occur while writing the document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads the document at `path`.
///
/// A missing file, unreadable file, malformed JSON or a top-level value
/// that is not an object all yield an empty document with a warning.
#[must_use]
pub fn load_or_empty(path: &Path) -> Document {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("No existing document at {}; starting empty", path.display());
            return Document::new();
        }
        Err(e) => {
            log::warn!("Failed to read document {}: {e}; starting empty", path.display());
            return Document::new();
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(document)) => {
            log::info!(
                "Loaded document from {} ({} section(s))",
                path.display(),
                document.len()
            );
            document
        }
        Ok(_) => {
            log::warn!(
                "Document {} is not a JSON object; starting empty",
                path.display()
            );
            Document::new()
        }
        Err(e) => {
            log::warn!("Failed to parse document {}: {e}; starting empty", path.display());
            Document::new()
        }
    }
}

/// Replaces the top-level keys named in `sections`, leaving every other
/// key of `document` untouched.
///
/// Merging the same sections twice gives the same document as merging
/// them once.
#[must_use]
pub fn merge(mut document: Document, sections: Document) -> Document {
    for (key, value) in sections {
        if document.insert(key.clone(), value).is_some() {
            log::debug!("Replaced section {key}");
        } else {
            log::debug!("Added section {key}");
        }
    }
    document
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `document` to `path` as pretty-printed JSON.
///
/// Uses an atomic write pattern (write to `.tmp`, then rename) so an
/// interrupted run never leaves a truncated document behind.
///
/// # Errors
///
/// Returns [`DocumentError`] if the document cannot be serialized or the
/// file cannot be written.
pub fn save(path: &Path, document: &Document) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    let contents = serde_json::to_string_pretty(document)?;
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    log::info!(
        "Saved document to {} ({} section(s))",
        path.display(),
        document.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "job_market_document_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn merge_replaces_only_given_sections() {
        let base = doc(json!({
            "methodology": {"generated": "old"},
            "state_statistics": {"TX": 1},
            "custom_notes": "keep me",
        }));
        let merged = merge(base, doc(json!({"state_statistics": {"TX": 2}})));

        assert_eq!(merged["state_statistics"], json!({"TX": 2}));
        assert_eq!(merged["methodology"], json!({"generated": "old"}));
        assert_eq!(merged["custom_notes"], json!("keep me"));
    }

    #[test]
    fn merge_is_idempotent() {
        let base = doc(json!({"a": 1, "b": [1, 2]}));
        let sections = doc(json!({"b": [3], "c": {"x": true}}));

        let once = merge(base.clone(), sections.clone());
        let twice = merge(once.clone(), sections);
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_document_loads_empty() {
        let dir = scratch_dir("missing");
        assert!(load_or_empty(&dir.join("nope.json")).is_empty());
    }

    #[test]
    fn corrupt_or_non_object_document_loads_empty() {
        let dir = scratch_dir("corrupt");
        let corrupt = dir.join("corrupt.json");
        std::fs::write(&corrupt, "{ not json").unwrap();
        assert!(load_or_empty(&corrupt).is_empty());

        let array = dir.join("array.json");
        std::fs::write(&array, "[1, 2, 3]").unwrap();
        assert!(load_or_empty(&array).is_empty());
    }

    #[test]
    fn save_then_load_keeps_sections() {
        let dir = scratch_dir("save");
        let path = dir.join("nested").join("stats.json");
        let document = doc(json!({"summary_stats": {"total_records": 3}}));

        save(&path, &document).unwrap();
        assert!(!tmp_path(&path).exists());
        assert_eq!(load_or_empty(&path), document);
    }
}
