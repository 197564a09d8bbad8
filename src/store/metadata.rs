//! Upload metadata resolution from file names.
//!
//! Naive extension-based sniffing: a rightmost `.gz` suffix marks the object
//! as gzip-encoded and is stripped before the base type is guessed. Override
//! entries are consulted longest-suffix-first so compound extensions can be
//! mapped explicitly.

use std::collections::HashMap;

/// Content type and optional content encoding attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub content_encoding: Option<String>,
}

impl ObjectMetadata {
    /// Human-readable form for log lines.
    pub fn describe(&self) -> String {
        match &self.content_encoding {
            Some(encoding) => format!(
                "Content-Type: {}, Content-Encoding: {}",
                self.content_type, encoding
            ),
            None => format!("Content-Type: {}", self.content_type),
        }
    }
}

const OCTET_STREAM: &str = "application/octet-stream";
const GZIP_STREAM: &str = "application/gzip";

/// Resolve upload metadata for a file name.
///
/// `overrides` maps extension suffixes (`".map"`, `".min.js"`) to content
/// types and wins over the standard table.
pub fn resolve_object_metadata(
    file_name: &str,
    overrides: &HashMap<String, String>,
) -> ObjectMetadata {
    // Everything after the base name, split on dots
    let mut extensions: Vec<&str> = file_name.split('.').skip(1).collect();

    let mut gzip = false;
    if extensions.last() == Some(&"gz") {
        gzip = true;
        extensions.pop();
    }

    let mut content_type = None;
    for start in 0..extensions.len() {
        let suffix = format!(".{}", extensions[start..].join("."));
        if let Some(mapped) = overrides.get(&suffix) {
            content_type = Some(mapped.clone());
            break;
        }
        // The standard table only knows single extensions
        if start == extensions.len() - 1 {
            if let Some(guessed) = mime_guess::from_ext(extensions[start]).first_raw() {
                content_type = Some(guessed.to_string());
                break;
            }
        }
    }

    match content_type {
        Some(content_type) => ObjectMetadata {
            content_type,
            content_encoding: gzip.then(|| "gzip".to_string()),
        },
        // A gzip file with no recognizable base type is the compressed
        // stream itself, so the encoding header is dropped
        None if gzip => ObjectMetadata {
            content_type: GZIP_STREAM.to_string(),
            content_encoding: None,
        },
        None => ObjectMetadata {
            content_type: OCTET_STREAM.to_string(),
            content_encoding: None,
        },
    }
}
