//! Base64 content channel for writing files.
//!
//! File content travels base64-encoded so quotes, braces and other source
//! syntax cannot break the textual tool-call protocol.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::path::resolve_path;
use crate::error::ToolError;

pub(super) const WRITE_NAME: &str = "write_encoded";
pub(super) const APPEND_NAME: &str = "append_encoded";

pub(super) const WRITE_DESCRIPTION: &str = "Create a file, or replace its entire content, with base64-encoded content. \
Use this for the first write to a file; continue large files with append_encoded.";

pub(super) const APPEND_DESCRIPTION: &str = "Append base64-encoded content to the end of an existing file. \
May be called repeatedly to build a file in pieces.";

#[derive(Debug, Deserialize)]
pub struct EncodedArgs {
    pub path: String,
    #[serde(alias = "encoded_content")]
    pub content: String,
}

pub(super) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Path of the target file"
            },
            "content": {
                "type": "string",
                "description": "File content encoded as standard base64"
            }
        },
        "required": ["path", "content"]
    })
}

/// Decodes a standard-alphabet base64 payload.
///
/// ASCII whitespace (models like to wrap long lines) is ignored and missing
/// padding is tolerated.
pub fn decode_content(encoded: &str) -> Result<Vec<u8>, ToolError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(compact.trim_end_matches('=')))
        .map_err(|e| ToolError::EncodingError(format!("invalid base64 content: {e}")))
}

pub(super) fn write(working_dir: &Path, args: &EncodedArgs) -> Result<Value, ToolError> {
    let bytes = decode_content(&args.content)?;
    let path = resolve_path(working_dir, &args.path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ToolError::from_io(parent, e))?;
    }
    fs::write(&path, &bytes).map_err(|e| ToolError::from_io(&path, e))?;

    Ok(json!({
        "path": path.display().to_string(),
        "action": "written",
        "bytes": bytes.len(),
    }))
}

pub(super) fn append(working_dir: &Path, args: &EncodedArgs) -> Result<Value, ToolError> {
    let bytes = decode_content(&args.content)?;
    let path = resolve_path(working_dir, &args.path);

    let mut file = OpenOptions::new()
        .append(true)
        .open(&path)
        .map_err(|e| ToolError::from_io(&path, e))?;
    file.write_all(&bytes)
        .map_err(|e| ToolError::from_io(&path, e))?;

    Ok(json!({
        "path": path.display().to_string(),
        "action": "appended",
        "bytes": bytes.len(),
    }))
}
