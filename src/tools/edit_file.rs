//! Edit tool: replace the first occurrence of a substring, or create/overwrite
//! a whole file when the search string is empty.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use super::path::resolve_path;
use crate::error::ToolError;

pub(super) const NAME: &str = "edit_file";

pub(super) const DESCRIPTION: &str = "Replace the first occurrence of old_str with new_str in a file. \
Later occurrences are left untouched; call again to replace the next one. \
If old_str is empty, the file is created (or fully overwritten) with new_str.";

/// Action reported when `old_str` does not occur in the file.
pub const NOT_FOUND_ACTION: &str = "old_str not found";

#[derive(Debug, Deserialize)]
pub struct EditFileArgs {
    pub path: String,
    #[serde(alias = "old_text")]
    pub old_str: String,
    #[serde(alias = "new_text")]
    pub new_str: String,
}

pub(super) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Path of the file to edit or create"
            },
            "old_str": {
                "type": "string",
                "description": "Exact text to replace; empty to create or overwrite the file"
            },
            "new_str": {
                "type": "string",
                "description": "Replacement text, or the full file content when old_str is empty"
            }
        },
        "required": ["path", "old_str", "new_str"]
    })
}

pub(super) fn execute(working_dir: &Path, args: &EditFileArgs) -> Result<Value, ToolError> {
    let path = resolve_path(working_dir, &args.path);
    let shown = path.display().to_string();

    if args.old_str.is_empty() {
        let existed = path.exists();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ToolError::from_io(parent, e))?;
        }
        fs::write(&path, &args.new_str).map_err(|e| ToolError::from_io(&path, e))?;
        let action = if existed { "overwrote_file" } else { "created_file" };
        return Ok(json!({"path": shown, "action": action}));
    }

    let original = fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            ToolError::EncodingError(format!("{shown} is not valid UTF-8 text"))
        }
        _ => ToolError::from_io(&path, e),
    })?;

    let Some(offset) = original.find(&args.old_str) else {
        return Ok(json!({"path": shown, "action": NOT_FOUND_ACTION}));
    };

    let mut edited = String::with_capacity(original.len() + args.new_str.len());
    edited.push_str(&original[..offset]);
    edited.push_str(&args.new_str);
    edited.push_str(&original[offset + args.old_str.len()..]);

    fs::write(&path, edited).map_err(|e| ToolError::from_io(&path, e))?;

    Ok(json!({"path": shown, "action": "edited", "offset": offset}))
}
