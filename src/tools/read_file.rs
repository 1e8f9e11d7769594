use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

use super::path::resolve_path;
use crate::error::ToolError;

pub(super) const NAME: &str = "read_file";

pub(super) const DESCRIPTION: &str = "Read the full text content of a file. \
Relative paths are resolved against the working directory; `~` expands to the home directory.";

#[derive(Debug, Deserialize)]
pub struct ReadFileArgs {
    #[serde(alias = "filename")]
    pub path: String,
}

pub(super) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Path of the file to read"
            }
        },
        "required": ["path"]
    })
}

pub(super) fn execute(working_dir: &Path, args: &ReadFileArgs) -> Result<Value, ToolError> {
    let path = resolve_path(working_dir, &args.path);

    let metadata = std::fs::metadata(&path).map_err(|e| ToolError::from_io(&path, e))?;
    if metadata.is_dir() {
        return Err(ToolError::NotAFile(path));
    }

    let bytes = std::fs::read(&path).map_err(|e| ToolError::from_io(&path, e))?;
    let content = String::from_utf8(bytes).map_err(|_| {
        ToolError::EncodingError(format!("{} is not valid UTF-8 text", path.display()))
    })?;

    Ok(json!({
        "file_path": path.display().to_string(),
        "content": content,
    }))
}
