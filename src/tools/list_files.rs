use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

use super::path::resolve_path;
use crate::error::ToolError;

pub(super) const NAME: &str = "list_files";

pub(super) const DESCRIPTION: &str = "List the immediate children of a directory (not recursive). \
Each entry reports its name and whether it is a file or a dir.";

#[derive(Debug, Deserialize)]
pub struct ListFilesArgs {
    pub path: String,
}

pub(super) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Directory to list, e.g. \".\" for the working directory"
            }
        },
        "required": ["path"]
    })
}

pub(super) fn execute(working_dir: &Path, args: &ListFilesArgs) -> Result<Value, ToolError> {
    let path = resolve_path(working_dir, &args.path);

    let metadata = std::fs::metadata(&path).map_err(|e| ToolError::from_io(&path, e))?;
    if !metadata.is_dir() {
        return Err(ToolError::NotADirectory(path));
    }

    let mut entries: Vec<(String, &'static str)> = Vec::new();
    for entry in std::fs::read_dir(&path).map_err(|e| ToolError::from_io(&path, e))? {
        let entry = entry.map_err(|e| ToolError::from_io(&path, e))?;
        // Follows symlinks; a dangling link is reported as a file.
        let kind = if entry.path().is_dir() { "dir" } else { "file" };
        entries.push((entry.file_name().to_string_lossy().into_owned(), kind));
    }
    entries.sort();

    let files: Vec<Value> = entries
        .into_iter()
        .map(|(name, kind)| json!({"filename": name, "type": kind}))
        .collect();

    Ok(json!({
        "path": path.display().to_string(),
        "files": files,
    }))
}
