use super::{Tool, ToolContext, ToolError};
use crate::security::check_path;
use serde_json::json;
use std::path::{Path, PathBuf};

fn two_path_schema(src_desc: &str, dst_desc: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "source": {
                "type": "string",
                "description": src_desc
            },
            "destination": {
                "type": "string",
                "description": dst_desc
            }
        },
        "required": ["source", "destination"]
    })
}

/// Validate both endpoints of a two-path operation.
fn checked_pair(args: &serde_json::Value) -> Result<(PathBuf, PathBuf), ToolError> {
    let source = args["source"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("missing 'source' argument".to_string()))?;
    let destination = args["destination"].as_str().ok_or_else(|| {
        ToolError::InvalidArguments("missing 'destination' argument".to_string())
    })?;

    let source = check_path(source, None).map_err(ToolError::Validation)?;
    let destination = check_path(destination, None).map_err(ToolError::Validation)?;
    Ok((source, destination))
}

pub struct RenameFileTool;

impl Tool for RenameFileTool {
    fn name(&self) -> &str {
        "rename_file"
    }

    fn description(&self) -> &str {
        "Rename a file or directory"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        two_path_schema("The current path", "The new path")
    }

    fn execute(&self, args: serde_json::Value, ctx: &mut ToolContext) -> Result<String, ToolError> {
        let (source, destination) = checked_pair(&args)?;
        if !source.exists() {
            return Err(ToolError::ExecutionFailed(format!(
                "'{}' does not exist",
                source.display()
            )));
        }
        ctx.confirm(&format!(
            "Rename '{}' to '{}'",
            source.display(),
            destination.display()
        ))?;

        std::fs::rename(&source, &destination).map_err(|e| {
            ToolError::ExecutionFailed(format!(
                "Failed to rename '{}': {}",
                source.display(),
                e
            ))
        })?;
        Ok(format!(
            "Renamed '{}' to '{}'",
            source.display(),
            destination.display()
        ))
    }
}

pub struct CopyFileTool;

impl Tool for CopyFileTool {
    fn name(&self) -> &str {
        "copy_file"
    }

    fn description(&self) -> &str {
        "Copy a file or directory (directories are copied recursively)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        two_path_schema("The path to copy from", "The path to copy to")
    }

    fn execute(&self, args: serde_json::Value, ctx: &mut ToolContext) -> Result<String, ToolError> {
        let (source, destination) = checked_pair(&args)?;
        if !source.exists() {
            return Err(ToolError::ExecutionFailed(format!(
                "'{}' does not exist",
                source.display()
            )));
        }
        ctx.confirm(&format!(
            "Copy '{}' to '{}'",
            source.display(),
            destination.display()
        ))?;

        if source.is_dir() {
            copy_dir_recursive(&source, &destination).map_err(|e| {
                ToolError::ExecutionFailed(format!(
                    "Failed to copy '{}': {}",
                    source.display(),
                    e
                ))
            })?;
        } else {
            std::fs::copy(&source, &destination).map_err(|e| {
                ToolError::ExecutionFailed(format!(
                    "Failed to copy '{}': {}",
                    source.display(),
                    e
                ))
            })?;
        }
        Ok(format!(
            "Copied '{}' to '{}'",
            source.display(),
            destination.display()
        ))
    }
}

pub struct MoveFileTool;

impl Tool for MoveFileTool {
    fn name(&self) -> &str {
        "move_file"
    }

    fn description(&self) -> &str {
        "Move a file or directory to a new location"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        two_path_schema("The path to move from", "The path to move to")
    }

    fn execute(&self, args: serde_json::Value, ctx: &mut ToolContext) -> Result<String, ToolError> {
        let (source, destination) = checked_pair(&args)?;
        if !source.exists() {
            return Err(ToolError::ExecutionFailed(format!(
                "'{}' does not exist",
                source.display()
            )));
        }
        ctx.confirm(&format!(
            "Move '{}' to '{}'",
            source.display(),
            destination.display()
        ))?;

        // rename first; fall back to copy+remove across filesystems
        if std::fs::rename(&source, &destination).is_err() {
            if source.is_dir() {
                copy_dir_recursive(&source, &destination).and_then(|_| {
                    std::fs::remove_dir_all(&source)
                })
            } else {
                std::fs::copy(&source, &destination)
                    .and_then(|_| std::fs::remove_file(&source))
            }
            .map_err(|e| {
                ToolError::ExecutionFailed(format!(
                    "Failed to move '{}': {}",
                    source.display(),
                    e
                ))
            })?;
        }
        Ok(format!(
            "Moved '{}' to '{}'",
            source.display(),
            destination.display()
        ))
    }
}

fn copy_dir_recursive(source: &Path, destination: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(destination)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
