use super::{Tool, ToolContext, ToolError};
use crate::security::check_path;
use serde_json::json;

pub struct WriteFileTool;

impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file at the given path"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write to"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    fn execute(&self, args: serde_json::Value, ctx: &mut ToolContext) -> Result<String, ToolError> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'path' argument".to_string()))?;
        let content = args["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'content' argument".to_string()))?;

        let path = check_path(path, None).map_err(ToolError::Validation)?;

        // Protect against emptying existing files
        if path.exists() {
            let existing_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if content.is_empty() && existing_size > 0 {
                return Err(ToolError::Validation(format!(
                    "Refusing to overwrite '{}' ({} bytes) with empty content",
                    path.display(),
                    existing_size
                )));
            }
        }

        let action = if path.exists() {
            format!("Overwrite file '{}'", path.display())
        } else {
            format!("Create file '{}'", path.display())
        };
        ctx.confirm(&action)?;

        std::fs::write(&path, content).map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to write '{}': {}", path.display(), e))
        })?;

        Ok(format!("Successfully wrote to '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{ApproveAll, DenyAll};
    use std::fs;

    fn run(args: serde_json::Value) -> Result<String, ToolError> {
        let mut prompt = ApproveAll;
        let mut ctx = ToolContext {
            auto_confirm: false,
            prompt: &mut prompt,
        };
        WriteFileTool.execute(args, &mut ctx)
    }

    #[test]
    fn test_write_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let path = path.to_str().unwrap();
        let content = "hello from the write tool";

        let result = run(json!({"path": path, "content": content})).unwrap();
        assert!(result.contains("Successfully wrote"));
        assert_eq!(fs::read_to_string(path).unwrap(), content);
    }

    #[test]
    fn test_write_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("over.txt");
        let path = path.to_str().unwrap();

        run(json!({"path": path, "content": "first"})).unwrap();
        run(json!({"path": path, "content": "second"})).unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn test_write_declined_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        fs::write(&path, "original").unwrap();

        let mut prompt = DenyAll;
        let mut ctx = ToolContext {
            auto_confirm: false,
            prompt: &mut prompt,
        };
        let result = WriteFileTool.execute(
            json!({"path": path.to_str().unwrap(), "content": "changed"}),
            &mut ctx,
        );
        assert!(matches!(result, Err(ToolError::Declined)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_write_auto_confirm_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.txt");

        let mut prompt = crate::tools::testing::NoPrompt;
        let mut ctx = ToolContext {
            auto_confirm: true,
            prompt: &mut prompt,
        };
        let result = WriteFileTool.execute(
            json!({"path": path.to_str().unwrap(), "content": "x"}),
            &mut ctx,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_write_blocked_sensitive_path() {
        let result = run(json!({"path": "/etc/shadow", "content": "bad"}));
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_write_path_traversal_blocked() {
        let result = run(json!({"path": "/tmp/../etc/shadow", "content": "bad"}));
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_write_missing_args() {
        assert!(matches!(
            run(json!({"content": "hello"})),
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            run(json!({"path": "/tmp/test.txt"})),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_write_nonexistent_parent_dir() {
        let result = run(json!({
            "path": "/tmp/palisade_nonexistent_dir_xyz/file.txt",
            "content": "hello"
        }));
        assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
    }

    #[test]
    fn test_write_allows_empty_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        let path = path.to_str().unwrap();

        let result = run(json!({"path": path, "content": ""})).unwrap();
        assert!(result.contains("Successfully wrote"));
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_write_blocks_emptying_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("important.txt");
        fs::write(&path, "important content").unwrap();

        let result = run(json!({"path": path.to_str().unwrap(), "content": ""}));
        assert!(matches!(result, Err(ToolError::Validation(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "important content");
    }
}
