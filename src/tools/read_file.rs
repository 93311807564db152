use super::{Tool, ToolContext, ToolError};
use crate::security::check_path;
use serde_json::json;

pub struct ReadFileTool;

impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the given path"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    fn execute(&self, args: serde_json::Value, _ctx: &mut ToolContext) -> Result<String, ToolError> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'path' argument".to_string()))?;

        let path = check_path(path, None).map_err(ToolError::Validation)?;

        std::fs::read_to_string(&path).map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to read '{}': {}", path.display(), e))
        })
    }
}
