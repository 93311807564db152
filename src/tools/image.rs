use super::{Tool, ToolContext, ToolError};
use crate::security::check_path;
use serde_json::json;

pub struct ImageInfoTool;

impl Tool for ImageInfoTool {
    fn name(&self) -> &str {
        "get_image_info"
    }

    fn description(&self) -> &str {
        "Report the format, dimensions and size of an image file without decoding it fully"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The image file to inspect"
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

        let size = std::fs::metadata(&path)
            .map_err(|e| {
                ToolError::ExecutionFailed(format!("Failed to stat '{}': {}", path.display(), e))
            })?
            .len();

        let reader = image::io::Reader::open(&path)
            .map_err(|e| {
                ToolError::ExecutionFailed(format!("Failed to open '{}': {}", path.display(), e))
            })?
            .with_guessed_format()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to probe format: {}", e)))?;

        let format = reader
            .format()
            .map(|f| format!("{:?}", f))
            .unwrap_or_else(|| "unknown".to_string());
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ToolError::ExecutionFailed(format!("Not a readable image: {}", e)))?;

        Ok(format!(
            "{}: {} {}x{} ({} bytes)",
            path.display(),
            format,
            width,
            height,
            size
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::NoPrompt;
    use std::io::Write;

    fn run(args: serde_json::Value) -> Result<String, ToolError> {
        let mut prompt = NoPrompt;
        let mut ctx = ToolContext {
            auto_confirm: false,
            prompt: &mut prompt,
        };
        ImageInfoTool.execute(args, &mut ctx)
    }

    // Smallest valid 1x1 PNG.
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x62, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_image_info_png() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(TINY_PNG).unwrap();
        let out = run(json!({"path": file.path().to_str().unwrap()})).unwrap();
        assert!(out.contains("Png"));
        assert!(out.contains("1x1"));
    }

    #[test]
    fn test_image_info_not_an_image() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"plain text, not pixels").unwrap();
        let result = run(json!({"path": file.path().to_str().unwrap()}));
        assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
    }

    #[test]
    fn test_image_info_missing_file() {
        let result = run(json!({"path": "/tmp/palisade_missing.png"}));
        assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
    }

    #[test]
    fn test_image_info_sensitive_path_rejected() {
        let result = run(json!({"path": "/etc/shadow"}));
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }
}
