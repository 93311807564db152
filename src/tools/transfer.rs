use super::{Tool, ToolContext, ToolError};
use crate::security::{check_path, sanitize_for_log};
use serde_json::json;
use suppaftp::FtpStream;

pub struct FtpUploadTool;

impl Tool for FtpUploadTool {
    fn name(&self) -> &str {
        "upload_ftp"
    }

    fn description(&self) -> &str {
        "Upload a local file to an FTP server. Credentials fall back to the FTP_USER and FTP_PASS environment variables, then to anonymous login."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The local file to upload"
                },
                "host": {
                    "type": "string",
                    "description": "The FTP server hostname"
                },
                "remote_path": {
                    "type": "string",
                    "description": "The destination path on the server"
                },
                "port": {
                    "type": "integer",
                    "description": "The FTP port (default: 21)"
                },
                "username": {
                    "type": "string",
                    "description": "The FTP username (optional)"
                },
                "password": {
                    "type": "string",
                    "description": "The FTP password (optional)"
                }
            },
            "required": ["path", "host", "remote_path"]
        })
    }

    fn execute(&self, args: serde_json::Value, ctx: &mut ToolContext) -> Result<String, ToolError> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'path' argument".to_string()))?;
        let host = args["host"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'host' argument".to_string()))?;
        let remote_path = args["remote_path"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("missing 'remote_path' argument".to_string())
        })?;
        let port = args["port"].as_u64().unwrap_or(21);

        let username = args["username"]
            .as_str()
            .map(str::to_string)
            .or_else(|| std::env::var("FTP_USER").ok())
            .unwrap_or_else(|| "anonymous".to_string());
        let password = args["password"]
            .as_str()
            .map(str::to_string)
            .or_else(|| std::env::var("FTP_PASS").ok())
            .unwrap_or_default();

        let path = check_path(path, None).map_err(ToolError::Validation)?;
        if !path.is_file() {
            return Err(ToolError::ExecutionFailed(format!(
                "'{}' is not a file",
                path.display()
            )));
        }

        ctx.confirm(&format!(
            "Upload '{}' to ftp://{}:{}{}",
            path.display(),
            host,
            port,
            remote_path
        ))?;

        tracing::info!(
            target = %sanitize_for_log(&format!("ftp://{}:{}@{}", username, password, host), 200),
            "ftp upload starting"
        );

        let mut ftp = FtpStream::connect(format!("{}:{}", host, port)).map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to connect to '{}': {}", host, e))
        })?;
        ftp.login(&username, &password)
            .map_err(|e| ToolError::ExecutionFailed(format!("FTP login failed: {}", e)))?;

        let mut file = std::fs::File::open(&path).map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to open '{}': {}", path.display(), e))
        })?;
        let written = ftp
            .put_file(remote_path, &mut file)
            .map_err(|e| ToolError::ExecutionFailed(format!("FTP upload failed: {}", e)))?;
        let _ = ftp.quit();

        Ok(format!(
            "Uploaded {} bytes from '{}' to '{}' on {}",
            written,
            path.display(),
            remote_path,
            host
        ))
    }
}
