use super::{Tool, ToolContext, ToolError};
use crate::security::check_path;
use serde_json::json;

const MAX_JSON_BYTES: u64 = 1024 * 1024;
const DEFAULT_CSV_ROWS: usize = 100;

pub struct ParseJsonTool;

impl Tool for ParseJsonTool {
    fn name(&self) -> &str {
        "parse_json"
    }

    fn description(&self) -> &str {
        "Parse a JSON file (1 MB limit) and optionally extract a value by dot-separated query"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The JSON file to parse"
                },
                "query": {
                    "type": "string",
                    "description": "Dot-separated path into the document, e.g. 'items.0.name' (optional)"
                }
            },
            "required": ["path"]
        })
    }

    fn execute(&self, args: serde_json::Value, _ctx: &mut ToolContext) -> Result<String, ToolError> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'path' argument".to_string()))?;
        let query = args["query"].as_str();

        let path = check_path(path, None).map_err(ToolError::Validation)?;

        let size = std::fs::metadata(&path)
            .map_err(|e| {
                ToolError::ExecutionFailed(format!("Failed to stat '{}': {}", path.display(), e))
            })?
            .len();
        if size > MAX_JSON_BYTES {
            return Err(ToolError::Validation(format!(
                "JSON file too large: {} bytes (limit {})",
                size, MAX_JSON_BYTES
            )));
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ToolError::ExecutionFailed(format!("Invalid JSON: {}", e)))?;

        let selected = match query {
            Some(q) if !q.trim().is_empty() => query_value(&value, q)?,
            _ => &value,
        };

        serde_json::to_string_pretty(selected)
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to render JSON: {}", e)))
    }
}

/// Walk a dot-separated query: object keys by name, array elements by index.
fn query_value<'a>(
    mut value: &'a serde_json::Value,
    query: &str,
) -> Result<&'a serde_json::Value, ToolError> {
    for part in query.split('.') {
        value = match value {
            serde_json::Value::Object(map) => map.get(part).ok_or_else(|| {
                ToolError::ExecutionFailed(format!("No such key: '{}'", part))
            })?,
            serde_json::Value::Array(items) => {
                let index: usize = part.parse().map_err(|_| {
                    ToolError::ExecutionFailed(format!(
                        "'{}' is not a valid array index",
                        part
                    ))
                })?;
                items.get(index).ok_or_else(|| {
                    ToolError::ExecutionFailed(format!("Index {} out of bounds", index))
                })?
            }
            _ => {
                return Err(ToolError::ExecutionFailed(format!(
                    "Cannot descend into a scalar with '{}'",
                    part
                )))
            }
        };
    }
    Ok(value)
}

pub struct ParseCsvTool;

impl Tool for ParseCsvTool {
    fn name(&self) -> &str {
        "parse_csv"
    }

    fn description(&self) -> &str {
        "Parse a CSV file and return its headers and rows"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The CSV file to parse"
                },
                "delimiter": {
                    "type": "string",
                    "description": "Field delimiter, a single character (default: ',')"
                },
                "max_rows": {
                    "type": "integer",
                    "description": "Maximum rows to return (default: 100)"
                }
            },
            "required": ["path"]
        })
    }

    fn execute(&self, args: serde_json::Value, _ctx: &mut ToolContext) -> Result<String, ToolError> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'path' argument".to_string()))?;
        let delimiter = args["delimiter"].as_str().unwrap_or(",");
        let max_rows = args["max_rows"].as_u64().unwrap_or(DEFAULT_CSV_ROWS as u64) as usize;

        if delimiter.len() != 1 || !delimiter.is_ascii() {
            return Err(ToolError::InvalidArguments(
                "delimiter must be a single ASCII character".to_string(),
            ));
        }

        let path = check_path(path, None).map_err(ToolError::Validation)?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter.as_bytes()[0])
            .flexible(true)
            .from_path(&path)
            .map_err(|e| {
                ToolError::ExecutionFailed(format!("Failed to open '{}': {}", path.display(), e))
            })?;

        let headers = reader
            .headers()
            .map_err(|e| ToolError::ExecutionFailed(format!("Invalid CSV: {}", e)))?
            .clone();

        let mut output = format!("Columns: {}\n", headers.iter().collect::<Vec<_>>().join(", "));
        let mut shown = 0usize;
        let mut total = 0usize;
        for record in reader.records() {
            let record =
                record.map_err(|e| ToolError::ExecutionFailed(format!("Invalid CSV: {}", e)))?;
            total += 1;
            if shown < max_rows {
                output.push_str(&record.iter().collect::<Vec<_>>().join(", "));
                output.push('\n');
                shown += 1;
            }
        }
        output.push_str(&format!("({} rows total, {} shown)\n", total, shown));
        Ok(output)
    }
}
