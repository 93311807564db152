use super::{LlmError, LlmProvider, LlmResponse, Message, ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Blocking client for the Mistral chat-completions API. The key lives here,
/// injected at construction; nothing global.
pub struct MistralClient {
    pub base_url: String,
    pub model: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

// --- API request/response types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: ChatFunctionCall,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatFunctionCall {
    name: String,
    arguments: String, // the API sends arguments as a JSON string
}

#[derive(Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunctionDef,
}

#[derive(Serialize)]
struct ChatFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

// --- Implementation ---

impl MistralClient {
    pub fn new(base_url: &str, model: &str, api_key: String) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::ConnectionError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client,
        })
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let mut msg = ChatMessage {
                    role: m.role.to_string(),
                    content: if m.content.is_empty() && !m.tool_calls.is_empty() {
                        None
                    } else {
                        Some(m.content.clone())
                    },
                    tool_calls: None,
                    tool_call_id: m.tool_call_id.clone(),
                };

                if !m.tool_calls.is_empty() {
                    msg.tool_calls = Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ChatToolCall {
                                id: tc.id.clone(),
                                call_type: "function".to_string(),
                                function: ChatFunctionCall {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.to_string(),
                                },
                            })
                            .collect(),
                    );
                }

                msg
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
        tools
            .iter()
            .map(|t| ChatTool {
                tool_type: "function".to_string(),
                function: ChatFunctionDef {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

impl LlmProvider for MistralClient {
    fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(messages),
            tools: Self::convert_tools(tools),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::ConnectionError(format!(
                        "Cannot connect to the API at {}",
                        self.base_url
                    ))
                } else if e.is_timeout() {
                    LlmError::RequestError("Request timed out".to_string())
                } else {
                    LlmError::RequestError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotFound(format!(
                "Model '{}' not found at {}",
                self.model, self.base_url
            )));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::RequestError(
                "Authentication failed. Check your api_key in config or MISTRAL_API_KEY."
                    .to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::RequestError(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let resp_body: ChatResponse = response
            .json()
            .map_err(|e| LlmError::ParseError(format!("Failed to parse response: {}", e)))?;

        let choice = resp_body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError("No choices in response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments: serde_json::Value = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
                ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect::<Vec<_>>();

        let content = choice.message.content.filter(|c| !c.is_empty());

        Ok(LlmResponse {
            content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_stores_config() {
        let client =
            MistralClient::new("https://api.mistral.ai", "mistral-small", "sk-test".to_string())
                .unwrap();
        assert_eq!(client.base_url, "https://api.mistral.ai");
        assert_eq!(client.model, "mistral-small");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client =
            MistralClient::new("https://api.mistral.ai/", "m", "k".to_string()).unwrap();
        assert_eq!(client.base_url, "https://api.mistral.ai");
    }

    #[test]
    fn test_convert_user_message() {
        let messages = vec![Message::user("Hello")];
        let converted = MistralClient::convert_messages(&messages);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "user");
        assert_eq!(converted[0].content, Some("Hello".to_string()));
        assert!(converted[0].tool_calls.is_none());
    }

    #[test]
    fn test_convert_assistant_with_tool_calls() {
        let tc = vec![ToolCall {
            id: "call_0".to_string(),
            name: "read_file".to_string(),
            arguments: json!({"path": "/tmp/test.txt"}),
        }];
        let messages = vec![Message::assistant_with_tool_calls(tc)];
        let converted = MistralClient::convert_messages(&messages);
        assert_eq!(converted[0].role, "assistant");
        assert!(converted[0].content.is_none());
        let tool_calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].function.name, "read_file");
        assert_eq!(
            tool_calls[0].function.arguments,
            "{\"path\":\"/tmp/test.txt\"}"
        );
    }

    #[test]
    fn test_convert_tool_result_message() {
        let messages = vec![Message::tool_result("call_0", "file contents")];
        let converted = MistralClient::convert_messages(&messages);
        assert_eq!(converted[0].role, "tool");
        assert_eq!(converted[0].content, Some("file contents".to_string()));
        assert_eq!(converted[0].tool_call_id, Some("call_0".to_string()));
    }

    #[test]
    fn test_convert_tools() {
        let tools = vec![ToolDefinition {
            name: "read_file".to_string(),
            description: "Read a file".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"]
            }),
        }];
        let converted = MistralClient::convert_tools(&tools);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].tool_type, "function");
        assert_eq!(converted[0].function.name, "read_file");
    }

    #[test]
    fn test_response_parse_with_tool_calls() {
        let json_val = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc123",
                        "type": "function",
                        "function": {
                            "name": "read_file",
                            "arguments": "{\"path\":\"/tmp/test.txt\"}"
                        }
                    }]
                }
            }]
        });
        let resp: ChatResponse = serde_json::from_value(json_val).unwrap();
        let tool_calls = resp.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].id, "call_abc123");
        let args: serde_json::Value =
            serde_json::from_str(&tool_calls[0].function.arguments).unwrap();
        assert_eq!(args["path"], "/tmp/test.txt");
    }

    #[test]
    fn test_request_serialization_skips_empty_tools() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some("Hello".to_string()),
                tool_calls: None,
                tool_call_id: None,
            }],
            tools: vec![],
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(parsed["model"], "m");
        assert!(parsed.get("tools").is_none());
    }

    #[test]
    fn test_tool_call_arguments_invalid_json_fallback() {
        let parsed: serde_json::Value = serde_json::from_str("invalid json {{{")
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
        assert!(parsed.is_object());
        assert_eq!(parsed.as_object().unwrap().len(), 0);
    }
}
