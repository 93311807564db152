pub mod prompt;

use crate::llm::{LlmProvider, Message};
use crate::security::{sanitize_for_log, ConfirmPrompt};
use crate::tools::{ToolContext, ToolRegistry};
use colored::Colorize;

const MAX_TOOL_OUTPUT_CHARS: usize = 50_000;

pub struct Agent {
    pub llm: Box<dyn LlmProvider>,
    pub tools: ToolRegistry,
    pub memory: Vec<Message>,
    pub config: AgentConfig,
}

pub struct AgentConfig {
    pub max_iterations: usize,
    pub auto_confirm: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            auto_confirm: false,
        }
    }
}

impl Agent {
    pub fn new(llm: Box<dyn LlmProvider>, tools: ToolRegistry, config: AgentConfig) -> Self {
        let memory = vec![Message::system(&prompt::system_prompt())];
        Self {
            llm,
            tools,
            memory,
            config,
        }
    }

    /// Run one user turn: send the conversation to the model, execute any
    /// tool calls it makes (through the confirmation prompt), feed the
    /// results back, and repeat until the model answers in plain text or
    /// the iteration budget runs out.
    pub fn process_message(
        &mut self,
        user_input: &str,
        confirm: &mut dyn ConfirmPrompt,
    ) -> String {
        self.memory.push(Message::user(user_input));

        let tool_defs = self.tools.definitions();

        for _iteration in 0..self.config.max_iterations {
            let response = match self.llm.chat(&self.memory, &tool_defs) {
                Ok(resp) => resp,
                Err(e) => return format!("Error: {}", e),
            };

            // If no tool calls, return the content
            if response.tool_calls.is_empty() {
                let content = response.content.unwrap_or_default();
                self.memory.push(Message::assistant(&content));
                return content;
            }

            let response_content = response.content;
            let tool_calls = response.tool_calls;

            self.memory
                .push(Message::assistant_with_tool_calls(tool_calls.clone()));

            for tool_call in &tool_calls {
                eprintln!(
                    "  {} {}",
                    format!("[tool: {}]", tool_call.name).cyan(),
                    tool_call.arguments.to_string().dimmed()
                );
                tracing::info!(
                    tool = %tool_call.name,
                    args = %sanitize_for_log(&tool_call.arguments.to_string(), 500),
                    "tool call"
                );

                let result = if let Some(tool) = self.tools.get(&tool_call.name) {
                    let mut ctx = ToolContext {
                        auto_confirm: self.config.auto_confirm,
                        prompt: &mut *confirm,
                    };
                    match tool.execute(tool_call.arguments.clone(), &mut ctx) {
                        Ok(output) => output,
                        Err(e) => {
                            tracing::warn!(tool = %tool_call.name, error = %e, "tool failed");
                            format!("Tool error: {}", e)
                        }
                    }
                } else {
                    format!("Unknown tool: {}", tool_call.name)
                };

                let result = if result.len() > MAX_TOOL_OUTPUT_CHARS {
                    let mut end = MAX_TOOL_OUTPUT_CHARS;
                    while !result.is_char_boundary(end) {
                        end -= 1;
                    }
                    let mut truncated = String::with_capacity(end + 40);
                    truncated.push_str(&result[..end]);
                    truncated.push_str("\n...[output truncated to 50KB]");
                    truncated
                } else {
                    result
                };

                self.memory
                    .push(Message::tool_result(&tool_call.id, &result));
            }

            // Content alongside tool calls is shown by the caller, not kept in
            // memory; the model would repeat itself otherwise.
            let _ = response_content;
        }

        "Max iterations reached. The agent could not complete the task.".to_string()
    }
}
