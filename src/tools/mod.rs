pub mod data;
pub mod fs_ops;
pub mod image;
pub mod network;
pub mod read_file;
pub mod shell;
pub mod transfer;
pub mod write_file;

use crate::llm::ToolDefinition;
use crate::security::{authorize, confirm_mutation, ConfirmPrompt, GateDecision, RiskVerdict};
use std::fmt;

#[derive(Debug)]
pub enum ToolError {
    /// Malformed or missing arguments from the model.
    InvalidArguments(String),
    /// Refused by the risk policy; no override path exists.
    PolicyBlock { category: String, reason: String },
    /// The user declined the action. Benign, not an execution failure.
    Declined,
    /// Input rejected by a validator (fail closed).
    Validation(String),
    /// The command exceeded its time budget and was killed.
    Timeout(u64),
    ExecutionFailed(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            ToolError::PolicyBlock { category, reason } => {
                write!(f, "Blocked by policy [{}]: {}", category, reason)
            }
            ToolError::Declined => write!(f, "Declined by user"),
            ToolError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            ToolError::Timeout(secs) => write!(f, "Command timed out after {} seconds", secs),
            ToolError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
        }
    }
}

impl std::error::Error for ToolError {}

/// Per-invocation state handed to every tool: confirmation policy plus the
/// prompt to ask through. No tool talks to a terminal on its own.
pub struct ToolContext<'a> {
    pub auto_confirm: bool,
    pub prompt: &'a mut dyn ConfirmPrompt,
}

impl ToolContext<'_> {
    /// Run a command verdict through the action gate.
    pub fn authorize(&mut self, verdict: &RiskVerdict) -> Result<(), ToolError> {
        decision_to_result(authorize(verdict, self.auto_confirm, self.prompt))
    }

    /// Confirm a mutating action that carries no command verdict.
    pub fn confirm(&mut self, description: &str) -> Result<(), ToolError> {
        decision_to_result(confirm_mutation(
            description,
            self.auto_confirm,
            self.prompt,
        ))
    }
}

fn decision_to_result(decision: GateDecision) -> Result<(), ToolError> {
    match decision {
        GateDecision::Proceed => Ok(()),
        GateDecision::Declined => Err(ToolError::Declined),
        GateDecision::Blocked { category, reason } => {
            Err(ToolError::PolicyBlock { category, reason })
        }
    }
}

pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> serde_json::Value;
    fn execute(&self, args: serde_json::Value, ctx: &mut ToolContext) -> Result<String, ToolError>;
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn list(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(|t| t.as_ref()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a ToolRegistry with all built-in tools registered.
pub fn default_registry() -> ToolRegistry {
    registry_with_command_timeout(shell::DEFAULT_COMMAND_TIMEOUT_SECS)
}

/// The standard tool set, with a configurable shell timeout.
pub fn registry_with_command_timeout(timeout_secs: u64) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(shell::ExecuteBashTool::with_timeout(timeout_secs)));
    registry.register(Box::new(read_file::ReadFileTool));
    registry.register(Box::new(write_file::WriteFileTool));
    registry.register(Box::new(fs_ops::RenameFileTool));
    registry.register(Box::new(fs_ops::CopyFileTool));
    registry.register(Box::new(fs_ops::MoveFileTool));
    registry.register(Box::new(network::FetchUrlTool));
    registry.register(Box::new(network::DownloadFileTool));
    registry.register(Box::new(network::SearchWebTool));
    registry.register(Box::new(data::ParseJsonTool));
    registry.register(Box::new(data::ParseCsvTool));
    registry.register(Box::new(image::ImageInfoTool));
    registry.register(Box::new(transfer::FtpUploadTool));
    registry
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Prompt that approves everything, for tests of the happy path.
    pub struct ApproveAll;

    impl ConfirmPrompt for ApproveAll {
        fn confirm(&mut self, _message: &str) -> bool {
            true
        }
    }

    /// Prompt that declines everything.
    pub struct DenyAll;

    impl ConfirmPrompt for DenyAll {
        fn confirm(&mut self, _message: &str) -> bool {
            false
        }
    }

    /// Prompt that panics if reached, for paths that must never ask.
    pub struct NoPrompt;

    impl ConfirmPrompt for NoPrompt {
        fn confirm(&mut self, message: &str) -> bool {
            panic!("unexpected confirmation prompt: {}", message);
        }
    }
}
