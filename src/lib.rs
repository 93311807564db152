pub mod agent;
pub mod config;
pub mod llm;
pub mod logging;
pub mod security;
pub mod tools;
