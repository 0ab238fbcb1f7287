//! Agent module - the conversation executor.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user message to the conversation history
//! 2. Call the model with the history and available tool schemas
//! 3. If the model requests tool calls, execute them and feed results back
//! 4. Repeat until the model answers in plain text or the round cap is hit

mod executor;
mod prompt;

pub use executor::{Agent, AgentError};
pub use prompt::build_system_prompt;
