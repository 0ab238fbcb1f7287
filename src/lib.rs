//! # toolloop
//!
//! An interactive LLM assistant that runs local tools in a loop.
//!
//! This library provides:
//! - A registry of typed, schema-described local tools
//! - A bounded conversation loop that lets the model call those tools
//! - A resource store for artifacts (images, data files) the tools produce
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Read a user message, append it to the conversation history
//! 2. Call the model with the history and available tool schemas
//! 3. If the model requests tool calls, execute them and feed results back
//! 4. Repeat until the model answers in plain text or the round cap is hit
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolloop::{config::Config, agent::Agent};
//!
//! let config = Config::from_env()?;
//! let mut agent = Agent::new(config)?;
//! let reply = agent.run_turn("plot a sine wave for me").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod resources;
pub mod tools;

pub use config::Config;
