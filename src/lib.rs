//! # Tool Agent
//!
//! A tool-augmented text-generation controller.
//!
//! This library provides:
//! - A bounded agent loop that alternates model calls and tool invocations
//! - A capability registry that tool providers register into
//! - A fixed-capacity conversation memory shared across turns
//! - OpenAI-compatible and local (Ollama) model backends
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern over a plain-text protocol:
//! 1. Compose a prompt from the instructions, tool catalog, memory and scratchpad
//! 2. Call the model and parse its reply
//! 3. On `Final:` return the answer; on `Tool:`/`Args:` run the tool and append
//!    the observation to the scratchpad
//! 4. Repeat until an answer is produced or the step budget runs out
//!
//! ## Example
//!
//! ```rust,ignore
//! use tool_agent::{agent::AgentBuilder, config::Config, llm, tools};
//!
//! let config = Config::load(None)?;
//! let backend = llm::build_client(&config.llm)?;
//! let mut agent = AgentBuilder::new(backend)
//!     .providers(tools::builtin_providers(&config.workspace_path))
//!     .max_steps(config.max_steps)
//!     .build();
//! let answer = agent.chat("What is sqrt(2) * 3?").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
