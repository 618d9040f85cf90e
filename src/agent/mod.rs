//! Agent module - the core orchestration loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build a prompt from instructions, tool catalog, memory and scratchpad
//! 2. Call the model
//! 3. If the reply is a tool call, execute it and append the observation
//! 4. Repeat until the reply carries a final answer or the step budget runs out

mod agent_loop;
mod invoker;
mod memory;
mod parser;
mod prompt;

pub use agent_loop::{
    Agent, AgentBuilder, AgentError, ChatOutcome, StepOutcome, StepRecord, DEFAULT_MAX_STEPS,
    PROTOCOL_REMINDER,
};
pub use invoker::{invoke_capability, PARAMETER_ERROR_TAG, RUNTIME_ERROR_TAG};
pub use memory::{BufferMemory, MemoryEntry, DEFAULT_MEMORY_CAPACITY};
pub use parser::{
    extract_final, parse_step, ParsedStep, ToolLinePairing, ARGS_MARKER, TERMINAL_MARKERS,
    TOOL_MARKER,
};
pub use prompt::{build_prompt, EMPTY_MEMORY_PLACEHOLDER, SYSTEM_PROMPT};
