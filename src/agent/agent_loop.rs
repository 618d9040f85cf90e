//! Core agent loop implementation.

use std::sync::Arc;

use thiserror::Error;

use super::invoker::invoke_capability;
use super::memory::BufferMemory;
use super::parser::{parse_step, ParsedStep, ToolLinePairing};
use super::prompt::build_prompt;
use crate::llm::{LlmClient, LlmError};
use crate::tools::{ToolProvider, ToolRegistry};

/// Default model calls allowed per request.
pub const DEFAULT_MAX_STEPS: usize = 6;

/// Appended to the scratchpad when a turn matches neither protocol shape.
pub const PROTOCOL_REMINDER: &str =
    "\n(Reminder: reply with Tool:/Args: lines, or finish with Final:/最终: ...)\n";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Model backend failed: {0}")]
    Backend(#[from] LlmError),
}

/// What a single step did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The turn carried the final answer.
    Answer,
    /// A registered tool ran and produced `observation`.
    Tool { name: String, observation: String },
    /// The turn was malformed or named an unknown tool.
    Reprompt,
}

/// One entry of the execution log.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// 1-based step number
    pub step: usize,
    /// RFC 3339 time the model replied
    pub timestamp: String,
    pub model_output: String,
    pub outcome: StepOutcome,
}

/// Result of one request with its execution log.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub answer: String,
    pub steps: Vec<StepRecord>,
    /// The step budget ran out and `answer` is the last raw model output.
    pub exhausted: bool,
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    memory: BufferMemory,
    max_steps: usize,
    pairing: ToolLinePairing,
}

impl AgentBuilder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            tools: ToolRegistry::new(),
            memory: BufferMemory::default(),
            max_steps: DEFAULT_MAX_STEPS,
            pairing: ToolLinePairing::default(),
        }
    }

    /// Register every provider's tools, skipping excluded providers.
    pub fn providers(mut self, providers: Vec<Box<dyn ToolProvider>>) -> Self {
        self.tools.register_providers(&providers);
        self
    }

    /// Replace the registry wholesale.
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn memory(mut self, memory: BufferMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn memory_capacity(mut self, capacity: usize) -> Self {
        self.memory = BufferMemory::new(capacity);
        self
    }

    /// Step budget per request; at least one step always runs.
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn pairing(mut self, pairing: ToolLinePairing) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            llm: self.llm,
            tools: self.tools,
            memory: self.memory,
            max_steps: self.max_steps,
            pairing: self.pairing,
        }
    }
}

/// The tool-using agent. One conversation at a time per instance.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    memory: BufferMemory,
    max_steps: usize,
    pairing: ToolLinePairing,
}

impl Agent {
    pub fn builder(llm: Arc<dyn LlmClient>) -> AgentBuilder {
        AgentBuilder::new(llm)
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn memory(&self) -> &BufferMemory {
        &self.memory
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Answer `request`, calling tools as the model asks.
    ///
    /// Tool and protocol failures never surface here; they are fed back to the
    /// model. If the step budget runs out, the last raw model output is
    /// returned as the answer.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Backend` if the model call itself fails. Memory is
    /// left untouched in that case.
    pub async fn chat(&mut self, request: &str) -> Result<String, AgentError> {
        Ok(self.chat_with_trace(request).await?.answer)
    }

    /// Like [`Agent::chat`], also returning the per-step execution log.
    pub async fn chat_with_trace(&mut self, request: &str) -> Result<ChatOutcome, AgentError> {
        let mut scratchpad = String::new();
        let mut steps = Vec::new();
        let mut last_output = String::new();

        for step in 1..=self.max_steps {
            tracing::debug!("Agent step {}/{}", step, self.max_steps);

            let prompt = build_prompt(&self.tools, &self.memory, request, &scratchpad);
            let output = self.llm.generate(&prompt).await?.trim().to_string();
            let timestamp = chrono::Utc::now().to_rfc3339();

            let outcome = match parse_step(&output, self.pairing) {
                ParsedStep::Terminal(answer) => {
                    tracing::debug!("Final answer: {}", truncate_for_log(&answer, 200));
                    self.memory.append(request, answer.clone());
                    steps.push(StepRecord {
                        step,
                        timestamp,
                        model_output: output,
                        outcome: StepOutcome::Answer,
                    });
                    return Ok(ChatOutcome {
                        answer,
                        steps,
                        exhausted: false,
                    });
                }
                ParsedStep::ToolCall { name, arguments } => match self.tools.lookup(&name) {
                    Some(capability) => {
                        tracing::info!("Calling tool: {} with args: {}", name, arguments);
                        let observation = invoke_capability(capability, arguments).await;
                        tracing::debug!(
                            "Tool {} returned: {}",
                            name,
                            truncate_for_log(&observation, 1000)
                        );
                        scratchpad.push_str(&format!(
                            "\n{}\nObservation: {}\n",
                            output, observation
                        ));
                        StepOutcome::Tool { name, observation }
                    }
                    None => {
                        tracing::warn!("Model requested unknown tool {}", name);
                        scratchpad.push_str(PROTOCOL_REMINDER);
                        StepOutcome::Reprompt
                    }
                },
                ParsedStep::Malformed => {
                    tracing::warn!(
                        "Model output matched no protocol shape: {}",
                        truncate_for_log(&output, 200)
                    );
                    scratchpad.push_str(PROTOCOL_REMINDER);
                    StepOutcome::Reprompt
                }
            };

            steps.push(StepRecord {
                step,
                timestamp,
                model_output: output.clone(),
                outcome,
            });
            last_output = output;
        }

        tracing::warn!(
            "Max steps ({}) reached without a final answer",
            self.max_steps
        );
        self.memory.append(request, last_output.clone());
        Ok(ChatOutcome {
            answer: last_output,
            steps,
            exhausted: true,
        })
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
