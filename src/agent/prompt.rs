//! Prompt templates for the agent.

use super::memory::BufferMemory;
use crate::tools::ToolRegistry;

/// Fixed instructions describing the Tool/Args and Final protocol.
pub const SYSTEM_PROMPT: &str = r#"You are a careful assistant. On each turn you may either:
1) answer the user directly, or
2) when you need outside information or a computation, call a tool using exactly this format:

Thought: <brief reasoning>
Tool: <tool name>
Args: {"k": "v"}

The tool result comes back as:
Observation: <tool output>

You may call tools several times. When you have the final answer, finish with:
Final: <your answer to the user>
or:
最终: <your answer to the user>

Strict rules:
- Each turn contains either Tool/Args or Final/最终, never both.
- Args must be valid single-line JSON.
- Only use tool names from the list of available tools.

Example 1: create a file and write text
Thought: I need to create the file and write the text
Tool: write_local_file
Args: {"path": "notes/hello.txt", "content": "hello world", "as_text": true, "append": false}

(after the Observation arrives)
Thought: the file is written, confirm to the user
Final: Created notes/hello.txt and wrote 11 characters.

Example 2: read the first 100 bytes of a text file
Thought: I need to read the text
Tool: read_local_file
Args: {"path": "notes/hello.txt", "as_text": true, "start": 0, "max_bytes": 100}

(after the Observation arrives)
Final: Read succeeded, the excerpt is shown above."#;

/// Shown in place of the transcript when memory is empty.
pub const EMPTY_MEMORY_PLACEHOLDER: &str = "(empty)";

/// Build the full prompt for one model call.
pub fn build_prompt(
    tools: &ToolRegistry,
    memory: &BufferMemory,
    request: &str,
    scratchpad: &str,
) -> String {
    let tool_descriptions = tools.render_catalog();
    let memory_text = if memory.is_empty() {
        EMPTY_MEMORY_PLACEHOLDER.to_string()
    } else {
        memory.as_text()
    };

    format!(
        "{system}\n\n\
         Available tools:\n{tool_descriptions}\n\n\
         Conversation memory:\n{memory_text}\n\n\
         Current user request: {request}\n\n\
         Follow the format above strictly.\n{scratchpad}",
        system = SYSTEM_PROMPT,
        tool_descriptions = tool_descriptions,
        memory_text = memory_text,
        request = request,
        scratchpad = scratchpad
    )
}
