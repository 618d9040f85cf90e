//! Parsing of model turns into answers or tool calls.
//!
//! A turn is terminal if it contains any of [`TERMINAL_MARKERS`]; the markers
//! are tried in priority order and the text after the *last* occurrence of the
//! chosen marker is the answer. Otherwise the turn is scanned line by line for
//! a `Tool:` line and an `Args:` line.

use serde_json::Value;

/// Terminal markers, highest priority first.
pub const TERMINAL_MARKERS: [&str; 2] = ["最终:", "Final:"];

pub const TOOL_MARKER: &str = "Tool:";
pub const ARGS_MARKER: &str = "Args:";

/// One parsed model turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStep {
    /// The model produced its final answer.
    Terminal(String),
    /// The model asked for a tool. `arguments` is the decoded `Args:` payload,
    /// or an empty object when it was not valid JSON.
    ToolCall { name: String, arguments: Value },
    /// Neither shape matched.
    Malformed,
}

/// How `Tool:` and `Args:` lines are paired when a turn contains several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolLinePairing {
    /// The last `Tool:` line and the last `Args:` line win independently,
    /// even if they came from different attempts in the same turn.
    #[default]
    LastLineWinsPerField,
    /// The last `Tool:` line is paired with the first `Args:` line after it.
    SameBlock,
}

/// Classify one model turn.
pub fn parse_step(text: &str, pairing: ToolLinePairing) -> ParsedStep {
    if let Some(answer) = extract_final(text) {
        return ParsedStep::Terminal(answer);
    }

    match find_tool_call(text, pairing) {
        Some((name, args)) if !name.is_empty() => ParsedStep::ToolCall {
            name: name.to_string(),
            arguments: parse_arguments(args),
        },
        _ => ParsedStep::Malformed,
    }
}

/// Text after the last occurrence of the highest-priority marker present.
pub fn extract_final(text: &str) -> Option<String> {
    TERMINAL_MARKERS.iter().find_map(|marker| {
        text.rfind(marker)
            .map(|at| text[at + marker.len()..].trim().to_string())
    })
}

/// Marker payloads for the tool name and arguments, both trimmed.
fn find_tool_call(text: &str, pairing: ToolLinePairing) -> Option<(&str, &str)> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    match pairing {
        ToolLinePairing::LastLineWinsPerField => {
            let tool = lines.iter().rev().find_map(|l| l.strip_prefix(TOOL_MARKER))?;
            let args = lines.iter().rev().find_map(|l| l.strip_prefix(ARGS_MARKER))?;
            Some((tool.trim(), args.trim()))
        }
        ToolLinePairing::SameBlock => {
            let tool_at = lines.iter().rposition(|l| l.starts_with(TOOL_MARKER))?;
            let tool = lines[tool_at].strip_prefix(TOOL_MARKER)?;
            let args = lines[tool_at + 1..]
                .iter()
                .find_map(|l| l.strip_prefix(ARGS_MARKER))?;
            Some((tool.trim(), args.trim()))
        }
    }
}

fn parse_arguments(raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Args line is not valid JSON ({}), using empty arguments", e);
            Value::Object(Default::default())
        }
    }
}
