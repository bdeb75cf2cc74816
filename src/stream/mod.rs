//! Agent CLI `stream-json` output.
//!
//! Each stdout line is one JSON event. Lines are mapped onto
//! [`AgentEvent`]s: assistant text becomes a chunk, the `result` event becomes
//! the terminal result or failure, and anything that is not JSON is passed
//! through as a chunk.
//!
//! A successful `result` event only reports that the conversation finished.
//! [`judge_result`] reads the agent's own `VERDICT:` line to decide whether
//! the gate actually passed.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::agent::AgentEvent;

/// Events from the agent CLI's stream-json output format
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "assistant")]
    Assistant {
        message: AssistantMessage,
        #[serde(default)]
        session_id: String,
    },

    #[serde(rename = "user")]
    User {},

    #[serde(rename = "result")]
    Result {
        #[serde(default)]
        subtype: String,
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
    },

    #[serde(rename = "system")]
    System {
        #[serde(default)]
        subtype: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "tool_use")]
    ToolUse {
        name: String,
        #[serde(default)]
        input: Value,
    },

    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Other,
}

static VERDICT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[\s*`_>#-]*VERDICT\s*:[\s*`_]*(PASS|FAIL)\b").unwrap());

/// Verdict stated by the agent in its final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// The last `VERDICT: PASS|FAIL` line in `text`, if any.
pub fn find_verdict(text: &str) -> Option<Verdict> {
    VERDICT_REGEX.captures_iter(text).last().map(|caps| {
        if caps[1].eq_ignore_ascii_case("PASS") {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    })
}

/// Turn the final answer of a finished conversation into a terminal event.
///
/// Only an explicit `VERDICT: PASS` passes the gate. A FAIL verdict or a
/// missing verdict line fails it, carrying the agent's text as the reason.
pub fn judge_result(text: &str) -> AgentEvent {
    let text = text.trim();
    match find_verdict(text) {
        Some(Verdict::Pass) => AgentEvent::Result(text.to_string()),
        Some(Verdict::Fail) => AgentEvent::Failure(text.to_string()),
        None if text.is_empty() => {
            AgentEvent::Failure("agent finished without a verdict".to_string())
        }
        None => AgentEvent::Failure(format!("agent finished without a verdict: {}", text)),
    }
}

/// Map one line of agent stdout to an event, if it carries one.
pub fn parse_stream_line(line: &str) -> Option<AgentEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<StreamEvent>(trimmed) {
        Ok(event) => to_agent_event(event),
        // Not a stream event; keep it as plain output
        Err(_) => Some(AgentEvent::Chunk(trimmed.to_string())),
    }
}

fn to_agent_event(event: StreamEvent) -> Option<AgentEvent> {
    match event {
        StreamEvent::Assistant { message, .. } => {
            let mut text = String::new();
            for block in message.content {
                match block {
                    ContentBlock::Text { text: t } => {
                        text.push_str(&t);
                        text.push('\n');
                    }
                    ContentBlock::ToolUse { name, input } => {
                        trace!(tool = %name, input = %input, "Agent tool use");
                    }
                    ContentBlock::Other => {}
                }
            }
            (!text.is_empty()).then_some(AgentEvent::Chunk(text))
        }
        StreamEvent::Result {
            subtype,
            result,
            is_error,
        } => {
            debug!(subtype = %subtype, is_error, "Agent result event");
            if is_error {
                let reason = result
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| format!("agent reported an error ({})", subtype));
                Some(AgentEvent::Failure(reason))
            } else {
                Some(AgentEvent::Result(result.unwrap_or_default()))
            }
        }
        StreamEvent::User { .. } | StreamEvent::System { .. } => None,
    }
}
