//! Finish-reason state machine for one model response.
//!
//! ```text
//!   complete() ──► Terminal(text)        → append, render, wait for input
//!              ├─► NeedsTool(calls)      → dispatch, append results, complete() again
//!              └─► Unrecognized(reason)  → abort the turn
//! ```

use crate::llm::types::{Completion, FinishReason, ToolCallRequest};

/// What the loop does next with a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Final answer for this user turn.
    Terminal(String),
    /// Run these tools, then ask the model again. `content` is any text the
    /// model sent alongside the calls.
    NeedsTool {
        content: String,
        calls: Vec<ToolCallRequest>,
    },
    /// A finish reason the loop has no handling for.
    Unrecognized(String),
}

impl From<Completion> for Step {
    fn from(completion: Completion) -> Self {
        let content = completion.content.unwrap_or_default();
        match completion.finish_reason {
            FinishReason::Stop => Step::Terminal(content),
            FinishReason::ToolCalls => Step::NeedsTool {
                content,
                calls: completion.tool_calls,
            },
            FinishReason::Unrecognized(reason) => Step::Unrecognized(reason),
        }
    }
}
