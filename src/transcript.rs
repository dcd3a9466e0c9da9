//! Conversation transcript — append-only dialogue state for one session.
//!
//! A user turn is staged through [`Turn`] and only lands in the transcript
//! once it reaches a final answer, so an aborted turn leaves no dangling
//! tool call behind.

use crate::llm::types::ToolCallRequest;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Set on `Tool` messages only: the call this result answers.
    pub tool_call_id: Option<String>,
    /// Set on `Assistant` messages that requested tools.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An assistant turn that asks for tools to be run.
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// A tool result answering `call_id`.
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }
}

/// Transcript invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("tool message has no tool_call_id")]
    MissingToolCallId,

    #[error("{0:?} message must not carry a tool_call_id")]
    UnexpectedToolCallId(Role),

    #[error("{0:?} message must not carry tool calls")]
    UnexpectedToolCalls(Role),

    #[error("tool result '{0}' does not answer a pending tool call")]
    UnpairedToolResult(String),

    #[error("tool call '{0}' has no result")]
    DanglingToolCall(String),
}

/// Ordered, append-only conversation history. The first message is always the
/// system prompt.
#[derive(Debug)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Append a message. Only role well-formedness is checked here; pairing is
    /// checked when a staged turn commits.
    pub fn append(&mut self, message: Message) -> Result<(), TranscriptError> {
        check_well_formed(&message)?;
        self.messages.push(message);
        Ok(())
    }

    /// The full ordered history.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Start staging a user turn.
    pub fn begin_turn(&mut self) -> Turn<'_> {
        Turn {
            transcript: self,
            staged: Vec::new(),
        }
    }
}

fn check_well_formed(message: &Message) -> Result<(), TranscriptError> {
    match message.role {
        Role::Tool if message.tool_call_id.is_none() => Err(TranscriptError::MissingToolCallId),
        Role::Tool => Ok(()),
        role if message.tool_call_id.is_some() => Err(TranscriptError::UnexpectedToolCallId(role)),
        Role::Assistant => Ok(()),
        role if !message.tool_calls.is_empty() => Err(TranscriptError::UnexpectedToolCalls(role)),
        _ => Ok(()),
    }
}

/// Every tool call must be answered, in order, by the tool messages that
/// immediately follow it.
fn check_pairing(messages: &[Message]) -> Result<(), TranscriptError> {
    let mut pending: std::collections::VecDeque<&str> = Default::default();
    for msg in messages {
        match msg.role {
            Role::Tool => {
                let id = msg.tool_call_id.as_deref().unwrap_or_default();
                if pending.pop_front() != Some(id) {
                    return Err(TranscriptError::UnpairedToolResult(id.to_string()));
                }
            }
            _ => {
                if let Some(id) = pending.front() {
                    return Err(TranscriptError::DanglingToolCall(id.to_string()));
                }
                pending.extend(msg.tool_calls.iter().map(|c| c.id.as_str()));
            }
        }
    }
    match pending.front() {
        Some(id) => Err(TranscriptError::DanglingToolCall(id.to_string())),
        None => Ok(()),
    }
}

/// Messages of an in-flight user turn, staged on top of the transcript.
///
/// Dropping a `Turn` without calling [`Turn::commit`] discards everything it
/// staged.
#[derive(Debug)]
pub struct Turn<'a> {
    transcript: &'a mut Transcript,
    staged: Vec<Message>,
}

impl Turn<'_> {
    pub fn push(&mut self, message: Message) -> Result<(), TranscriptError> {
        check_well_formed(&message)?;
        self.staged.push(message);
        Ok(())
    }

    /// Committed history followed by the staged messages, as sent to the model.
    pub fn messages(&self) -> Vec<Message> {
        self.transcript
            .snapshot()
            .iter()
            .chain(self.staged.iter())
            .cloned()
            .collect()
    }

    /// Append the staged messages to the transcript, in order.
    pub fn commit(self) -> Result<(), TranscriptError> {
        check_pairing(&self.staged)?;
        for message in self.staged {
            self.transcript.append(message)?;
        }
        Ok(())
    }
}
