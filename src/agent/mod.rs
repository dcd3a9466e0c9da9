//! Documentation agent — the part that talks to the model.
//!
//! ## Architecture
//!
//! - `orchestrator`: drives one user turn through model calls and tool calls
//! - `state`: finish reason → next step (Terminal / NeedsTool / Unrecognized)
//! - `prompts`: system and query-extraction prompts

pub mod orchestrator;
pub mod prompts;
pub mod state;

pub use orchestrator::{AgentError, Orchestrator};
