//! docs-assistant — a console agent that answers questions about a
//! documentation set.
//!
//! The model drives the conversation; when it needs documentation it calls
//! the `GetDocumentationContext` tool, which runs an external retrieval
//! command and feeds the matching documents back into the dialogue.

pub mod agent;
pub mod config;
pub mod console;
pub mod llm;
pub mod retrieval;
pub mod tools;
pub mod transcript;

#[cfg(test)]
mod testing;
