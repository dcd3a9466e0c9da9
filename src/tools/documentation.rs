//! `GetDocumentationContext` — the retrieval tool offered to the model.

use std::sync::Arc;

use async_trait::async_trait;

use super::{required_str, Tool, ToolError};
use crate::retrieval::Retriever;

pub const GET_DOCUMENTATION_CONTEXT: &str = "GetDocumentationContext";

/// Looks up documentation relevant to the user's question.
pub struct DocumentationTool {
    retriever: Arc<dyn Retriever>,
}

impl DocumentationTool {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for DocumentationTool {
    fn name(&self) -> &str {
        GET_DOCUMENTATION_CONTEXT
    }

    fn description(&self) -> &str {
        "Get documentation context relevant to the user's question. \
         Call this before answering any question about the API."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "userInput": {
                    "type": "string",
                    "description": "The user's question, verbatim."
                }
            },
            "required": ["userInput"]
        })
    }

    async fn call(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let user_input = required_str(self.name(), arguments, "userInput")?;
        Ok(self.retriever.resolve(user_input).await.into_string())
    }
}
