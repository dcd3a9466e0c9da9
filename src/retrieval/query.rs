//! Search-query extraction — a throwaway side conversation with the model.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::prompts::QUERY_EXTRACTION_PROMPT;
use crate::llm::ChatModel;
use crate::transcript::Message;

/// Condenses a user question into one technical search query.
pub struct QueryExtractor {
    model: Arc<dyn ChatModel>,
}

impl QueryExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Ask the model for a search query. Falls back to the trimmed input when
    /// the exchange fails or comes back empty.
    pub async fn extract(&self, user_input: &str) -> String {
        let messages = vec![
            Message::system(QUERY_EXTRACTION_PROMPT),
            Message::user(user_input),
        ];

        match self.model.complete(messages, &[]).await {
            Ok(completion) => {
                let query = completion.content.unwrap_or_default().trim().to_string();
                if query.is_empty() {
                    warn!("query extraction returned no text, searching with raw input");
                    user_input.trim().to_string()
                } else {
                    debug!(%query, "extracted search query");
                    query
                }
            }
            Err(e) => {
                warn!("query extraction failed ({e}), searching with raw input");
                user_input.trim().to_string()
            }
        }
    }
}
