//! Prompt templates.
//!
//! - SYSTEM_PROMPT: first message of every transcript (overridable in config)
//! - QUERY_EXTRACTION_PROMPT: instruction for the stateless search-query exchange

/// Default system prompt for the documentation assistant.
pub const SYSTEM_PROMPT: &str = "\
You are a coding assistant to a developer at Open Dental. You will answer questions \
the developer may have about the API. Only answer with information based on the \
documentation you have access to. Use the GetDocumentationContext tool to look up \
documentation before answering.";

/// Instruction for condensing a user question into a single search query.
pub const QUERY_EXTRACTION_PROMPT: &str = "\
Extract a condensed, technical search query from the input. \
Output exactly one query and nothing else.";

/// Build the system prompt, appending the names of the tools on offer.
pub fn build_system_prompt(base: &str, tool_names: &[String]) -> String {
    let mut prompt = base.to_string();

    if !tool_names.is_empty() {
        prompt.push_str("\n\nAvailable tools: ");
        prompt.push_str(&tool_names.join(", "));
    }

    prompt
}
