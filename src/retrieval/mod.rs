//! Retrieval bridge — turns a user question into a documentation context blob.
//!
//! Three replaceable steps:
//! - `query`: condense the question into a search query (side LLM exchange)
//! - `process`: look up ranked document paths (external process by default)
//! - `documents`: read and join the documents that exist
//!
//! Every step degrades to "nothing found"; `resolve` never fails.

pub mod documents;
pub mod process;
pub mod query;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use process::PathLookup;
use query::QueryExtractor;

/// Concatenated document contents for one query. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContext(String);

impl DocumentContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can produce documentation context for a user question.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn resolve(&self, user_input: &str) -> DocumentContext;
}

/// Default retriever: extract query → look up paths → fetch contents.
pub struct RetrievalBridge {
    extractor: QueryExtractor,
    lookup: Arc<dyn PathLookup>,
    documents_root: Option<PathBuf>,
}

impl RetrievalBridge {
    pub fn new(extractor: QueryExtractor, lookup: Arc<dyn PathLookup>) -> Self {
        Self {
            extractor,
            lookup,
            documents_root: None,
        }
    }

    /// Directory that relative paths from the lookup are resolved against.
    pub fn with_documents_root(mut self, root: Option<PathBuf>) -> Self {
        self.documents_root = root;
        self
    }
}

#[async_trait]
impl Retriever for RetrievalBridge {
    async fn resolve(&self, user_input: &str) -> DocumentContext {
        let query = self.extractor.extract(user_input).await;
        let paths = self.lookup.lookup(&query).await;
        info!(%query, documents = paths.len(), "retrieving documentation");
        let text = documents::fetch_documents(self.documents_root.as_deref(), &paths).await;
        DocumentContext::new(text)
    }
}
