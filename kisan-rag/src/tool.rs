//! Government scheme retrieval tool for the conversational agent.
//!
//! [`RetrievalTool`] wraps the [`RagService`] behind a function-call
//! surface that always returns text: formatted matches, a "nothing found"
//! hint, or a message steering the agent to web search when the store is
//! unavailable.
//!
//! # Example
//!
//! ```rust,ignore
//! use kisan_rag::{RetrievalTool, StoreAvailability};
//!
//! let tool = RetrievalTool::new(availability, "government_schemes");
//! let text = tool.retrieve("PM Kisan eligibility", 5, 0.5).await;
//!
//! // The agent calls the tool with:
//! // { "query": "subsidy for organic farming", "top_k": 3 }
//! ```

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{error, info};

use crate::document::SearchResult;
use crate::service::RagService;

/// Portal suggested when the corpus has no answer.
pub const DEFAULT_PORTAL: &str = "https://raitamitra.karnataka.gov.in/english";

/// Returned when the vector store cannot be used.
pub const UNAVAILABLE_MESSAGE: &str = "Unable to connect to the vector database. \
Please ensure Qdrant is running and try again. \
For now, use Google Search to find scheme information.";

const RULE_WIDTH: usize = 50;

const FOOTER: &str =
    "\nNote: For the most current information, verify on official government portals.";

/// Whether a vector store was wired at startup.
#[derive(Clone)]
pub enum StoreAvailability {
    /// The service is ready for queries.
    Available(Arc<RagService>),
    /// No store could be wired; `reason` says why.
    Unavailable {
        /// Startup failure description.
        reason: String,
    },
}

impl StoreAvailability {
    /// The service, when available.
    pub fn service(&self) -> Option<&Arc<RagService>> {
        match self {
            Self::Available(service) => Some(service),
            Self::Unavailable { .. } => None,
        }
    }
}

impl std::fmt::Debug for StoreAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(service) => f
                .debug_tuple("Available")
                .field(&service.vector_store().backend())
                .finish(),
            Self::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Text returned when a search succeeds but nothing passes the threshold.
pub fn not_found_message(query: &str) -> String {
    format!(
        "No relevant scheme information found in the corpus for query: '{query}'. \
         Consider using Google Search for more recent or specific information. \
         Default portal for Karnataka schemes: {DEFAULT_PORTAL}"
    )
}

/// Render matches as numbered blocks with relevance, source, and content.
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut lines = Vec::with_capacity(results.len() * 4 + 3);
    lines.push(format!("Found {} relevant documents for: '{query}'\n", results.len()));
    lines.push(rule.clone());

    for (i, result) in results.iter().enumerate() {
        lines.push(format!("\n**Document {}** (Relevance: {:.2}%)", i + 1, result.score * 100.0));
        lines.push(format!("Source: {}", result.source));
        lines.push(format!("Content:\n{}", result.text));
        lines.push(rule.clone());
    }

    lines.push(FOOTER.to_string());
    lines.join("\n")
}

/// A retrieval tool over the government scheme collection.
#[derive(Debug, Clone)]
pub struct RetrievalTool {
    availability: StoreAvailability,
    collection: String,
    default_top_k: usize,
    default_threshold: f32,
}

impl RetrievalTool {
    /// Create a tool searching `collection`.
    ///
    /// Defaults come from the service configuration (`top_k`,
    /// `tool_threshold`), or 5 and 0.5 when the store is unavailable.
    pub fn new(availability: StoreAvailability, collection: impl Into<String>) -> Self {
        let (default_top_k, default_threshold) = match availability.service() {
            Some(service) => (service.config().top_k, service.config().tool_threshold),
            None => (5, 0.5),
        };
        Self { availability, collection: collection.into(), default_top_k, default_threshold }
    }

    /// Whether queries can reach a store.
    pub fn is_available(&self) -> bool {
        self.availability.service().is_some()
    }

    /// The collection searched.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Function name exposed to the agent.
    pub fn name(&self) -> &str {
        "retrieve_government_schemes"
    }

    /// Function description exposed to the agent.
    pub fn description(&self) -> &str {
        "Retrieve relevant government agricultural scheme information (subsidies, welfare \
         programs, eligibility, benefits) from the scheme document database."
    }

    /// JSON schema of the function arguments.
    pub fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What scheme information to look for, e.g. \"PM Kisan scheme benefits\" or \"irrigation assistance Karnataka\""
                },
                "top_k": {
                    "type": "integer",
                    "description": "Number of most relevant documents to retrieve (default: 5)"
                },
                "score_threshold": {
                    "type": "number",
                    "description": "Minimum similarity score for results (default: 0.5)"
                }
            },
            "required": ["query"]
        })
    }

    /// Search and format the results. Never fails.
    pub async fn retrieve(&self, query: &str, top_k: usize, score_threshold: f32) -> String {
        let service = match &self.availability {
            StoreAvailability::Available(service) => service,
            StoreAvailability::Unavailable { reason } => {
                info!(query, %reason, "retrieval requested but store unavailable");
                return UNAVAILABLE_MESSAGE.to_string();
            }
        };

        info!(query, collection = %self.collection, top_k, score_threshold, "retrieve_government_schemes called");

        match service.search(query, &self.collection, top_k, score_threshold).await {
            Ok(results) if results.is_empty() => not_found_message(query),
            Ok(results) => format_results(query, &results),
            Err(e) => {
                error!(error = %e, "scheme search failed");
                UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }

    /// Search with the tool defaults.
    pub async fn retrieve_default(&self, query: &str) -> String {
        self.retrieve(query, self.default_top_k, self.default_threshold).await
    }

    /// Handle a function call from the agent. Never fails.
    pub async fn call(&self, args: &Value) -> String {
        let Some(query) = args.get("query").and_then(Value::as_str).filter(|q| !q.trim().is_empty())
        else {
            return "The 'query' argument is required to search government schemes.".to_string();
        };
        let top_k = args
            .get("top_k")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(self.default_top_k);
        let score_threshold = args
            .get("score_threshold")
            .and_then(Value::as_f64)
            .map(|v| v as f32)
            .unwrap_or(self.default_threshold);

        self.retrieve(query, top_k, score_threshold).await
    }
}
