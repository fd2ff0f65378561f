//! Scheme question answering over the retrieval tool and web search.
//!
//! [`SchemeOrchestrator`] always consults the scheme corpus and, when one is
//! configured, a web search. An optional [`AnswerModel`] condenses both into
//! the final answer; [`merge_links`] then makes sure no link surfaced by
//! either tool is lost.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use kisan_rag::{DEFAULT_PORTAL, RetrievalTool};
use regex::Regex;
use tracing::{info, warn};

use crate::error::{Result, ServerError};
use crate::input::{AgentInput, FarmerProfile, UserMessage};

/// System instruction for the answer model.
pub const SCHEME_INSTRUCTION: &str = "You are the government scheme assistant for Indian farmers. \
You are given the farmer's question together with results from a local scheme document \
database and from a Google Search. Combine both into one clear answer that includes all \
relevant information. Keep every scheme portal link provided by the two sources and list \
them at the end of the answer. If no link was provided, give the default link: \
https://raitamitra.karnataka.gov.in/english. Do not mention that no specific link was provided. \
Summarize in 500-600 words unless the farmer asks for more detail.";

/// System instruction for image questions.
pub const IMAGE_INSTRUCTION: &str = "You are an agricultural assistant for Indian farmers. \
Look at the photo and answer the farmer's question about it. If it shows a crop problem, \
name the likely cause and practical treatment, and say when to consult the local \
agriculture office.";

/// A prompt for the answer model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instruction: String,
    pub text: String,
    /// Base64 JPEG sent inline with the text.
    pub image_jpeg_base64: Option<String>,
}

/// Live web search for scheme information.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

/// A language model that writes the final answer.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    async fn answer(&self, prompt: &Prompt) -> Result<String>;
}

/// Produces the assistant's reply to one request.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn answer(&self, input: &AgentInput) -> Result<String>;
}

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>()\[\]{}"'`|]+"#).expect("link pattern is valid"));

/// Every `http(s)` link in `text`, in order, trailing punctuation removed.
pub fn extract_links(text: &str) -> Vec<String> {
    LINK.find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', '*']).to_string())
        .filter(|link| link.len() > "https://".len())
        .collect()
}

/// Ensure `summary` carries every link found in `tool_outputs`.
///
/// Links the summary dropped are appended in the order the tools produced
/// them, without duplicates. When no tool produced a link the default portal
/// is appended instead, unless the summary already names it.
pub fn merge_links(summary: &str, tool_outputs: &[&str]) -> String {
    let mut links: Vec<String> = Vec::new();
    for link in tool_outputs.iter().flat_map(|output| extract_links(output)) {
        if !links.contains(&link) {
            links.push(link);
        }
    }

    let summary = summary.trim_end();
    let present = extract_links(summary);
    if links.is_empty() {
        if present.iter().any(|link| link == DEFAULT_PORTAL) {
            return summary.to_string();
        }
        return format!("{summary}\n\n{DEFAULT_PORTAL}");
    }

    let missing: Vec<&String> = links.iter().filter(|link| !present.contains(link)).collect();
    if missing.is_empty() {
        return summary.to_string();
    }

    let mut merged = format!("{summary}\n\nLinks:");
    for link in missing {
        merged.push_str("\n- ");
        merged.push_str(link);
    }
    merged
}

fn with_profile(profile: &FarmerProfile, text: &str) -> String {
    match profile.describe() {
        Some(described) => format!("{described}\n\n{text}"),
        None => text.to_string(),
    }
}

/// Answers scheme questions from the corpus and the web.
pub struct SchemeOrchestrator {
    retrieval: RetrievalTool,
    web_search: Option<Arc<dyn WebSearch>>,
    model: Option<Arc<dyn AnswerModel>>,
}

impl SchemeOrchestrator {
    pub fn new(retrieval: RetrievalTool) -> Self {
        Self { retrieval, web_search: None, model: None }
    }

    pub fn with_web_search(mut self, web_search: Arc<dyn WebSearch>) -> Self {
        self.web_search = Some(web_search);
        self
    }

    pub fn with_model(mut self, model: Arc<dyn AnswerModel>) -> Self {
        self.model = Some(model);
        self
    }

    async fn answer_text(&self, query: &str, profile: &FarmerProfile) -> Result<String> {
        let corpus = self.retrieval.retrieve_default(query).await;

        let web = match &self.web_search {
            Some(web_search) => match web_search.search(query).await {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "web search failed");
                    None
                }
            },
            None => None,
        };

        let mut sections = vec![format!("Scheme database results:\n{corpus}")];
        if let Some(web) = &web {
            sections.push(format!("Google Search results:\n{web}"));
        }
        let gathered = sections.join("\n\n");

        let summary = match &self.model {
            Some(model) => {
                let prompt = Prompt {
                    instruction: SCHEME_INSTRUCTION.to_string(),
                    text: with_profile(profile, &format!("Question: {query}\n\n{gathered}")),
                    image_jpeg_base64: None,
                };
                model.answer(&prompt).await?
            }
            None => gathered,
        };

        let mut outputs = vec![corpus.as_str()];
        outputs.extend(web.as_deref());
        info!(
            corpus_available = self.retrieval.is_available(),
            web = web.is_some(),
            "scheme answer assembled"
        );
        Ok(merge_links(&summary, &outputs))
    }
}

#[async_trait]
impl Orchestrator for SchemeOrchestrator {
    async fn answer(&self, input: &AgentInput) -> Result<String> {
        match &input.message {
            UserMessage::Text(query) => self.answer_text(query, &input.profile).await,
            UserMessage::Multimodal { text, image_base64 } => {
                let model = self.model.as_ref().ok_or_else(|| {
                    ServerError::Unsupported("image questions need an answer model".to_string())
                })?;
                let prompt = Prompt {
                    instruction: IMAGE_INSTRUCTION.to_string(),
                    text: with_profile(&input.profile, text),
                    image_jpeg_base64: Some(image_base64.clone()),
                };
                model.answer(&prompt).await
            }
        }
    }
}
