//! Conversation orchestration.
//!
//! Drives the exchange with the chat oracle. The default triage strategy
//! is a two-state machine with a linear transition: offer the four
//! actions and let the oracle pick one (or answer directly), execute the
//! pick, then ask for the final answer with the retrieved content in the
//! conversation. The only recovery path is degraded context: if the
//! first oracle call fails, every page and section text is cut to its
//! first `truncate_words` words and the call is retried once with the
//! same message shape. A second failure is fatal; no partial answer is
//! returned.
//!
//! Three baseline strategies answer in a single round without actions:
//! stuffed-and-truncated full text, top-k page retrieval, and best-chunk
//! retrieval.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::dispatch::{action_schemas, dispatch_call, ActionDescription};
use crate::embedding::Embedder;
use crate::models::{truncate_words, DocumentModel};
use crate::oracle::{ChatMessage, ChatOracle};
use crate::retrieval::{search_chunks, search_pages};

/// How a question gets its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerStrategy {
    /// Oracle-selected action over the document model (the default).
    #[default]
    Triage,
    /// Full text, word-truncated into the system message.
    Truncate,
    /// Page-level retrieval into the system message.
    RetrievalPages,
    /// Chunk-level retrieval into the system message.
    RetrievalChunks,
}

impl FromStr for AnswerStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "triage" => Ok(Self::Triage),
            "truncate" => Ok(Self::Truncate),
            "pages" => Ok(Self::RetrievalPages),
            "chunks" => Ok(Self::RetrievalChunks),
            other => Err(anyhow!(
                "Unknown answer strategy: {}. Use triage, truncate, pages, or chunks.",
                other
            )),
        }
    }
}

impl fmt::Display for AnswerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Triage => "triage",
            Self::Truncate => "truncate",
            Self::RetrievalPages => "pages",
            Self::RetrievalChunks => "chunks",
        };
        f.write_str(name)
    }
}

/// Tuning for one answering run.
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    pub strategy: AnswerStrategy,
    /// Pages kept by search-type actions and the pages strategy.
    pub page_k: usize,
    /// Words per chunk for the chunks strategy.
    pub chunk_size: usize,
    /// Per-text word cap on the degraded-context retry.
    pub truncate_words: usize,
    /// Context word budget for the truncate strategy.
    pub context_words: usize,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            strategy: AnswerStrategy::Triage,
            page_k: 4,
            chunk_size: 100,
            truncate_words: 256,
            context_words: 3000,
        }
    }
}

/// Final answer plus the actions taken to produce it, so callers can
/// render "searching for X…" style status.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub actions: Vec<ActionDescription>,
}

const SYSTEM_PREAMBLE: &str = "You are an expert document question answering system. \
You answer questions by finding relevant content in the document and answering \
questions based on that content.";

/// Compact metadata summary: page list plus per-section titles and page
/// ranges. Never includes body text.
pub fn metadata_summary(model: &DocumentModel) -> String {
    let mut lines = Vec::new();

    let pages = model
        .pages
        .keys()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(format!("Pages: {}", pages));

    lines.push("Sections:".to_string());
    for section in &model.sections {
        let title = if section.title.is_empty() {
            "(untitled)"
        } else {
            &section.title
        };
        let range = match (section.pages.iter().min(), section.pages.iter().max()) {
            (Some(first), Some(last)) if first != last => format!("pages {}-{}", first, last),
            (Some(first), Some(_)) => format!("page {}", first),
            _ => "no pages".to_string(),
        };
        lines.push(format!("- {} ({})", title, range));
    }

    lines.join("\n")
}

fn triage_messages(question: &str, model: &DocumentModel) -> Vec<ChatMessage> {
    let system = format!(
        "{} You can summarize the document by fetching the first several pages.\n\n\
        Document metadata:\n{}",
        SYSTEM_PREAMBLE,
        metadata_summary(model)
    );
    vec![ChatMessage::system(system), ChatMessage::user(question)]
}

fn context_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    let system = format!("{}\n\nDocument:\n{}", SYSTEM_PREAMBLE, context);
    vec![ChatMessage::system(system), ChatMessage::user(question)]
}

/// Answer a question about the document.
pub async fn answer(
    question: &str,
    model: &DocumentModel,
    embedder: &dyn Embedder,
    oracle: &dyn ChatOracle,
    opts: &AnswerOptions,
) -> Result<Answer> {
    match opts.strategy {
        AnswerStrategy::Triage => answer_triage(question, model, embedder, oracle, opts).await,
        AnswerStrategy::Truncate => {
            let combined = model
                .sections
                .iter()
                .map(|section| section.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let context = truncate_words(&combined, opts.context_words);
            answer_with_context(question, &context, oracle).await
        }
        AnswerStrategy::RetrievalPages => {
            let context = search_pages(model, embedder, question, opts.page_k).await?;
            answer_with_context(question, &context, oracle).await
        }
        AnswerStrategy::RetrievalChunks => {
            let context = search_chunks(model, embedder, question, opts.chunk_size).await?;
            answer_with_context(question, &context, oracle).await
        }
    }
}

/// The action-selection pipeline.
async fn answer_triage(
    question: &str,
    model: &DocumentModel,
    embedder: &dyn Embedder,
    oracle: &dyn ChatOracle,
    opts: &AnswerOptions,
) -> Result<Answer> {
    let schemas = action_schemas();

    let mut messages = triage_messages(question, model);
    let mut truncated: Option<DocumentModel> = None;

    let reply = match oracle.converse(&messages, Some(&schemas)).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(%err, "oracle call failed, retrying with truncated document");
            let degraded = model.truncated(opts.truncate_words);
            messages = triage_messages(question, &degraded);
            let reply = oracle
                .converse(&messages, Some(&schemas))
                .await
                .context("oracle failed after truncate-and-retry")?;
            truncated = Some(degraded);
            reply
        }
    };

    // Later dispatch reads the same view the oracle saw.
    let active_model = truncated.as_ref().unwrap_or(model);

    let mut actions = Vec::new();
    messages.push(ChatMessage::assistant(
        reply.content.clone(),
        reply.action.clone(),
    ));

    if let Some(call) = &reply.action {
        let result =
            dispatch_call(active_model, embedder, &call.name, &call.arguments, opts.page_k).await?;
        if let Some(description) = &result.description {
            tracing::info!(verb = %description.verb, noun = %description.noun, "action taken");
            actions.push(description.clone());
        } else {
            tracing::warn!(name = %call.name, "unrecognized action requested");
        }
        messages.push(ChatMessage::function(&call.name, result.content));
    }

    let final_reply = oracle
        .converse(&messages, None)
        .await
        .context("oracle failed on the final answer round")?;
    let text = final_reply
        .content
        .ok_or_else(|| anyhow!("oracle returned no content for the final answer"))?;

    Ok(Answer { text, actions })
}

/// Single-round answering over a prepared context string.
async fn answer_with_context(
    question: &str,
    context: &str,
    oracle: &dyn ChatOracle,
) -> Result<Answer> {
    let messages = context_messages(question, context);
    let reply = oracle
        .converse(&messages, None)
        .await
        .context("oracle failed")?;
    let text = reply
        .content
        .ok_or_else(|| anyhow!("oracle returned no content"))?;

    Ok(Answer {
        text,
        actions: Vec::new(),
    })
}
