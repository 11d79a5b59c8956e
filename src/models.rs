//! Core data types for the document-triage pipeline.
//!
//! These types represent the extraction fragments flowing into the tree
//! builder and the document model flowing out of it toward retrieval and
//! dispatch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One unit of extracted text, as produced by the external extraction step.
///
/// Deserialized directly from the extract dump's `elements` records. A
/// fragment participates in tree construction only when it carries both a
/// page number and non-empty text; everything else is structural.
#[derive(Debug, Clone, Deserialize)]
pub struct Fragment {
    /// Hierarchical location, e.g. `//Document/Sect[2]/H1`.
    #[serde(rename = "Path", default)]
    pub path: String,
    /// 0-based page number.
    #[serde(rename = "Page", default)]
    pub page: Option<u32>,
    #[serde(rename = "Text", default)]
    pub text: Option<String>,
}

/// Strength of the heading a fragment represents, ordered weakest first.
///
/// The ordering drives title resolution: a fragment may claim a section's
/// title only when its rank is strictly greater than the rank of the
/// fragment that set the current title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum HeaderRank {
    #[default]
    None,
    H2,
    H1,
    Title,
}

/// An aggregated, titled block of document content spanning one or more pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Resolved heading text; empty until a heading fragment is seen.
    pub title: String,
    /// 1-based page numbers, deduplicated, in discovery order.
    pub pages: Vec<u32>,
    /// Space-joined body text of all non-heading fragments.
    pub text: String,
    /// Strongest heading rank seen so far. Not part of the persisted model.
    #[serde(skip)]
    pub header_rank: HeaderRank,
}

impl Section {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            pages: Vec::new(),
            text: String::new(),
            header_rank: HeaderRank::None,
        }
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

/// 1-based page number → space-joined text of all fragments on that page.
pub type PageIndex = BTreeMap<u32, String>;

/// The combined page/section view handed to retrieval and dispatch.
///
/// Immutable after construction; safe to share read-only across questions.
/// Serializes to the persistable form
/// `{ "pages": { "1": … }, "sections": [ { "title", "pages", "text" } ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentModel {
    pub pages: PageIndex,
    pub sections: Vec<Section>,
}

impl DocumentModel {
    /// True when the model holds no content at all.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.sections.is_empty()
    }

    /// Copy of the model with every page and section text cut to its first
    /// `max_words` whitespace-separated words.
    ///
    /// This is the transform behind the orchestrator's degraded-context
    /// retry: titles and page lists are untouched, only body text shrinks.
    pub fn truncated(&self, max_words: usize) -> DocumentModel {
        DocumentModel {
            pages: self
                .pages
                .iter()
                .map(|(page, text)| (*page, truncate_words(text, max_words)))
                .collect(),
            sections: self
                .sections
                .iter()
                .map(|s| Section {
                    title: s.title.clone(),
                    pages: s.pages.clone(),
                    text: truncate_words(&s.text, max_words),
                    header_rank: s.header_rank,
                })
                .collect(),
        }
    }
}

/// First `max_words` whitespace-separated words of `text`, space-joined.
///
/// Shorter texts come back unchanged (modulo whitespace normalization).
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
