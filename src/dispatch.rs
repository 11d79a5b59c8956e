//! Action dispatch against the document model.
//!
//! The oracle requests content by naming one of four actions; this module
//! decodes the call, executes it, and reports both the literal content
//! and a human-readable description of what was done ("fetching pages 3
//! 4..."). Empty content is a valid result: a page absent from the index
//! or an unmatched section title contributes nothing and raises nothing.
//! Unknown action names come back as a literal error string in the
//! content so the conversation can continue.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::embedding::Embedder;
use crate::models::DocumentModel;
use crate::oracle::ActionSchema;
use crate::retrieval::search_pages;

/// A structured instruction to fetch specific content.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRequest {
    /// Fetch the listed 1-based pages, in the order given.
    FetchPages(Vec<u32>),
    /// Fetch the first section whose title matches exactly.
    FetchSection(String),
    /// Fetch every section's text.
    FetchAll,
    /// Page-level semantic search.
    Search(String),
}

/// What an executed action did, for status rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDescription {
    pub verb: String,
    pub noun: String,
}

impl ActionDescription {
    fn new(verb: &str, noun: impl Into<String>) -> Self {
        Self {
            verb: verb.to_string(),
            noun: noun.into(),
        }
    }
}

/// Outcome of one dispatched action.
///
/// `description` is `None` exactly when the call named an unknown action
/// or carried undecodable arguments (the recoverable error-string case).
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub content: String,
    pub description: Option<ActionDescription>,
}

/// The four action declarations offered to the oracle.
pub fn action_schemas() -> Vec<ActionSchema> {
    vec![
        ActionSchema {
            name: "fetch_pages".to_string(),
            description: "Fetch the content of specified pages from the document.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "pages": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "The list of pages to fetch."
                    }
                },
                "required": ["pages"]
            }),
        },
        ActionSchema {
            name: "fetch_section".to_string(),
            description: "Fetch the content of a specified section.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "section_title": {
                        "type": "string",
                        "description": "The title of the section to fetch."
                    }
                },
                "required": ["section_title"]
            }),
        },
        ActionSchema {
            name: "fetch_all".to_string(),
            description: "Fetch the content of the entire document, for example for summarization."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        },
        ActionSchema {
            name: "search".to_string(),
            description: "Search the document for a string query.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search term."
                    }
                },
                "required": ["query"]
            }),
        },
    ]
}

/// Execute an [`ActionRequest`] against the model.
pub async fn dispatch(
    model: &DocumentModel,
    embedder: &dyn Embedder,
    request: &ActionRequest,
    page_k: usize,
) -> Result<ActionResult> {
    match request {
        ActionRequest::FetchPages(numbers) => {
            let content = numbers
                .iter()
                .filter_map(|page| model.pages.get(page))
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n");
            let noun = if numbers.len() == 1 {
                format!("page {}", numbers[0])
            } else {
                format!(
                    "pages {}",
                    numbers
                        .iter()
                        .map(u32::to_string)
                        .collect::<Vec<_>>()
                        .join(" ")
                )
            };
            Ok(ActionResult {
                content: content.trim().to_string(),
                description: Some(ActionDescription::new("fetching", noun)),
            })
        }
        ActionRequest::FetchSection(title) => {
            let content = model
                .sections
                .iter()
                .find(|section| section.title == *title)
                .map(|section| section.text.trim().to_string())
                .unwrap_or_default();
            Ok(ActionResult {
                content,
                description: Some(ActionDescription::new("fetching", title.clone())),
            })
        }
        ActionRequest::FetchAll => {
            let content = model
                .sections
                .iter()
                .map(|section| section.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Ok(ActionResult {
                content: content.trim().to_string(),
                description: Some(ActionDescription::new("fetching", "entire document")),
            })
        }
        ActionRequest::Search(query) => {
            let content = search_pages(model, embedder, query, page_k).await?;
            Ok(ActionResult {
                content,
                description: Some(ActionDescription::new("searching", query.clone())),
            })
        }
    }
}

/// Decode and execute an oracle function call.
///
/// Unknown names and malformed arguments yield an [`ActionResult`] whose
/// content is a literal error string, surfaced to the oracle as function
/// output rather than raised.
pub async fn dispatch_call(
    model: &DocumentModel,
    embedder: &dyn Embedder,
    name: &str,
    arguments: &Value,
    page_k: usize,
) -> Result<ActionResult> {
    match decode_action(name, arguments) {
        Ok(request) => dispatch(model, embedder, &request, page_k).await,
        Err(content) => Ok(ActionResult {
            content,
            description: None,
        }),
    }
}

/// Map a `(name, arguments)` call to a closed [`ActionRequest`].
///
/// The error string is the function output handed back to the oracle.
fn decode_action(name: &str, arguments: &Value) -> Result<ActionRequest, String> {
    match name {
        "fetch_pages" => {
            let pages = arguments
                .get("pages")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid_arguments(name, "pages must be an array of numbers"))?;
            let numbers = pages
                .iter()
                .map(|v| v.as_u64().map(|n| n as u32))
                .collect::<Option<Vec<u32>>>()
                .ok_or_else(|| invalid_arguments(name, "pages must be an array of numbers"))?;
            Ok(ActionRequest::FetchPages(numbers))
        }
        "fetch_section" => {
            let title = arguments
                .get("section_title")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid_arguments(name, "section_title must be a string"))?;
            Ok(ActionRequest::FetchSection(title.to_string()))
        }
        "fetch_all" => Ok(ActionRequest::FetchAll),
        "search" => {
            let query = arguments
                .get("query")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid_arguments(name, "query must be a string"))?;
            Ok(ActionRequest::Search(query.to_string()))
        }
        other => Err(format!("Error: function {} does not exist", other)),
    }
}

fn invalid_arguments(name: &str, detail: &str) -> String {
    format!("Error: invalid arguments for {}: {}", name, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeaderRank, PageIndex, Section};
    use async_trait::async_trait;

    /// Embedder stub for dispatch tests that never reach retrieval.
    struct PanicEmbedder;

    #[async_trait]
    impl Embedder for PanicEmbedder {
        fn model_name(&self) -> &str {
            "panic"
        }
        fn dims(&self) -> usize {
            0
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            panic!("embedder must not be called");
        }
    }

    fn model() -> DocumentModel {
        let mut pages = PageIndex::new();
        pages.insert(1, "a".to_string());
        pages.insert(2, "b".to_string());
        pages.insert(3, "c".to_string());
        DocumentModel {
            pages,
            sections: vec![
                Section {
                    title: "Introduction".to_string(),
                    pages: vec![1],
                    text: "intro text".to_string(),
                    header_rank: HeaderRank::H1,
                },
                Section {
                    title: "Methods".to_string(),
                    pages: vec![2, 3],
                    text: "methods text".to_string(),
                    header_rank: HeaderRank::H1,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_fetch_pages_preserves_request_order() {
        let request = ActionRequest::FetchPages(vec![3, 1]);
        let result = dispatch(&model(), &PanicEmbedder, &request, 4).await.unwrap();
        assert_eq!(result.content, "c\na");
        let description = result.description.unwrap();
        assert_eq!(description.verb, "fetching");
        assert_eq!(description.noun, "pages 3 1");
    }

    #[tokio::test]
    async fn test_fetch_pages_single_page_noun() {
        let request = ActionRequest::FetchPages(vec![2]);
        let result = dispatch(&model(), &PanicEmbedder, &request, 4).await.unwrap();
        assert_eq!(result.content, "b");
        assert_eq!(result.description.unwrap().noun, "page 2");
    }

    #[tokio::test]
    async fn test_fetch_pages_absent_pages_contribute_nothing() {
        let request = ActionRequest::FetchPages(vec![7, 1, 9]);
        let result = dispatch(&model(), &PanicEmbedder, &request, 4).await.unwrap();
        assert_eq!(result.content, "a");
        assert_eq!(result.description.unwrap().noun, "pages 7 1 9");
    }

    #[tokio::test]
    async fn test_fetch_section_exact_match() {
        let request = ActionRequest::FetchSection("Methods".to_string());
        let result = dispatch(&model(), &PanicEmbedder, &request, 4).await.unwrap();
        assert_eq!(result.content, "methods text");
        assert_eq!(result.description.unwrap().noun, "Methods");
    }

    #[tokio::test]
    async fn test_fetch_section_is_case_sensitive() {
        let request = ActionRequest::FetchSection("methods".to_string());
        let result = dispatch(&model(), &PanicEmbedder, &request, 4).await.unwrap();
        assert_eq!(result.content, "");
        // The noun echoes the request even without a match.
        assert_eq!(result.description.unwrap().noun, "methods");
    }

    #[tokio::test]
    async fn test_fetch_all_joins_sections_in_order() {
        let result = dispatch(&model(), &PanicEmbedder, &ActionRequest::FetchAll, 4)
            .await
            .unwrap();
        assert_eq!(result.content, "intro text methods text");
        assert_eq!(result.description.unwrap().noun, "entire document");
    }

    #[tokio::test]
    async fn test_empty_model_all_actions_return_empty() {
        let empty = DocumentModel::default();
        for request in [
            ActionRequest::FetchPages(vec![1]),
            ActionRequest::FetchSection("X".to_string()),
            ActionRequest::FetchAll,
        ] {
            let result = dispatch(&empty, &PanicEmbedder, &request, 4).await.unwrap();
            assert_eq!(result.content, "");
        }
    }

    #[tokio::test]
    async fn test_unknown_action_returns_literal_error() {
        let result = dispatch_call(
            &model(),
            &PanicEmbedder,
            "summarize",
            &serde_json::json!({}),
            4,
        )
        .await
        .unwrap();
        assert_eq!(result.content, "Error: function summarize does not exist");
        assert!(result.description.is_none());
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_recoverable() {
        let result = dispatch_call(
            &model(),
            &PanicEmbedder,
            "fetch_pages",
            &serde_json::json!({"pages": "nope"}),
            4,
        )
        .await
        .unwrap();
        assert!(result.content.starts_with("Error: invalid arguments for fetch_pages"));
        assert!(result.description.is_none());
    }

    #[test]
    fn test_decode_action_covers_all_four() {
        assert_eq!(
            decode_action("fetch_pages", &serde_json::json!({"pages": [3, 1]})),
            Ok(ActionRequest::FetchPages(vec![3, 1]))
        );
        assert_eq!(
            decode_action("fetch_section", &serde_json::json!({"section_title": "T"})),
            Ok(ActionRequest::FetchSection("T".to_string()))
        );
        assert_eq!(
            decode_action("fetch_all", &serde_json::json!({})),
            Ok(ActionRequest::FetchAll)
        );
        assert_eq!(
            decode_action("search", &serde_json::json!({"query": "q"})),
            Ok(ActionRequest::Search("q".to_string()))
        );
    }

    #[test]
    fn test_action_schemas_names() {
        let names: Vec<String> = action_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["fetch_pages", "fetch_section", "fetch_all", "search"]);
    }
}
