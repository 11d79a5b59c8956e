//! Semantic retrieval over the document model.
//!
//! Two interchangeable strategies, both producing a bounded context
//! string for the oracle:
//!
//! - **Page-level**: embed every non-empty page and the query in two
//!   batched calls, keep the top-k pages, then re-sort them into document
//!   order so the context reads front to back regardless of similarity
//!   rank.
//! - **Chunk-level**: flatten all page text into fixed-size word chunks
//!   and return the single best-matching chunk.
//!
//! Both fail softly on empty documents: no content to embed means an
//! empty context, not an error. Embedder failures propagate and abort
//! the retrieval attempt.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::embedding::{embed_query, Embedder};
use crate::models::DocumentModel;
use crate::vector_store::VectorStore;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern"));

/// Page-level search: top-`k` most relevant pages, in document order.
pub async fn search_pages(
    model: &DocumentModel,
    embedder: &dyn Embedder,
    query: &str,
    k: usize,
) -> Result<String> {
    let mut page_ids: Vec<u32> = Vec::new();
    let mut texts: Vec<String> = Vec::new();
    for (page, text) in &model.pages {
        if text.trim().is_empty() {
            continue;
        }
        page_ids.push(*page);
        texts.push(text.clone());
    }

    if texts.is_empty() {
        return Ok(String::new());
    }

    let page_vectors = embedder.embed(&texts).await?;
    let query_vector = embed_query(embedder, query).await?;

    let store = VectorStore::new(page_vectors);
    let mut hits: Vec<u32> = store
        .nearest(&query_vector, k)
        .iter()
        .map(|&(_, index)| page_ids[index])
        .collect();
    hits.sort_unstable();

    tracing::debug!(?hits, candidates = page_ids.len(), "page search");

    let content = hits
        .iter()
        .filter_map(|page| model.pages.get(page))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(content.trim().to_string())
}

/// Chunk-level search: the single best `chunk_size`-word chunk.
pub async fn search_chunks(
    model: &DocumentModel,
    embedder: &dyn Embedder,
    query: &str,
    chunk_size: usize,
) -> Result<String> {
    let combined = model
        .pages
        .values()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    let chunks = divide_into_chunks(&combined, chunk_size);
    if chunks.is_empty() {
        return Ok(String::new());
    }

    let chunk_vectors = embedder.embed(&chunks).await?;
    let query_vector = embed_query(embedder, query).await?;

    let store = VectorStore::new(chunk_vectors);
    let best = store
        .nearest(&query_vector, 1)
        .first()
        .map(|&(_, index)| chunks[index].clone())
        .unwrap_or_default();

    tracing::debug!(chunks = chunks.len(), "chunk search");
    Ok(best)
}

/// Split text into contiguous chunks of `chunk_size` words.
///
/// Words are `\w+` runs; the final partial chunk is kept, not dropped or
/// padded. Text with no words yields no chunks.
pub fn divide_into_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let words: Vec<&str> = WORD.find_iter(text).map(|m| m.as_str()).collect();
    words
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageIndex;
    use async_trait::async_trait;

    /// Deterministic embedder: counts of marker words, plus a constant
    /// component so every vector is nonzero.
    struct MarkerEmbedder;

    const MARKERS: [&str; 3] = ["alpha", "beta", "gamma"];

    #[async_trait]
    impl Embedder for MarkerEmbedder {
        fn model_name(&self) -> &str {
            "marker"
        }

        fn dims(&self) -> usize {
            MARKERS.len() + 1
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|text| {
                    let mut vector: Vec<f32> = MARKERS
                        .iter()
                        .map(|marker| text.matches(marker).count() as f32)
                        .collect();
                    vector.push(0.1);
                    vector
                })
                .collect())
        }
    }

    fn model_with_pages(pages: &[(u32, &str)]) -> DocumentModel {
        let mut index = PageIndex::new();
        for (page, text) in pages {
            index.insert(*page, text.to_string());
        }
        DocumentModel {
            pages: index,
            sections: Vec::new(),
        }
    }

    #[test]
    fn test_divide_into_chunks_keeps_final_partial_chunk() {
        let chunks = divide_into_chunks("w1 w2 w3 w4 w5", 2);
        assert_eq!(chunks, vec!["w1 w2", "w3 w4", "w5"]);
    }

    #[test]
    fn test_divide_into_chunks_strips_punctuation_boundaries() {
        let chunks = divide_into_chunks("Hello, world! (Really.)", 10);
        assert_eq!(chunks, vec!["Hello world Really"]);
    }

    #[test]
    fn test_divide_into_chunks_empty_text() {
        assert!(divide_into_chunks("", 5).is_empty());
        assert!(divide_into_chunks("  ... !!", 5).is_empty());
    }

    #[tokio::test]
    async fn test_search_pages_returns_document_order() {
        // Page 9 matches hardest, page 2 second; output must be 2 then 9.
        let model = model_with_pages(&[
            (2, "beta beta"),
            (5, "unrelated text"),
            (9, "beta beta beta"),
        ]);
        let content = search_pages(&model, &MarkerEmbedder, "beta", 2)
            .await
            .unwrap();
        assert_eq!(content, "beta beta\nbeta beta beta");
    }

    #[tokio::test]
    async fn test_search_pages_skips_blank_pages() {
        let model = model_with_pages(&[(1, "   "), (2, "alpha")]);
        let content = search_pages(&model, &MarkerEmbedder, "alpha", 4)
            .await
            .unwrap();
        assert_eq!(content, "alpha");
    }

    #[tokio::test]
    async fn test_search_pages_empty_model_is_soft() {
        let model = model_with_pages(&[]);
        let content = search_pages(&model, &MarkerEmbedder, "alpha", 4)
            .await
            .unwrap();
        assert_eq!(content, "");
    }

    #[tokio::test]
    async fn test_search_chunks_returns_best_chunk() {
        let model = model_with_pages(&[
            (1, "filler filler filler filler"),
            (2, "gamma gamma gamma filler"),
        ]);
        let best = search_chunks(&model, &MarkerEmbedder, "gamma", 4)
            .await
            .unwrap();
        assert_eq!(best, "gamma gamma gamma filler");
    }

    #[tokio::test]
    async fn test_search_chunks_empty_model_is_soft() {
        let model = model_with_pages(&[]);
        let best = search_chunks(&model, &MarkerEmbedder, "gamma", 4)
            .await
            .unwrap();
        assert_eq!(best, "");
    }
}
