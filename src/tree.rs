//! Section tree construction.
//!
//! Folds the flat, position-tagged fragment list from the extraction dump
//! into a [`DocumentModel`]: a section index keyed by each fragment's
//! top-level path segment, plus a page-to-text index built in the same
//! pass. Input order matters (it determines title resolution and the
//! discovery order of sections and pages), so fragments are never
//! re-sorted.
//!
//! Heading classification works on decomposed path tokens: a fragment
//! ranks as `Title`/`H1`/`H2` when one of its path segments has exactly
//! that node type. A section's title is claimed by the strongest heading
//! fragment seen so far; later fragments of equal or weaker rank fall
//! through to body text.

use std::collections::HashMap;

use crate::models::{DocumentModel, Fragment, HeaderRank, PageIndex, Section};
use crate::path::{decompose_path, relative_path, PathToken};

/// Heading strength of a decomposed path.
fn classify(tokens: &[PathToken]) -> HeaderRank {
    tokens
        .iter()
        .map(|t| match t.node_type.as_str() {
            "Title" => HeaderRank::Title,
            "H1" => HeaderRank::H1,
            "H2" => HeaderRank::H2,
            _ => HeaderRank::None,
        })
        .max()
        .unwrap_or(HeaderRank::None)
}

/// Build a [`DocumentModel`] from extraction fragments.
///
/// Structural fragments (no page, or no text) are skipped. A fragment
/// whose path fails to decompose is skipped with a warning rather than
/// aborting the build. Page numbers are converted from the dump's 0-based
/// convention to 1-based.
pub fn build(fragments: &[Fragment]) -> DocumentModel {
    let mut sections: Vec<Section> = Vec::new();
    let mut section_index: HashMap<String, usize> = HashMap::new();
    let mut pages = PageIndex::new();
    let mut skipped = 0usize;

    for fragment in fragments {
        let text = match fragment.text.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => continue,
        };
        let page = match fragment.page {
            Some(p) => p + 1,
            None => continue,
        };

        let relative = relative_path(fragment);
        let tokens = match decompose_path(relative) {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::warn!(path = %fragment.path, %err, "skipping fragment");
                skipped += 1;
                continue;
            }
        };

        // Sections are keyed by the raw first segment, so `Sect` and
        // `Sect[2]` stay distinct.
        let key = relative.split('/').next().unwrap_or(relative);
        let slot = *section_index.entry(key.to_string()).or_insert_with(|| {
            sections.push(Section::new());
            sections.len() - 1
        });
        let section = &mut sections[slot];

        let rank = classify(&tokens);
        if rank > section.header_rank {
            section.title = text.to_string();
            section.header_rank = rank;
        } else {
            if !section.text.is_empty() {
                section.text.push(' ');
            }
            section.text.push_str(text);
        }

        if !section.pages.contains(&page) {
            section.pages.push(page);
        }

        pages
            .entry(page)
            .and_modify(|existing| {
                existing.push(' ');
                existing.push_str(text);
            })
            .or_insert_with(|| text.to_string());
    }

    tracing::debug!(
        sections = sections.len(),
        pages = pages.len(),
        skipped,
        "document model built"
    );

    DocumentModel { pages, sections }
}
