//! # Doctriage
//!
//! Document-triage question answering over PDF text-extraction dumps.
//!
//! Doctriage turns a flat, position-tagged extraction dump into a
//! hierarchical document model (pages, sections, headings), then answers
//! natural-language questions by routing each one to a retrieval action
//! (fetch specific pages, fetch a named section, fetch everything, or
//! semantic search over pages) before composing the answer with a
//! language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────────┐
//! │ Extract  │──▶│   Tree    │──▶│ DocumentModel │
//! │  (JSON)  │   │  Builder  │   │ pages+sections│
//! └──────────┘   └───────────┘   └──────┬────────┘
//!                                       │
//!                     ┌─────────────────┤
//!                     ▼                 ▼
//!               ┌──────────┐     ┌───────────┐
//!               │ Dispatch │     │ Retrieval │
//!               │ (actions)│     │ (vectors) │
//!               └────┬─────┘     └─────┬─────┘
//!                    └───────┬─────────┘
//!                            ▼
//!                    ┌──────────────┐
//!                    │ Orchestrator │──▶ answer + actions
//!                    └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types and the document model |
//! | [`path`] | Path segment decomposition |
//! | [`tree`] | Section tree construction |
//! | [`extract`] | Extraction-dump loading |
//! | [`vector_store`] | Top-k nearest-neighbor index |
//! | [`embedding`] | Embedder trait and OpenAI provider |
//! | [`oracle`] | Chat oracle trait and OpenAI provider |
//! | [`retrieval`] | Page- and chunk-level semantic search |
//! | [`dispatch`] | Action decoding and execution |
//! | [`orchestrator`] | Conversation flow and answer strategies |
//! | [`config`] | TOML configuration parsing |

pub mod config;
pub mod dispatch;
pub mod embedding;
pub mod extract;
pub mod models;
pub mod oracle;
pub mod orchestrator;
pub mod path;
pub mod retrieval;
pub mod tree;
pub mod vector_store;
