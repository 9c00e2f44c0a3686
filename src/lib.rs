//! # Site Sync
//!
//! Content synchronization and vector-store reconciliation for a portfolio
//! site with an embedded RAG chatbot.
//!
//! Site Sync scans the site's content sources (page routes, structured
//! data files, blog posts, and summaries derived from the data), assigns
//! each logical document a stable identity and content digest, diffs the
//! set against a persisted manifest of previously uploaded artifacts, and
//! applies the minimal create/delete operations against an OpenAI vector
//! store. The index always mirrors current content with no duplicates, no
//! orphans, and no redundant re-indexing.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Collectors   │──▶│  Reconciler  │──▶│   Gateway    │
//! │ routes/data/   │   │ diff against │   │ OpenAI files │
//! │ posts/summary  │   │   manifest   │   │ vector store │
//! └────────────────┘   └──────┬───────┘   └──────┬───────┘
//!                             │                  │
//!                       ┌─────▼──────┐     ┌─────▼──────┐
//!                       │  Manifest  │     │   Search   │
//!                       │   (JSON)   │     │ (retriever)│
//!                       └────────────┘     └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! sitesync sync --dry-run       # show the plan, touch nothing
//! sitesync sync                 # reconcile the vector store
//! sitesync status               # inspect the manifest
//! sitesync search "experience with Rust"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`source_id`] | Stable identity, remote filenames, digests |
//! | [`normalize`] | Content text normalization |
//! | [`collect`] | Collection orchestration |
//! | [`manifest`] | Persisted manifest store |
//! | [`reconcile`] | Plan computation and execution |
//! | [`vector_store`] | Remote index gateway |
//! | [`retry`] | Retry policy for remote calls |
//! | [`impact`] | Git-based change-impact estimation |
//! | [`search`] | Retrieval over the remote index |
//! | [`sync`] | Run orchestration |

pub mod collect;
pub mod collector_data;
pub mod collector_posts;
pub mod collector_routes;
pub mod collector_summary;
pub mod config;
pub mod impact;
pub mod manifest;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod retry;
pub mod search;
pub mod source_id;
pub mod status;
pub mod sync;
pub mod vector_store;
