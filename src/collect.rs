//! Collection orchestration: run every collector and assemble the full
//! document set for one reconciliation pass.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use tracing::warn;

use crate::config::Config;
use crate::models::ContentDocument;
use crate::{collector_data, collector_posts, collector_routes, collector_summary};

/// Collect every content document: routes, data files, posts, and derived
/// summaries. Deterministic for a fixed content tree; per-item failures
/// inside collectors are logged and skipped, never fatal.
pub fn collect_all(config: &Config) -> Result<Vec<ContentDocument>> {
    let mut docs = Vec::new();
    docs.extend(collector_routes::scan_routes(config)?);
    docs.extend(collector_data::scan_data(config)?);
    docs.extend(collector_posts::scan_posts(config)?);
    docs.extend(collector_summary::scan_summaries(config));

    // Source ids must be unique across the whole set; a duplicate means
    // two artifacts map to one identity and the later one is dropped.
    let mut seen = BTreeSet::new();
    docs.retain(|doc| {
        let id = doc.source_id.to_string();
        if seen.insert(id.clone()) {
            true
        } else {
            warn!(source_id = %id, "duplicate source id; keeping first occurrence");
            false
        }
    });

    docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    Ok(docs)
}

/// Exclusion globs shared by the directory-walking collectors: the
/// configured patterns plus the usual noise directories.
pub(crate) fn exclude_set(config: &Config) -> Result<GlobSet> {
    let mut patterns = vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    patterns.extend(config.content.exclude_globs.clone());

    let mut builder = GlobSetBuilder::new();
    for pattern in &patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
