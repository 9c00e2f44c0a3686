use anyhow::Result;
use tracing::warn;

use crate::collect::exclude_set;
use crate::config::Config;
use crate::models::ContentDocument;
use crate::normalize;
use crate::source_id::SourceId;

/// Scan the data directory (non-recursive) for `*.json` files. Content is
/// the raw file text with the site's absolute links rewritten; the JSON is
/// not parsed here, so a malformed file is still indexed as text.
pub fn scan_data(config: &Config) -> Result<Vec<ContentDocument>> {
    let root = &config.content.data_dir;
    if !root.exists() {
        warn!(root = %root.display(), "data directory does not exist; no data files collected");
        return Ok(Vec::new());
    }

    let exclude = exclude_set(config)?;
    let mut docs = Vec::new();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "cannot read data directory");
            return Ok(Vec::new());
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "unreadable directory entry; skipping");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if !name.ends_with(".json") || exclude.is_match(&name) {
            continue;
        }

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable data file; skipping");
                continue;
            }
        };

        let content = normalize::rewrite_absolute_links(&raw, &config.content.site_domains)
            .trim()
            .to_string();
        docs.push(ContentDocument::new(SourceId::Data(name), content));
    }

    docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    Ok(docs)
}
