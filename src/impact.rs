//! Best-effort change-impact estimation from version control.
//!
//! After a manifest rebuild every entry carries an unconfirmed digest, and
//! the reconciler would otherwise presume them all unchanged. When the
//! build system exposes the previously deployed commit, a `git diff`
//! against it narrows that presumption to the source ids whose files
//! actually changed. Absent git or a base ref, this module simply reports
//! nothing and the reconciler falls back to trusting the rebuild.

use std::collections::HashSet;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::config::Config;
use crate::source_id::{SourceId, SummaryKind};

/// Environment variable naming the git ref of the last synced state
/// (cache-preserving CI systems expose the previous deploy's commit).
pub const BASE_REF_ENV: &str = "SITESYNC_BASE_REF";

/// Source ids presumed changed since the base ref, including summaries
/// derived from changed data files. `None` when version-control
/// information is unavailable.
pub fn changed_source_ids(config: &Config) -> Option<HashSet<String>> {
    let base_ref = std::env::var(BASE_REF_ENV)
        .ok()
        .filter(|r| !r.trim().is_empty())?;

    let paths = git_changed_paths(&base_ref)?;
    let mut ids = HashSet::new();
    for path in &paths {
        for id in map_path(config, Path::new(path)) {
            ids.insert(id.to_string());
        }
    }
    debug!(
        base_ref = %base_ref,
        changed_paths = paths.len(),
        impacted_ids = ids.len(),
        "change impact estimated from git"
    );
    Some(ids)
}

fn git_changed_paths(base_ref: &str) -> Option<Vec<String>> {
    let output = Command::new("git")
        .args(["diff", "--name-only", &format!("{}..HEAD", base_ref)])
        .output();

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "git unavailable; skipping change-impact estimation");
            return None;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(
            base_ref = %base_ref,
            stderr = %stderr.trim(),
            "git diff failed; skipping change-impact estimation"
        );
        return None;
    }

    Some(
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
    )
}

/// Map a repo-relative changed path to the source ids it affects.
/// Content roots in the config must be repo-relative for this to match.
fn map_path(config: &Config, path: &Path) -> Vec<SourceId> {
    let content = &config.content;

    if let Ok(rel) = path.strip_prefix(&content.routes_dir) {
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if let Some(name) = rel.file_name().and_then(|n| n.to_str()) {
            if name.starts_with("page.") {
                let url = match rel_str.rsplit_once('/') {
                    Some((dir, _)) => format!("/{}", dir),
                    None => "/".to_string(),
                };
                return vec![SourceId::Route(url)];
            }
        }
        return Vec::new();
    }

    if let Ok(rel) = path.strip_prefix(&content.data_dir) {
        let Some(name) = rel.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        if rel.components().count() != 1 || !name.ends_with(".json") {
            return Vec::new();
        }
        let mut ids = vec![SourceId::Data(name.to_string())];
        // Summaries are derived from specific data files; a change there
        // invalidates the summary too.
        match name {
            "career.json" => ids.push(SourceId::Summary(SummaryKind::Career)),
            "technologies.json" => ids.push(SourceId::Summary(SummaryKind::Technologies)),
            "site-pages.json" => ids.push(SourceId::Summary(SummaryKind::SitePages)),
            _ => {}
        }
        return ids;
    }

    if let Ok(rel) = path.strip_prefix(&content.posts_dir) {
        let is_post = matches!(
            rel.extension().and_then(|e| e.to_str()),
            Some("md") | Some("mdx")
        );
        if is_post {
            if let Some(slug) = rel.file_stem().and_then(|s| s.to_str()) {
                return vec![SourceId::Post(slug.to_string())];
            }
        }
        return Vec::new();
    }

    Vec::new()
}
