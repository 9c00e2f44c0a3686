//! Derived summary documents.
//!
//! The raw data files are indexed as-is, but the chatbot answers much
//! better from plain-English renderings of them, so three summaries are
//! synthesized deterministically: work experience from `career.json`,
//! skills from `technologies.json`, and site navigation from
//! `site-pages.json`. A missing or malformed source skips that one
//! summary; it never fails the run.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::config::Config;
use crate::models::ContentDocument;
use crate::source_id::{SourceId, SummaryKind};

pub fn scan_summaries(config: &Config) -> Vec<ContentDocument> {
    let mut docs = Vec::new();
    for kind in [
        SummaryKind::Career,
        SummaryKind::Technologies,
        SummaryKind::SitePages,
    ] {
        match build_summary(config, kind) {
            Ok(content) => docs.push(ContentDocument::new(SourceId::Summary(kind), content)),
            Err(e) => {
                warn!(summary = kind.as_str(), error = %e, "skipping summary");
            }
        }
    }
    docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    docs
}

fn build_summary(config: &Config, kind: SummaryKind) -> Result<String> {
    let site_name = &config.content.site_name;
    let data_dir = &config.content.data_dir;
    match kind {
        SummaryKind::Career => career_summary(site_name, data_dir),
        SummaryKind::Technologies => technologies_summary(site_name, data_dir),
        SummaryKind::SitePages => site_pages_summary(site_name, data_dir),
    }
}

fn read_data_json(data_dir: &Path, filename: &str) -> Result<Value> {
    let path = data_dir.join(filename);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn career_summary(site_name: &str, data_dir: &Path) -> Result<String> {
    let value = read_data_json(data_dir, "career.json")?;
    let jobs = value
        .get("career")
        .and_then(Value::as_array)
        .context("career.json has no 'career' array")?;

    let mut summary = format!("Work experience for {}:\n\n", site_name);
    for job in jobs {
        let title = job.get("title").and_then(Value::as_str).unwrap_or("Unknown role");
        let name = job
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown company");
        let start = job.get("start").and_then(Value::as_str).unwrap_or("?");
        let end = job.get("end").and_then(Value::as_str).unwrap_or("Present");
        summary.push_str(&format!("- {} at {} ({} to {})\n", title, name, start, end));

        if let Some(lines) = job.get("description").and_then(Value::as_array) {
            for line in lines.iter().filter_map(Value::as_str) {
                summary.push_str(&format!("  * {}\n", line));
            }
        }
    }
    Ok(summary.trim_end().to_string())
}

fn technologies_summary(site_name: &str, data_dir: &Path) -> Result<String> {
    let value = read_data_json(data_dir, "technologies.json")?;
    let tech = value
        .get("technologies")
        .context("technologies.json has no 'technologies' object")?;

    let mut summary = format!("Technologies and skills for {}:\n\n", site_name);

    if let Some(primary) = tech.get("primary").and_then(Value::as_array) {
        let names: Vec<&str> = primary
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str))
            .collect();
        if !names.is_empty() {
            summary.push_str(&format!("Primary technologies: {}\n\n", names.join(", ")));
        }
    }

    if let Some(additional) = tech.get("additional").and_then(Value::as_array) {
        summary.push_str("Additional experience:\n");
        for group in additional {
            let label = group.get("label").and_then(Value::as_str).unwrap_or("Other");
            let items: Vec<&str> = group
                .get("items")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            summary.push_str(&format!("- {}: {}\n", label, items.join(", ")));
        }
    }

    Ok(summary.trim_end().to_string())
}

fn site_pages_summary(site_name: &str, data_dir: &Path) -> Result<String> {
    let value = read_data_json(data_dir, "site-pages.json")?;
    let pages = value
        .get("pages")
        .and_then(Value::as_array)
        .context("site-pages.json has no 'pages' array")?;

    let mut summary = format!("Pages available on {}:\n\n", site_name);
    for page in pages {
        // Entries are either plain path strings or objects with
        // path/title/description.
        match page {
            Value::String(path) => summary.push_str(&format!("- {}\n", path)),
            Value::Object(_) => {
                let path = page.get("path").and_then(Value::as_str).unwrap_or("/");
                let title = page.get("title").and_then(Value::as_str).unwrap_or(path);
                match page.get("description").and_then(Value::as_str) {
                    Some(desc) => {
                        summary.push_str(&format!("- {} ({}): {}\n", title, path, desc))
                    }
                    None => summary.push_str(&format!("- {} ({})\n", title, path)),
                }
            }
            _ => {}
        }
    }
    Ok(summary.trim_end().to_string())
}
