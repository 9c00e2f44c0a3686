use anyhow::{bail, Result};
use tracing::debug;

use crate::config::Config;
use crate::manifest::ManifestStore;
use crate::vector_store::{OpenAiVectorStore, StoreResult, VectorIndex, STORE_ID_ENV};

/// One retrieved document, ready for the chat retriever: the indexed
/// content, the site URL it represents, and the store's relevance score.
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    pub content: String,
    pub source_url: String,
    pub score: f64,
}

/// Query the remote index directly. Reconciliation state is bypassed
/// entirely; whatever is attached to the store right now is searchable.
pub async fn search_documents(
    index: &dyn VectorIndex,
    store_id: &str,
    query: &str,
    max_results: usize,
) -> StoreResult<Vec<RetrievedDocument>> {
    let hits = index.search(store_id, query, max_results).await?;
    debug!(query, hits = hits.len(), "vector store search");
    Ok(hits
        .into_iter()
        .map(|hit| {
            let source_url = extract_url_header(&hit.content)
                .map(str::to_string)
                .unwrap_or_default();
            RetrievedDocument {
                source_url,
                score: hit.score,
                content: hit.content,
            }
        })
        .collect())
}

/// Every uploaded artifact starts with a `URL: <path>` header line; pull
/// it back out of a search hit.
pub fn extract_url_header(content: &str) -> Option<&str> {
    content.lines().find_map(|line| {
        line.strip_prefix("URL:")
            .and_then(|rest| rest.split_whitespace().next())
    })
}

pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let Some(store_id) = resolve_store_id(config) else {
        bail!("No vector store id known. Set OPENAI_VECTOR_STORE_ID or run `sitesync sync` first.");
    };

    let gateway = OpenAiVectorStore::from_config(config)?;
    let max_results = limit.unwrap_or(config.search.max_results);
    let results = search_documents(&gateway, &store_id, query, max_results).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let url = if result.source_url.is_empty() {
            "(no url)"
        } else {
            result.source_url.as_str()
        };
        println!("{}. [{:.2}] {}", i + 1, result.score, url);
        println!("    excerpt: \"{}\"", excerpt(&result.content));
        println!();
    }

    Ok(())
}

/// Known store id: environment first, then config, then the manifest.
fn resolve_store_id(config: &Config) -> Option<String> {
    std::env::var(STORE_ID_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| config.store.vector_store_id.clone())
        .or_else(|| {
            ManifestStore::resolve(config)
                .load()
                .map(|m| m.vector_store_id)
                .filter(|id| !id.is_empty())
        })
}

/// Single-line excerpt of a hit, with the URL header dropped.
fn excerpt(content: &str) -> String {
    let body: Vec<&str> = content
        .lines()
        .filter(|line| !line.starts_with("URL:"))
        .collect();
    let flat = body.join(" ");
    let mut flat = flat.trim().to_string();
    if flat.chars().count() > 160 {
        flat = flat.chars().take(160).collect::<String>() + "...";
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_url_header() {
        assert_eq!(
            extract_url_header("URL: /projects\n\nProject list"),
            Some("/projects")
        );
        assert_eq!(extract_url_header("URL:/blog/intro\nbody"), Some("/blog/intro"));
        assert_eq!(extract_url_header("no header here"), None);
        // Header does not need to be the first line of the hit chunk.
        assert_eq!(
            extract_url_header("chunk tail\nURL: /\nmore"),
            Some("/")
        );
    }

    #[test]
    fn test_excerpt_drops_header_and_flattens() {
        let text = "URL: /projects\n\nLine one\nLine two";
        assert_eq!(excerpt(text), "Line one Line two");
    }

    #[test]
    fn test_excerpt_truncates() {
        let text = "x".repeat(500);
        let e = excerpt(&text);
        assert!(e.ends_with("..."));
        assert_eq!(e.chars().count(), 163);
    }
}
