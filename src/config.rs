use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub content: ContentConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Directory containing the site's route files (`page.tsx` and friends).
    pub routes_dir: PathBuf,
    /// Directory containing structured data files (`*.json`).
    pub data_dir: PathBuf,
    /// Directory containing long-form posts (`*.md`, `*.mdx`).
    pub posts_dir: PathBuf,
    /// Domains treated as the site's own when rewriting absolute links.
    #[serde(default)]
    pub site_domains: Vec<String>,
    /// Paths (relative to each content root) excluded from collection.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Name used in generated summary headings.
    #[serde(default = "default_site_name")]
    pub site_name: String,
}

fn default_site_name() -> String {
    "This site".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Vector store name used when the store must be created.
    pub name: String,
    /// Known vector store id; `OPENAI_VECTOR_STORE_ID` takes precedence.
    #[serde(default)]
    pub vector_store_id: Option<String>,
    /// Manifest location override. Defaults to
    /// `$SITESYNC_CACHE_DIR/vector-store-manifest.json` when the variable is
    /// set, else `.cache/vector-store-manifest.json`.
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,
    /// Upper bound on the post-upload indexing wait.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    /// Interval between indexing-status polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_wait_timeout_secs() -> u64 {
    120
}
fn default_poll_interval_secs() -> u64 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Per-request time bound; exceeding it counts as a retryable failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 2000,
            max_delay_ms: 30_000,
            timeout_secs: 30,
        }
    }
}

fn default_max_retries() -> u32 {
    5
}
fn default_base_delay_ms() -> u64 {
    2000
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

fn default_max_results() -> usize {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.store.name.trim().is_empty() {
        anyhow::bail!("store.name must not be empty");
    }

    if config.search.max_results == 0 {
        anyhow::bail!("search.max_results must be >= 1");
    }

    if config.store.poll_interval_secs == 0 {
        anyhow::bail!("store.poll_interval_secs must be >= 1");
    }

    if config
        .content
        .site_domains
        .iter()
        .any(|d| d.trim().is_empty() || d.contains("://"))
    {
        anyhow::bail!("content.site_domains entries must be bare domains (no scheme)");
    }

    Ok(config)
}
