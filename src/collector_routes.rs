use anyhow::Result;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::collect::exclude_set;
use crate::config::Config;
use crate::models::ContentDocument;
use crate::normalize;
use crate::source_id::SourceId;

const PAGE_EXTENSIONS: [&str; 4] = ["tsx", "jsx", "mdx", "md"];

/// Scan the routes directory for `page.*` files and produce one document
/// per route. The URL path is the page file's directory relative to the
/// routes root, `/` for the root page.
pub fn scan_routes(config: &Config) -> Result<Vec<ContentDocument>> {
    let root = &config.content.routes_dir;
    if !root.exists() {
        warn!(root = %root.display(), "routes directory does not exist; no routes collected");
        return Ok(Vec::new());
    }

    let exclude = exclude_set(config)?;
    let mut docs = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "unreadable directory entry; skipping");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude.is_match(&rel_str) {
            continue;
        }
        if !is_page_file(path) {
            continue;
        }

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable route file; skipping");
                continue;
            }
        };

        let url = route_url(&rel_str);
        let content = normalize::normalize_markup(&raw, &config.content.site_domains);
        if content.is_empty() {
            debug!(url = %url, "route produced no indexable text; skipping");
            continue;
        }

        docs.push(ContentDocument::new(SourceId::Route(url), content));
    }

    docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    Ok(docs)
}

fn is_page_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    match name.split_once('.') {
        Some(("page", ext)) => PAGE_EXTENSIONS.contains(&ext),
        _ => false,
    }
}

/// `projects/page.tsx` → `/projects`; `page.tsx` at the root → `/`.
fn route_url(relative: &str) -> String {
    match relative.rsplit_once('/') {
        Some((dir, _file)) => format!("/{}", dir),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn test_config(root: &Path) -> Config {
        let body = format!(
            r#"
[content]
routes_dir = "{root}/app"
data_dir = "{root}/data"
posts_dir = "{root}/posts"
site_domains = ["example.dev"]
exclude_globs = ["drafts/**"]

[store]
name = "test-store"
"#,
            root = root.display()
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        load_config(file.path()).unwrap()
    }

    fn write_page(root: &Path, rel_dir: &str, body: &str) {
        let dir = if rel_dir.is_empty() {
            root.join("app")
        } else {
            root.join("app").join(rel_dir)
        };
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("page.tsx"), body).unwrap();
    }

    #[test]
    fn test_routes_derive_urls() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "", "<h1>Home</h1>");
        write_page(tmp.path(), "projects", "<h1>Projects</h1>");
        write_page(tmp.path(), "blog/archive", "<h1>Archive</h1>");

        let docs = scan_routes(&test_config(tmp.path())).unwrap();
        let ids: Vec<String> = docs.iter().map(|d| d.source_id.to_string()).collect();
        assert_eq!(ids, vec!["route:/", "route:/blog/archive", "route:/projects"]);
        assert_eq!(docs[0].display_url, "/");
    }

    #[test]
    fn test_routes_are_normalized() {
        let tmp = TempDir::new().unwrap();
        write_page(
            tmp.path(),
            "",
            "import X from 'x';\n<main className=\"p-4\"><p>Visit https://example.dev/contact</p></main>",
        );

        let docs = scan_routes(&test_config(tmp.path())).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(!docs[0].content.contains("import"));
        assert!(!docs[0].content.contains("className"));
        assert!(docs[0].content.contains("/contact"));
        assert!(!docs[0].content.contains("https://example.dev"));
    }

    #[test]
    fn test_non_page_files_ignored() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "", "<h1>Home</h1>");
        let extra = tmp.path().join("app");
        fs::write(extra.join("layout.tsx"), "<body>layout</body>").unwrap();
        fs::write(extra.join("page.css"), ".x { color: red }").unwrap();

        let docs = scan_routes(&test_config(tmp.path())).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_exclude_globs_respected() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "", "<h1>Home</h1>");
        write_page(tmp.path(), "drafts/wip", "<h1>WIP</h1>");

        let docs = scan_routes(&test_config(tmp.path())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_id.to_string(), "route:/");
    }

    #[test]
    fn test_missing_root_yields_empty() {
        let tmp = TempDir::new().unwrap();
        let docs = scan_routes(&test_config(tmp.path())).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "", "<h1>Home</h1>");
        write_page(tmp.path(), "about", "<h1>About</h1>");

        let config = test_config(tmp.path());
        let first = scan_routes(&config).unwrap();
        let second = scan_routes(&config).unwrap();
        assert_eq!(first, second);
    }
}
