use anyhow::Result;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::collect::exclude_set;
use crate::config::Config;
use crate::models::ContentDocument;
use crate::normalize;
use crate::source_id::SourceId;

/// Scan the posts directory for `*.md` / `*.mdx` files. The indexed text
/// is the frontmatter block when one exists (title, description, tags —
/// the part worth retrieving), else the whole body; either way links are
/// rewritten and blank runs collapsed.
pub fn scan_posts(config: &Config) -> Result<Vec<ContentDocument>> {
    let root = &config.content.posts_dir;
    if !root.exists() {
        warn!(root = %root.display(), "posts directory does not exist; no posts collected");
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
        if !is_post_file(path) {
            continue;
        }
        let Some(slug) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable post; skipping");
                continue;
            }
        };

        let body = frontmatter(&raw).unwrap_or(&raw);
        let content = normalize::normalize_prose(body, &config.content.site_domains);
        docs.push(ContentDocument::new(SourceId::Post(slug), content));
    }

    docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    Ok(docs)
}

fn is_post_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("mdx")
    )
}

/// The block between the first `---` pair, if the file opens with one.
fn frontmatter(text: &str) -> Option<&str> {
    let rest = text.trim_start().strip_prefix("---")?;
    let end = rest.find("\n---")?;
    Some(&rest[..end])
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

[store]
name = "test-store"
"#,
            root = root.display()
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        load_config(file.path()).unwrap()
    }

    fn write_post(root: &Path, name: &str, body: &str) {
        let dir = root.join("posts");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_slug_from_filename() {
        let tmp = TempDir::new().unwrap();
        write_post(
            tmp.path(),
            "first-post.mdx",
            "---\ntitle: First\n---\nBody here",
        );

        let docs = scan_posts(&test_config(tmp.path())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_id.to_string(), "blog:first-post");
        assert_eq!(docs[0].display_url, "/blog/first-post");
    }

    #[test]
    fn test_frontmatter_only_when_present() {
        let tmp = TempDir::new().unwrap();
        write_post(
            tmp.path(),
            "intro.mdx",
            "---\ntitle: Intro\ndescription: Hello\n---\nLong body that is not indexed",
        );

        let docs = scan_posts(&test_config(tmp.path())).unwrap();
        assert!(docs[0].content.contains("title: Intro"));
        assert!(docs[0].content.contains("description: Hello"));
        assert!(!docs[0].content.contains("Long body"));
    }

    #[test]
    fn test_no_frontmatter_falls_back_to_body() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "plain.md", "Just a plain markdown post.");

        let docs = scan_posts(&test_config(tmp.path())).unwrap();
        assert_eq!(docs[0].content, "Just a plain markdown post.");
    }

    #[test]
    fn test_links_rewritten_in_frontmatter() {
        let tmp = TempDir::new().unwrap();
        write_post(
            tmp.path(),
            "linked.mdx",
            "---\ncanonical: https://example.dev/blog/linked\n---\nbody",
        );

        let docs = scan_posts(&test_config(tmp.path())).unwrap();
        assert!(docs[0].content.contains("/blog/linked"));
        assert!(!docs[0].content.contains("https://example.dev"));
    }

    #[test]
    fn test_non_markdown_ignored() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "notes.txt", "not a post");

        let docs = scan_posts(&test_config(tmp.path())).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_sorted_and_deterministic() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "zeta.md", "z");
        write_post(tmp.path(), "alpha.md", "a");

        let config = test_config(tmp.path());
        let first = scan_posts(&config).unwrap();
        let ids: Vec<String> = first.iter().map(|d| d.source_id.to_string()).collect();
        assert_eq!(ids, vec!["blog:alpha", "blog:zeta"]);
        assert_eq!(first, scan_posts(&config).unwrap());
    }
}
