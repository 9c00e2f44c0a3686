//! Stable document identity and content hashing.
//!
//! Every [`ContentDocument`](crate::models::ContentDocument) is keyed by a
//! [`SourceId`] derived purely from the identity of its source artifact
//! (route path, data filename, post slug, summary type) — never from its
//! content. The id also defines the remote filename for the vector store,
//! as a single encode/decode pair so that manifest rebuild can map stored
//! filenames back to ids.

use sha2::{Digest, Sha256};
use std::fmt;

/// The category of content a document was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DocKind {
    Route,
    Data,
    Post,
    Summary,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Route => "route",
            DocKind::Data => "data",
            DocKind::Post => "post",
            DocKind::Summary => "summary",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived summary's type. Each type maps to exactly one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SummaryKind {
    Career,
    Technologies,
    SitePages,
}

impl SummaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryKind::Career => "career",
            SummaryKind::Technologies => "technologies",
            SummaryKind::SitePages => "site-pages",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "career" => Some(SummaryKind::Career),
            "technologies" => Some(SummaryKind::Technologies),
            "site-pages" => Some(SummaryKind::SitePages),
            _ => None,
        }
    }
}

/// Stable identifier for a logical document.
///
/// Recomputable from the source artifact's identity alone; two runs over
/// an unchanged content tree always produce the same set of ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceId {
    /// A site route, keyed by its URL path (`/` for the root page).
    Route(String),
    /// A structured data file, keyed by filename (including extension).
    Data(String),
    /// A blog post, keyed by slug (filename without extension).
    Post(String),
    /// A derived summary document.
    Summary(SummaryKind),
}

impl SourceId {
    pub fn kind(&self) -> DocKind {
        match self {
            SourceId::Route(_) => DocKind::Route,
            SourceId::Data(_) => DocKind::Data,
            SourceId::Post(_) => DocKind::Post,
            SourceId::Summary(_) => DocKind::Summary,
        }
    }

    /// The user-facing URL this document represents. Summaries all point
    /// at the site root.
    pub fn display_url(&self) -> String {
        match self {
            SourceId::Route(path) => path.clone(),
            SourceId::Data(filename) => format!("/{}", filename),
            SourceId::Post(slug) => format!("/blog/{}", slug),
            SourceId::Summary(_) => "/".to_string(),
        }
    }

    /// Filename used for the artifact in the remote store.
    ///
    /// The inverse is [`SourceId::decode_remote_filename`]; the pair is the
    /// only place the naming convention is defined.
    pub fn remote_filename(&self) -> String {
        match self {
            SourceId::Route(path) => {
                if path == "/" {
                    "route-home.txt".to_string()
                } else {
                    format!("route-{}.txt", path.trim_start_matches('/').replace('/', "-"))
                }
            }
            SourceId::Data(filename) => filename.clone(),
            SourceId::Post(slug) => format!("blog-{}.md", slug),
            SourceId::Summary(kind) => format!("{}-summary.txt", kind.as_str()),
        }
    }

    /// Map a stored filename back to the [`SourceId`] that produced it.
    ///
    /// Returns `None` for filenames matching no known convention; those
    /// remote files are treated as orphans during manifest rebuild.
    ///
    /// Route paths containing `-` in a segment are ambiguous under this
    /// convention (`-` stands in for `/`); rebuild resolves them against
    /// the current document set first and only falls back to this decoder
    /// for files with no current counterpart.
    pub fn decode_remote_filename(filename: &str) -> Option<SourceId> {
        if let Some(kind) = filename
            .strip_suffix("-summary.txt")
            .and_then(SummaryKind::from_str)
        {
            return Some(SourceId::Summary(kind));
        }

        if filename == "route-home.txt" {
            return Some(SourceId::Route("/".to_string()));
        }
        if let Some(rest) = filename
            .strip_prefix("route-")
            .and_then(|r| r.strip_suffix(".txt"))
        {
            if rest.is_empty() {
                return None;
            }
            return Some(SourceId::Route(format!("/{}", rest.replace('-', "/"))));
        }

        if let Some(slug) = filename
            .strip_prefix("blog-")
            .and_then(|r| r.strip_suffix(".md"))
        {
            if slug.is_empty() {
                return None;
            }
            return Some(SourceId::Post(slug.to_string()));
        }

        if filename.ends_with(".json") && filename.len() > ".json".len() {
            return Some(SourceId::Data(filename.to_string()));
        }

        None
    }
}

/// Canonical string form, used as the manifest key:
/// `route:<path>`, `data:<filename>`, `blog:<slug>`, `summary:<type>`.
impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Route(path) => write!(f, "route:{}", path),
            SourceId::Data(filename) => write!(f, "data:{}", filename),
            SourceId::Post(slug) => write!(f, "blog:{}", slug),
            SourceId::Summary(kind) => write!(f, "summary:{}", kind.as_str()),
        }
    }
}

/// Hex-encoded SHA-256 of the exact normalized content string.
///
/// Content carries no timestamps, so equal content always yields an equal
/// digest regardless of when it is computed.
pub fn content_digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
