//! Core data types that flow through the sync pipeline.

use crate::source_id::{content_digest, SourceId};

/// One logical unit of indexable text, produced by a collector.
///
/// Documents are recreated on every run; the only identity that survives
/// across runs is the [`SourceId`] derivation itself. For a fixed content
/// tree, collection is deterministic: the same ids, the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDocument {
    pub source_id: SourceId,
    /// Fully normalized text to be indexed.
    pub content: String,
    /// User-facing URL this document represents. Multiple documents may
    /// share one (every summary points at `/`).
    pub display_url: String,
}

impl ContentDocument {
    pub fn new(source_id: SourceId, content: String) -> Self {
        let display_url = source_id.display_url();
        Self {
            source_id,
            content,
            display_url,
        }
    }

    /// Digest of the normalized content, used for change detection.
    pub fn digest(&self) -> String {
        content_digest(&self.content)
    }

    /// Payload actually stored in the remote index. The `URL:` header is
    /// what the retriever parses back out of search hits.
    pub fn upload_payload(&self) -> String {
        format!("URL: {}\n\n{}", self.display_url, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_id::SummaryKind;

    #[test]
    fn test_display_url_follows_source_id() {
        let doc = ContentDocument::new(SourceId::Post("intro".into()), "text".into());
        assert_eq!(doc.display_url, "/blog/intro");
        let doc = ContentDocument::new(SourceId::Summary(SummaryKind::Career), "text".into());
        assert_eq!(doc.display_url, "/");
    }

    #[test]
    fn test_upload_payload_carries_url_header() {
        let doc = ContentDocument::new(SourceId::Route("/projects".into()), "body".into());
        assert_eq!(doc.upload_payload(), "URL: /projects\n\nbody");
    }

    #[test]
    fn test_digest_matches_content_digest() {
        let doc = ContentDocument::new(SourceId::Route("/".into()), "same".into());
        assert_eq!(doc.digest(), content_digest("same"));
    }
}
