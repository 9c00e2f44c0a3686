use anyhow::Result;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::manifest::{ManifestStore, UNKNOWN_DIGEST};

/// Print the manifest location and what it tracks. Purely local; never
/// contacts the remote store.
pub fn run_status(config: &Config) -> Result<()> {
    let store = ManifestStore::resolve(config);
    println!("manifest: {}", store.path().display());

    let Some(manifest) = store.load() else {
        println!("  no manifest (first run, or the cache was cleared)");
        return Ok(());
    };

    println!("  vector store: {}", manifest.vector_store_id);
    println!("  tracked files: {}", manifest.files.len());

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in manifest.files.values() {
        *by_kind.entry(entry.kind.as_str()).or_insert(0) += 1;
    }
    for (kind, count) in by_kind {
        println!("    {:<10} {}", kind, count);
    }

    let unresolved = manifest
        .files
        .values()
        .filter(|e| e.sha256 == UNKNOWN_DIGEST)
        .count();
    if unresolved > 0 {
        println!(
            "  unconfirmed digests: {} (resolved on the next sync)",
            unresolved
        );
    }

    Ok(())
}
