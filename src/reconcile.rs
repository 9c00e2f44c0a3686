//! The reconciliation core.
//!
//! Compares the current document set against the persisted manifest and
//! computes the minimal set of remote deletions and uploads, then executes
//! them one source id at a time. The manifest is persisted after each
//! batch of remote mutations, so a crash mid-run loses at most the batch
//! in flight; everything already executed is durably recorded and the next
//! run picks up the remainder.

use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::manifest::{Manifest, ManifestEntry, ManifestStore, UNKNOWN_DIGEST};
use crate::models::ContentDocument;
use crate::source_id::SourceId;
use crate::vector_store::{StoreResult, VectorIndex};

/// The minimal work for one run. Derived fresh every invocation; never
/// persisted.
#[derive(Debug, Default, Clone)]
pub struct ReconcilePlan {
    /// Source ids whose remote artifact must be removed.
    pub to_delete: Vec<String>,
    /// Documents that must be uploaded (new or changed content).
    pub to_upload: Vec<ContentDocument>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_upload.is_empty()
    }
}

/// Counters reported after executing a plan.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncReport {
    pub deleted: usize,
    pub uploaded: usize,
    pub delete_failures: usize,
    pub upload_failures: usize,
}

impl SyncReport {
    pub fn failures(&self) -> usize {
        self.delete_failures + self.upload_failures
    }
}

/// Diff the current documents against the manifest.
///
/// Pure except for one in-place mutation: an `UNKNOWN` digest that is not
/// flagged changed by the impact hints is resolved to the document's real
/// digest without any remote operation. The returned flag reports whether
/// the manifest was mutated this way (the caller must persist it even on
/// an otherwise empty plan).
///
/// With `force`, every stored digest is treated as mismatched so the whole
/// set is re-uploaded through the standard delete+upload path.
pub fn compute_plan(
    docs: &[ContentDocument],
    manifest: &mut Manifest,
    impact: Option<&HashSet<String>>,
    force: bool,
) -> (ReconcilePlan, bool) {
    let current: BTreeMap<String, &ContentDocument> = docs
        .iter()
        .map(|doc| (doc.source_id.to_string(), doc))
        .collect();

    let mut plan = ReconcilePlan::default();
    let mut resolved = false;

    // Entries whose source no longer exists.
    for id in manifest.files.keys() {
        if !current.contains_key(id) {
            plan.to_delete.push(id.clone());
        }
    }

    for (id, doc) in &current {
        let digest = doc.digest();
        match manifest.files.get_mut(id) {
            None => {
                plan.to_upload.push((*doc).clone());
            }
            Some(_) if force => {
                plan.to_delete.push(id.clone());
                plan.to_upload.push((*doc).clone());
            }
            Some(entry) if entry.sha256 == UNKNOWN_DIGEST => {
                let flagged = impact.map_or(false, |changed| changed.contains(id));
                if flagged {
                    debug!(source_id = %id, "unconfirmed entry flagged changed; replacing");
                    plan.to_delete.push(id.clone());
                    plan.to_upload.push((*doc).clone());
                } else {
                    // Presumed unchanged; confirm the digest in place.
                    entry.sha256 = digest;
                    resolved = true;
                }
            }
            Some(entry) if entry.sha256 != digest => {
                plan.to_delete.push(id.clone());
                plan.to_upload.push((*doc).clone());
            }
            Some(_) => {}
        }
    }

    (plan, resolved)
}

/// Recover a manifest from the remote file listing after the local state
/// was lost (or belongs to a different store).
///
/// Filenames are mapped back to source ids through the current document
/// set first (exact filename match, immune to the dash/slash ambiguity of
/// the route encoding), falling back to the pure inverse decoding for
/// files with no current counterpart. Every recovered entry gets the
/// `UNKNOWN` digest; unrecognized files are left orphaned and untracked.
pub async fn rebuild_manifest(
    index: &dyn VectorIndex,
    store_id: &str,
    docs: &[ContentDocument],
) -> StoreResult<Manifest> {
    let by_filename: BTreeMap<String, &SourceId> = docs
        .iter()
        .map(|doc| (doc.source_id.remote_filename(), &doc.source_id))
        .collect();

    let mut manifest = Manifest::new(store_id.to_string());
    let remote_files = index.list_files(store_id).await?;
    info!(
        store_id,
        remote_files = remote_files.len(),
        "rebuilding manifest from remote listing"
    );

    for file in remote_files {
        let source_id = by_filename
            .get(&file.filename)
            .map(|id| (*id).clone())
            .or_else(|| SourceId::decode_remote_filename(&file.filename));

        match source_id {
            Some(id) => {
                manifest.files.insert(
                    id.to_string(),
                    ManifestEntry {
                        file_id: file.id,
                        sha256: UNKNOWN_DIGEST.to_string(),
                        url: id.display_url(),
                        kind: id.kind().as_str().to_string(),
                    },
                );
            }
            None => {
                warn!(
                    filename = %file.filename,
                    file_id = %file.id,
                    "remote file matches no naming convention; left untracked"
                );
            }
        }
    }

    Ok(manifest)
}

/// Execute a plan: deletions first, then uploads, each sequential.
///
/// Individual failures are logged and skipped so one bad item never
/// aborts the batch; a failed delete keeps its entry (retried next run)
/// and a failed upload leaves no entry (retried next run). The manifest
/// is saved after the delete batch and again after the upload batch.
pub async fn execute_plan(
    index: &dyn VectorIndex,
    manifest_store: &ManifestStore,
    manifest: &mut Manifest,
    plan: ReconcilePlan,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for id in &plan.to_delete {
        let Some(entry) = manifest.files.get(id) else {
            debug!(source_id = %id, "no manifest entry for planned delete; nothing to do");
            continue;
        };
        match index
            .detach_and_delete_file(&manifest.vector_store_id, &entry.file_id)
            .await
        {
            Ok(()) => {
                info!(source_id = %id, operation = "delete", "removed remote artifact");
                manifest.files.remove(id);
                report.deleted += 1;
            }
            Err(e) => {
                warn!(
                    source_id = %id,
                    operation = "delete",
                    error = %e,
                    "delete failed; entry kept for retry on next run"
                );
                report.delete_failures += 1;
            }
        }
    }
    manifest_store.save(manifest)?;

    for doc in &plan.to_upload {
        let id = doc.source_id.to_string();
        let filename = doc.source_id.remote_filename();
        match upload_one(index, &manifest.vector_store_id, doc, &filename).await {
            Ok(file_id) => {
                info!(source_id = %id, operation = "upload", file_id = %file_id, "uploaded");
                manifest.files.insert(
                    id,
                    ManifestEntry {
                        file_id,
                        sha256: doc.digest(),
                        url: doc.display_url.clone(),
                        kind: doc.source_id.kind().as_str().to_string(),
                    },
                );
                report.uploaded += 1;
            }
            Err(e) => {
                warn!(
                    source_id = %id,
                    operation = "upload",
                    error = %e,
                    "upload failed; will retry on next run"
                );
                report.upload_failures += 1;
            }
        }
    }
    manifest_store.save(manifest)?;

    Ok(report)
}

/// Create the remote file and attach it to the store. The manifest entry
/// is only written by the caller once both steps succeeded; on attach
/// failure the freshly created file is deleted best-effort so it does not
/// linger unattached.
async fn upload_one(
    index: &dyn VectorIndex,
    store_id: &str,
    doc: &ContentDocument,
    filename: &str,
) -> StoreResult<String> {
    let file_id = index.upload_file(filename, &doc.upload_payload()).await?;
    if let Err(e) = index.attach_file(store_id, &file_id).await {
        if let Err(cleanup) = index.detach_and_delete_file(store_id, &file_id).await {
            debug!(file_id = %file_id, error = %cleanup, "cleanup of unattached file failed");
        }
        return Err(e);
    }
    Ok(file_id)
}
