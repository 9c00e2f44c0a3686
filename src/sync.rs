//! Sync orchestration.
//!
//! Coordinates the full pipeline for one run: collect documents, load (or
//! recover) the manifest, estimate change impact, compute the plan, apply
//! it against the remote store, and wait briefly for indexing. The fast
//! paths never touch the network: a dry run plans only, and an up-to-date
//! manifest short-circuits before the gateway is even constructed.

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use crate::collect;
use crate::config::Config;
use crate::impact;
use crate::manifest::{Manifest, ManifestStore};
use crate::models::ContentDocument;
use crate::reconcile;
use crate::vector_store::{IndexStatus, OpenAiVectorStore, VectorIndex, STORE_ID_ENV};

/// When set to `true` or `1`, `sync` exits successfully without touching
/// anything. Used to bypass the pipeline for local or emergency builds.
pub const SKIP_ENV: &str = "SKIP_SYNC";

/// When set, a failed sync exits nonzero instead of warning. The default
/// is lenient: a stale index is preferable to a blocked deployment.
pub const STRICT_ENV: &str = "SYNC_STRICT";

pub fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("True")
    )
}

pub async fn run_sync(config: &Config, dry_run: bool, full: bool) -> Result<()> {
    if env_flag(SKIP_ENV) {
        println!("sync skipped ({}=true)", SKIP_ENV);
        return Ok(());
    }

    let docs = collect::collect_all(config)?;
    info!(documents = docs.len(), "collected content documents");

    let manifest_store = ManifestStore::resolve(config);
    let target_store_id = std::env::var(STORE_ID_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| config.store.vector_store_id.clone());

    let mut gateway: Option<OpenAiVectorStore> = None;

    let (mut manifest, rebuilt) = match (manifest_store.load(), &target_store_id) {
        (Some(m), Some(target)) if &m.vector_store_id != target => {
            info!(
                manifest_store_id = %m.vector_store_id,
                target_store_id = %target,
                "manifest belongs to a different store; rebuilding from remote"
            );
            rebuild_or_assume_empty(config, target, &docs, dry_run).await?
        }
        (Some(m), _) => (m, false),
        (None, Some(target)) => {
            info!(target_store_id = %target, "no manifest; rebuilding from remote");
            rebuild_or_assume_empty(config, target, &docs, dry_run).await?
        }
        (None, None) => {
            if dry_run {
                println!("note: no manifest and no known vector store; planning against an empty index");
                (Manifest::new(String::new()), false)
            } else {
                let g = OpenAiVectorStore::from_config(config)?;
                let id = g.create_or_get_store(&config.store.name).await?;
                info!(store_id = %id, name = %config.store.name, "created vector store");
                gateway = Some(g);
                // Persist right away so a crash cannot lose the store id.
                let manifest = Manifest::new(id);
                manifest_store.save(&manifest)?;
                (manifest, true)
            }
        }
    };

    // Impact hints are only worth computing while unconfirmed digests
    // remain from a rebuild.
    let impact = if manifest.has_unresolved_digests() {
        impact::changed_source_ids(config)
    } else {
        None
    };

    let (plan, resolved) = reconcile::compute_plan(&docs, &mut manifest, impact.as_ref(), full);

    println!("sync{}", if dry_run { " (dry-run)" } else { "" });
    println!("  documents: {}", docs.len());
    println!("  to upload: {}", plan.to_upload.len());
    println!("  to delete: {}", plan.to_delete.len());

    if dry_run {
        for doc in &plan.to_upload {
            println!("    + {}", doc.source_id);
        }
        for id in &plan.to_delete {
            println!("    - {}", id);
        }
        println!("ok");
        return Ok(());
    }

    if plan.is_empty() {
        if rebuilt || resolved {
            manifest_store.save(&manifest)?;
        }
        println!("  up to date");
        println!("ok");
        return Ok(());
    }

    let gateway = match gateway {
        Some(g) => g,
        None => OpenAiVectorStore::from_config(config)?,
    };

    let report = reconcile::execute_plan(&gateway, &manifest_store, &mut manifest, plan).await?;

    if report.uploaded > 0 {
        let timeout = Duration::from_secs(config.store.wait_timeout_secs);
        match gateway
            .wait_until_processed(&manifest.vector_store_id, timeout)
            .await
        {
            Ok(IndexStatus::Ready) => info!("index processing complete"),
            Ok(IndexStatus::PartiallyFailed) => {
                warn!("index reports failed files after processing; search may miss content")
            }
            Ok(IndexStatus::TimedOut) => warn!(
                timeout_secs = config.store.wait_timeout_secs,
                "index still processing at timeout; sync is already recorded"
            ),
            Err(e) => warn!(error = %e, "could not confirm index processing"),
        }
    }

    println!("  uploaded: {}", report.uploaded);
    println!("  deleted: {}", report.deleted);
    if report.failures() > 0 {
        println!("  failed: {} (will retry on next run)", report.failures());
    }
    println!("  manifest: {}", manifest_store.path().display());
    println!("ok");
    Ok(())
}

/// Rebuild the manifest from the remote listing; on a dry run where the
/// gateway cannot even be constructed (no API key), fall back to planning
/// against an empty index instead of failing.
async fn rebuild_or_assume_empty(
    config: &Config,
    target: &str,
    docs: &[ContentDocument],
    dry_run: bool,
) -> Result<(Manifest, bool)> {
    match OpenAiVectorStore::from_config(config) {
        Ok(gateway) => {
            let manifest = reconcile::rebuild_manifest(&gateway, target, docs).await?;
            Ok((manifest, true))
        }
        Err(e) if dry_run => {
            warn!(error = %e, "cannot list remote files; planning against an empty index");
            Ok((Manifest::new(target.to_string()), false))
        }
        Err(e) => Err(e.into()),
    }
}
