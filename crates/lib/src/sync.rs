//! One-way reconciliation from a local store into the remote document.
//!
//! Accounts registered while the remote was unreachable live only in the
//! local store. Reconciliation pushes them up: every local record whose
//! email has no remote counterpart is appended to the remote set under a
//! fresh id, marked as having arrived via sync. The remote copy wins on
//! conflict; no fields are merged, and a local edit to an email that also
//! exists remotely is simply lost. The local store is never modified.

use std::sync::Arc;

use crate::Result;
use crate::clock::Clock;
use crate::store::RecordStore;
use crate::types::new_user_id;

/// What a reconciliation run did.
#[derive(Clone, Debug, Default)]
pub struct SyncReport {
    /// How many local records were pushed to the remote set.
    pub pushed: usize,
    /// Size of the remote set after the run.
    pub remote_total: usize,
    /// The emails that were pushed, for reporting.
    pub pushed_emails: Vec<String>,
}

/// Pushes locally registered accounts into the remote record set.
pub struct SyncCoordinator {
    clock: Arc<dyn Clock>,
}

impl SyncCoordinator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Merge local-only records into the remote set and save it.
    ///
    /// The merged set is written back even when nothing was pushed, which
    /// refreshes the remote document's update marker.
    pub async fn reconcile(
        &self,
        local: &dyn RecordStore,
        remote: &dyn RecordStore,
    ) -> Result<SyncReport> {
        let local_set = local.get_all().await?;
        let remote_set = remote.get_all().await?;

        let mut merged = remote_set.records;
        let mut pushed_emails = Vec::new();

        for record in &local_set.records {
            if merged.iter().any(|r| r.email == record.email) {
                continue;
            }

            // A fresh id keeps the pushed copy distinct from the device-local
            // one; the marker records how it got there.
            let mut pushed = record.clone();
            pushed.id = new_user_id(self.clock.as_ref());
            pushed.synced_from_local = true;
            pushed_emails.push(pushed.email.clone());
            merged.push(pushed);
        }

        remote.save_all(&merged).await?;

        let report = SyncReport {
            pushed: pushed_emails.len(),
            remote_total: merged.len(),
            pushed_emails,
        };

        tracing::info!(
            pushed = report.pushed,
            remote_total = report.remote_total,
            "Reconciliation complete"
        );
        Ok(report)
    }
}
