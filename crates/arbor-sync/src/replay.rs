#![forbid(unsafe_code)]

//! Atomic replay of a captured mutation log.
//!
//! Replay is two-phase: every record is validated against the current
//! tree before anything is applied, so a mismatch applies zero records.
//! The tree must have been constructed via the identical deterministic
//! id-generation path used at capture time.
//!
//! Watchers are not re-fired during replay: their side effects at capture
//! time were themselves recorded as later records, and re-firing would
//! double them.

use crate::error::ReplayError;
use crate::recorder::MutationRecord;
use crate::tree::Tree;

/// Reapply `records`, in sequence order, to a freshly constructed tree.
///
/// On success the tree's observable state equals the one that existed at
/// capture time, and capture is re-armed so later interaction is recorded
/// for a subsequent transfer.
///
/// # Errors
///
/// Any record whose target id is absent aborts the whole replay before a
/// single write ([`ReplayError::UnknownElement`]); the caller must discard
/// the log and force a full rebuild. Adapter failures mid-apply surface as
/// [`ReplayError::Tree`] and likewise require a rebuild.
pub fn replay(tree: &mut Tree, records: &[MutationRecord]) -> Result<(), ReplayError> {
    for record in records {
        if !tree.contains(record.target) {
            tracing::error!(
                target: "arbor.replay",
                seq = record.seq,
                element = %record.target,
                "replay mismatch: record targets an element absent from this tree"
            );
            return Err(ReplayError::UnknownElement {
                seq: record.seq,
                id: record.target,
            });
        }
    }

    for record in records {
        tree.apply_replayed(record)?;
    }

    tree.capture();
    tracing::debug!(
        target: "arbor.replay",
        records = records.len(),
        "replay complete; capture re-armed"
    );
    Ok(())
}
