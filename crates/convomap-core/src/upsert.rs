//! Guarded writes against the remote index.

use log::debug;

use crate::error::IndexError;
use crate::service::{IndexHandle, IndexService};
use crate::types::{IndexedRecord, RowId};

/// Commit one new or merged record to an existing course index.
///
/// A prior point is deleted by row id first (the remote store has no in-place
/// update), then the record is added and the index rebuilt while holding the
/// write lock. The lock is released on both success and failure paths.
pub async fn commit_incremental(
    handle: &dyn IndexHandle,
    prior_row_id: Option<RowId>,
    record: &IndexedRecord,
) -> Result<(), IndexError> {
    if let Some(row_id) = prior_row_id {
        debug!(
            "deleting prior index point (conversation_id={}, row_id={row_id})",
            record.conversation_id
        );
        handle.delete(&[row_id]).await?;
    }

    handle.acquire_lock().await?;
    let written = add_and_rebuild(handle, record).await;
    let released = handle.release_lock().await;
    written?;
    released
}

/// Add the record and rebuild derived structure, assuming the lock is held.
async fn add_and_rebuild(
    handle: &dyn IndexHandle,
    record: &IndexedRecord,
) -> Result<(), IndexError> {
    handle.add(std::slice::from_ref(record)).await?;
    handle.rebuild().await
}

/// Create a course's index from its initial record set in one bulk call.
pub async fn commit_bootstrap(
    service: &dyn IndexService,
    course: &str,
    records: &[IndexedRecord],
) -> Result<(), IndexError> {
    debug!(
        "bulk-creating index (course={course}, records={})",
        records.len()
    );
    service.bulk_create(course, records).await
}
