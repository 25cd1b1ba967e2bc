//! In-memory index service with scriptable failures.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use convomap_core::error::IndexError;
use convomap_core::locate::{IndexSnapshot, SnapshotRecord};
use convomap_core::service::{IndexHandle, IndexService};
use convomap_core::types::{IndexDescriptor, IndexedRecord, RowId};
use parking_lot::Mutex;

#[derive(Default)]
struct StubIndexState {
    courses: HashMap<String, Vec<IndexedRecord>>,
    open_errors: VecDeque<IndexError>,
    open_calls: u32,
    bulk_creates: u32,
    rebuilds: u32,
    deleted_row_ids: Vec<RowId>,
    lock_held: bool,
}

/// Scriptable in-memory stand-in for the remote embedding-index service.
///
/// Writes are rejected unless the lock is held, so tests catch executor
/// ordering mistakes.
#[derive(Clone, Default)]
pub struct StubIndexService {
    inner: Arc<Mutex<StubIndexState>>,
}

impl StubIndexService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service where the course already has an (empty) index.
    pub fn with_course(course: &str) -> Self {
        let service = Self::new();
        service
            .inner
            .lock()
            .courses
            .insert(course.to_string(), Vec::new());
        service
    }

    /// Pre-populate a course's index with records.
    pub fn seed(&self, course: &str, records: Vec<IndexedRecord>) {
        self.inner.lock().courses.insert(course.to_string(), records);
    }

    /// Script the next `times` open calls to fail with contention.
    pub fn fail_open_with_contention(&self, times: u32) {
        let mut state = self.inner.lock();
        for _ in 0..times {
            state
                .open_errors
                .push_back(IndexError::Contention("project is indexing".to_string()));
        }
    }

    /// Script the next open call to fail with an arbitrary error.
    pub fn push_open_error(&self, error: IndexError) {
        self.inner.lock().open_errors.push_back(error);
    }

    pub fn records(&self, course: &str) -> Vec<IndexedRecord> {
        self.inner
            .lock()
            .courses
            .get(course)
            .cloned()
            .unwrap_or_default()
    }

    pub fn open_calls(&self) -> u32 {
        self.inner.lock().open_calls
    }

    pub fn bulk_creates(&self) -> u32 {
        self.inner.lock().bulk_creates
    }

    pub fn rebuilds(&self) -> u32 {
        self.inner.lock().rebuilds
    }

    pub fn deleted_row_ids(&self) -> Vec<RowId> {
        self.inner.lock().deleted_row_ids.clone()
    }

    pub fn lock_held(&self) -> bool {
        self.inner.lock().lock_held
    }
}

#[async_trait]
impl IndexService for StubIndexService {
    async fn open(&self, course: &str) -> Result<Box<dyn IndexHandle>, IndexError> {
        let mut state = self.inner.lock();
        state.open_calls += 1;
        if let Some(error) = state.open_errors.pop_front() {
            return Err(error);
        }
        if !state.courses.contains_key(course) {
            return Err(IndexError::NotConfigured(format!(
                "no index for course {course}"
            )));
        }
        Ok(Box::new(StubIndexHandle {
            course: course.to_string(),
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn bulk_create(
        &self,
        course: &str,
        records: &[IndexedRecord],
    ) -> Result<(), IndexError> {
        let mut state = self.inner.lock();
        state.bulk_creates += 1;
        state.courses.insert(course.to_string(), records.to_vec());
        Ok(())
    }

    async fn descriptor(&self, course: &str) -> Result<IndexDescriptor, IndexError> {
        let state = self.inner.lock();
        if !state.courses.contains_key(course) {
            return Err(IndexError::NotConfigured(format!(
                "no index for course {course}"
            )));
        }
        Ok(IndexDescriptor {
            index_id: Some(format!("iframe-{course}")),
            index_link: Some(format!("https://maps.example/{course}")),
        })
    }
}

struct StubIndexHandle {
    course: String,
    inner: Arc<Mutex<StubIndexState>>,
}

#[async_trait]
impl IndexHandle for StubIndexHandle {
    async fn snapshot(&self) -> Result<IndexSnapshot, IndexError> {
        let state = self.inner.lock();
        let records = state
            .courses
            .get(&self.course)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|record| SnapshotRecord {
                row_id: record.row_id,
                conversation_id: record.conversation_id,
                transcript: record.transcript,
                first_query: record.first_query,
                created_at: record.created_at,
                embedding: record.embedding,
            })
            .collect();
        Ok(IndexSnapshot::new(records))
    }

    async fn acquire_lock(&self) -> Result<(), IndexError> {
        self.inner.lock().lock_held = true;
        Ok(())
    }

    async fn release_lock(&self) -> Result<(), IndexError> {
        self.inner.lock().lock_held = false;
        Ok(())
    }

    async fn delete(&self, row_ids: &[RowId]) -> Result<(), IndexError> {
        let mut state = self.inner.lock();
        state.deleted_row_ids.extend_from_slice(row_ids);
        if let Some(records) = state.courses.get_mut(&self.course) {
            records.retain(|record| !row_ids.contains(&record.row_id));
        }
        Ok(())
    }

    async fn add(&self, records: &[IndexedRecord]) -> Result<(), IndexError> {
        let mut state = self.inner.lock();
        if !state.lock_held {
            return Err(IndexError::Remote("add without write lock".to_string()));
        }
        state
            .courses
            .entry(self.course.clone())
            .or_default()
            .extend_from_slice(records);
        Ok(())
    }

    async fn rebuild(&self) -> Result<(), IndexError> {
        let mut state = self.inner.lock();
        if !state.lock_held {
            return Err(IndexError::Remote("rebuild without write lock".to_string()));
        }
        state.rebuilds += 1;
        Ok(())
    }
}
