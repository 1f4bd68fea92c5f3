//! SLA persistence seam.
//!
//! The durable record is owned by a persistence collaborator behind
//! [`SlaStore`]. Writes are optimistic: callers present the revision they
//! read, and the store rejects the write with [`StoreError::Conflict`] if
//! someone else wrote first.
//!
//! [`InMemorySlaStore`] keeps statuses in an `Arc<RwLock<HashMap>>`. The lock
//! is `parking_lot`, never held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use oficio_core::FileId;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::status::SlaStatus;

/// Durable storage for SLA statuses, keyed by file.
pub trait SlaStore: Send + Sync {
    /// Current status for `file_id`, if any.
    fn get(&self, file_id: &FileId) -> Result<Option<SlaStatus>, StoreError>;

    /// Store a new status at revision 1. Fails if one already exists.
    fn insert(&self, status: SlaStatus) -> Result<SlaStatus, StoreError>;

    /// Replace the status if its stored revision is still `expected`.
    /// Returns the stored value with its new revision.
    fn compare_and_swap(&self, expected: u64, status: SlaStatus) -> Result<SlaStatus, StoreError>;

    /// Files whose SLA is unresolved, in identifier order.
    fn active_ids(&self) -> Result<Vec<FileId>, StoreError>;
}

/// In-process store. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySlaStore {
    data: Arc<RwLock<HashMap<FileId, SlaStatus>>>,
}

impl InMemorySlaStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored statuses.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SlaStore for InMemorySlaStore {
    fn get(&self, file_id: &FileId) -> Result<Option<SlaStatus>, StoreError> {
        Ok(self.data.read().get(file_id).cloned())
    }

    fn insert(&self, mut status: SlaStatus) -> Result<SlaStatus, StoreError> {
        let mut guard = self.data.write();
        if guard.contains_key(&status.file_id) {
            return Err(StoreError::AlreadyExists {
                file_id: status.file_id,
            });
        }
        status.revision = 1;
        guard.insert(status.file_id.clone(), status.clone());
        Ok(status)
    }

    fn compare_and_swap(&self, expected: u64, mut status: SlaStatus) -> Result<SlaStatus, StoreError> {
        let mut guard = self.data.write();
        let current = guard
            .get_mut(&status.file_id)
            .ok_or_else(|| StoreError::NotFound {
                file_id: status.file_id.clone(),
            })?;
        if current.revision != expected {
            return Err(StoreError::Conflict {
                file_id: status.file_id,
                expected,
                actual: current.revision,
            });
        }
        status.revision = expected + 1;
        *current = status.clone();
        Ok(status)
    }

    fn active_ids(&self) -> Result<Vec<FileId>, StoreError> {
        let mut ids: Vec<FileId> = self
            .data
            .read()
            .values()
            .filter(|s| s.is_active())
            .map(|s| s.file_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
