// Single-run lock for the ingestion pipeline

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{IngestError, Result};

/// Allows at most one ingestion run at a time
///
/// Clones share the same lock. Whoever owns the pipeline creates one guard and
/// passes it in; a second `try_acquire` while a run holds the permit fails
/// with [`IngestError::RunInProgress`] instead of waiting.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    lock: Arc<Mutex<()>>,
}

/// Held for the duration of one run; dropping it releases the lock
#[derive(Debug)]
pub struct RunPermit {
    _guard: OwnedMutexGuard<()>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Result<RunPermit> {
        self.lock
            .clone()
            .try_lock_owned()
            .map(|guard| RunPermit { _guard: guard })
            .map_err(|_| IngestError::RunInProgress)
    }

    pub fn is_running(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}
