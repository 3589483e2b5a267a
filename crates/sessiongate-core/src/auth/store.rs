use std::sync::Arc;

use tracing::{debug, warn};

use super::SessionRecord;
use crate::storage::{Storage, StorageError};

/// Storage key holding the serialized session record.
pub const SESSION_KEY: &str = "session_active";

/// Reads and writes the single session record.
///
/// Content problems (garbage JSON, missing fields) heal themselves: the entry
/// is deleted and the read reports no session. Only failures of the medium
/// itself come back as errors.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn read(&self) -> Result<Option<SessionRecord>, StorageError> {
        let Some(raw) = self.storage.get(SESSION_KEY)? else {
            debug!("No stored session");
            return Ok(None);
        };

        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(error = %e, "Discarding malformed session record");
                self.storage.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn write(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let contents =
            serde_json::to_string(record).map_err(|source| StorageError::Serialize {
                key: SESSION_KEY.to_string(),
                source,
            })?;
        self.storage.set(SESSION_KEY, &contents)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(SESSION_KEY)
    }
}
