use std::io::ErrorKind;
use std::path::Path;

use freshgate_core::errors::LockError;
use freshgate_core::types::Persistence;

use super::atomic::{atomic_write, AdvisoryLock};

/// Persistence capability for lock records.
///
/// Two implementations: `BestEffortStore` writes and hopes; `AtomicStore`
/// opts into rename-on-write plus an advisory lock. Gate logic is
/// identical under either; the choice is configuration (`persistence`),
/// not code.
pub trait LockStore {
    /// Persist a record, creating parent directories as needed.
    fn write(&self, path: &Path, content: &str) -> Result<(), LockError>;

    /// Read a record. Missing files are `NotFound`; other I/O failures are
    /// `Io`. Callers treat both as "no valid precondition".
    fn read(&self, path: &Path) -> Result<String, LockError>;
}

/// Plain `std::fs::write`. A reader racing this writer may observe a torn
/// record, which it will report as corrupt and treat as absent.
pub struct BestEffortStore;

impl LockStore for BestEffortStore {
    fn write(&self, path: &Path, content: &str) -> Result<(), LockError> {
        ensure_parent(path)?;
        std::fs::write(path, content).map_err(|e| io_error(path, e))
    }

    fn read(&self, path: &Path) -> Result<String, LockError> {
        read_record(path)
    }
}

/// Temp-file + fsync + rename behind an advisory lock.
pub struct AtomicStore;

impl LockStore for AtomicStore {
    fn write(&self, path: &Path, content: &str) -> Result<(), LockError> {
        ensure_parent(path)?;
        let _lock = AdvisoryLock::acquire(path)
            .map_err(|e| LockError::Io(path.display().to_string(), e.to_string()))?;
        atomic_write(path, content.as_bytes())
            .map_err(|e| LockError::Io(path.display().to_string(), e.to_string()))
    }

    fn read(&self, path: &Path) -> Result<String, LockError> {
        read_record(path)
    }
}

/// Store selected by configuration.
pub fn for_persistence(persistence: Persistence) -> Box<dyn LockStore> {
    match persistence {
        Persistence::BestEffort => Box::new(BestEffortStore),
        Persistence::Atomic => Box::new(AtomicStore),
    }
}

fn read_record(path: &Path) -> Result<String, LockError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(LockError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(io_error(path, e)),
    }
}

fn ensure_parent(path: &Path) -> Result<(), LockError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
        }
    }
    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> LockError {
    LockError::Io(path.display().to_string(), e.to_string())
}
