use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;

/// Write content atomically: write to temp file, fsync, rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let temp_path = dir.join(format!(".{}.tmp", nanos_hex()));

    let mut file = std::fs::File::create(&temp_path)
        .with_context(|| format!("cannot create temp file for {}", path.display()))?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("cannot rename temp to {}", path.display()))?;

    Ok(())
}

/// Advisory lock for lock-record files. Prevents concurrent writers.
///
/// Creates a `.lock` file alongside the record. The lock file contains the
/// PID and timestamp; a lock older than 60 seconds is reclaimed.
pub struct AdvisoryLock {
    lock_path: String,
}

impl AdvisoryLock {
    /// Acquire an advisory lock. Returns error if the lock is already held.
    pub fn acquire(record_path: &Path) -> Result<Self> {
        let lock_path = format!("{}.lock", record_path.display());

        if Path::new(&lock_path).exists() {
            let content = std::fs::read_to_string(&lock_path).unwrap_or_default();
            if let Some(ts_str) = content.lines().nth(1) {
                if let Ok(ts) = ts_str.parse::<i64>() {
                    let now = chrono::Utc::now().timestamp();
                    if now - ts > 60 {
                        let _ = std::fs::remove_file(&lock_path);
                    } else {
                        bail!("record is locked by another process (lock: {lock_path})");
                    }
                }
            }
        }

        let pid = std::process::id();
        let ts = chrono::Utc::now().timestamp();
        let lock_content = format!("{pid}\n{ts}\n");
        std::fs::write(&lock_path, lock_content)
            .with_context(|| format!("cannot acquire lock {lock_path}"))?;

        Ok(Self { lock_path })
    }
}

impl Drop for AdvisoryLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lock_path);
    }
}

/// Nanosecond counter for unique temp file names.
fn nanos_hex() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{nanos:x}")
}
