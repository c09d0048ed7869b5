#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("no lock record at {0}")]
    NotFound(String),
    #[error("lock record at {0} is unreadable: {1}")]
    Corrupt(String, String),
    #[error("lock I/O failure at {0}: {1}")]
    Io(String, String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {0}: {1}")]
    Unreadable(String, String),
    #[error("{0}: invalid config JSON: {1}")]
    Invalid(String, String),
}
