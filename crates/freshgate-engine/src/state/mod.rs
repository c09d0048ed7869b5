pub mod atomic;
pub mod decision_log;
pub mod record;
pub mod store;

pub use record::{EvidenceRecord, ValidationStamp};
pub use store::{AtomicStore, BestEffortStore, LockStore};
