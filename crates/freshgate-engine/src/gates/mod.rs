pub mod evidence;
pub mod freshness;
pub mod message;
pub mod restart;

pub use evidence::EvidenceGate;
pub use restart::RestartGate;
