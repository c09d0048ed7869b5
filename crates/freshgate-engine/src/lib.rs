#![forbid(unsafe_code)]

//! Gate evaluation engine: classify an intercepted action, consult or
//! refresh a persisted lock record, and return an allow/deny decision.
//!
//! Pattern classification over free-text commands is a best-effort
//! heuristic for a cooperative caller, not a security boundary.

pub mod gates;
pub mod rules;
pub mod state;
