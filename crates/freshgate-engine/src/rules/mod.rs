pub mod classifier;

pub use classifier::{CommandClassifier, PathClassifier};
