//! Utility modules

pub mod fuzzy;

pub use fuzzy::{contains_either, normalize_text, similarity};
