//! Serialization of results for output and caching.

pub mod yaml;

pub use yaml::{from_yaml, to_yaml};
