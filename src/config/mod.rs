// src/config/mod.rs
pub mod publisher;

pub use publisher::{load_config_default, load_config_from, PublisherConfig};
