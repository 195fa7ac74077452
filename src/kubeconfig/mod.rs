// src/kubeconfig/mod.rs
mod store;
mod types;

pub use store::ConfigStore;
pub use types::{ClusterEntry, ContextEntry, UserEntry};
