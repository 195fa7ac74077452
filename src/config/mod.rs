mod types;

pub use types::{resolve_kubeconfig_path, AppConfig};
