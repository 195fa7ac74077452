// config/types.rs
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::Args;

/// Runtime settings, resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub kubeconfig_path: PathBuf,
    pub bind: String,
    pub port: u16,
    pub access_role: Option<String>,
    pub request_timeout: Duration,
    pub session_ttl: Duration,
    pub debug: bool,
    pub log_file: Option<String>,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Self {
        Self {
            kubeconfig_path: resolve_kubeconfig_path(
                args.kubeconfig.as_deref(),
                std::env::var_os("KUBECONFIG"),
            ),
            bind: args.bind,
            port: args.port,
            access_role: args.access_role.filter(|r| !r.trim().is_empty()),
            request_timeout: Duration::from_secs(args.request_timeout.max(1)),
            session_ttl: Duration::from_secs(args.session_ttl),
            debug: args.debug,
            log_file: args.log_file,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// `--kubeconfig` wins, then the first entry of `$KUBECONFIG`, then
/// `~/.kube/config`.
pub fn resolve_kubeconfig_path(explicit: Option<&str>, env: Option<OsString>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(shellexpand::tilde(path).to_string());
    }

    if let Some(first) = env
        .as_deref()
        .and_then(|list| std::env::split_paths(list).find(|p| !p.as_os_str().is_empty()))
    {
        return first;
    }

    dirs::home_dir()
        .unwrap_or_default()
        .join(".kube")
        .join("config")
}
