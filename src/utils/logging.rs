use std::{
    fs::{self, File, OpenOptions},
    io,
    path::Path,
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the level chosen by `debug`. With `log_file` set,
/// output goes to that file (appended, no ANSI colours) instead of stderr.
pub fn init(debug: bool, log_file: Option<&str>) -> io::Result<()> {
    let default_filter = if debug {
        "kube_gate=debug,tower_http=debug,info"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match log_file {
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(path)?))
            .try_init(),
        None => builder.with_writer(io::stderr).try_init(),
    };

    result.map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

fn open_log_file(log_file: &str) -> io::Result<File> {
    // Create log directory if it doesn't exist
    if let Some(parent) = Path::new(log_file).parent() {
        fs::create_dir_all(parent)?;
    }

    OpenOptions::new().create(true).append(true).open(log_file)
}
