// types.rs
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Kubeconfig to read contexts from [default: $KUBECONFIG or ~/.kube/config]
    #[arg(short, long)]
    pub kubeconfig: Option<String>,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Address to bind the web server to
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: String,

    /// ClusterRole a user must be bound to
    #[arg(long, env = "ACCESS_ROLE")]
    pub access_role: Option<String>,

    /// Timeout in seconds for each request to the API server
    #[arg(long, default_value_t = 10)]
    pub request_timeout: u64,

    /// Session lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    pub session_ttl: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<String>,
}
