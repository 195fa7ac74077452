// src/main.rs
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use kube_gate::{
    app::AuthFlow,
    auth::{AuthenticationProbe, SessionStore},
    config::AppConfig,
    kubeconfig::ConfigStore,
    types::Args,
    utils::logging,
    web::{self, WebServerState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    let config = AppConfig::from_args(args);

    logging::init(config.debug, config.log_file.as_deref())
        .context("failed to initialise logging")?;

    // A missing kubeconfig is fine; one that does not parse is not.
    let store = ConfigStore::load_from_file(&config.kubeconfig_path).with_context(|| {
        format!(
            "failed to parse kubeconfig {}",
            config.kubeconfig_path.display()
        )
    })?;
    if store.as_ref().map_or(true, ConfigStore::is_empty) {
        info!("No kubeconfig found or no contexts available. Application running without kubeconfig.");
    }
    if config.access_role.is_none() {
        warn!("ACCESS_ROLE is not set; every authorization check will be denied");
    }

    let flow = AuthFlow::new(
        store.map(Arc::new),
        AuthenticationProbe::new(config.request_timeout),
        config.access_role.clone(),
    );
    let state = Arc::new(WebServerState::new(
        flow,
        SessionStore::new(config.session_ttl),
    ));

    // Create shutdown channel and trigger it on Ctrl-C
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                // Keep the sender alive so the server is not stopped.
                warn!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });

    web::start_web_server(state, &config.listen_addr(), shutdown_rx)
        .await
        .with_context(|| format!("web server on {} failed", config.listen_addr()))?;

    Ok(())
}
