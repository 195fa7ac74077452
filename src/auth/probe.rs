// src/auth/probe.rs
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::cert::CredentialBundle;
use crate::error::{Error, Result};

/// HTTPS client bound to one cluster and presenting one client identity.
#[derive(Debug)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    server_url: Url,
}

impl ControlPlaneClient {
    /// Builds the TLS client from a credential bundle.
    ///
    /// Only the bundle's CA pool is trusted; the platform roots are disabled.
    /// `timeout` bounds connect and the whole request.
    pub fn new(bundle: CredentialBundle, timeout: Duration) -> Result<Self> {
        let (server_url, identity, ca_pool) = bundle.into_parts();

        let mut builder = reqwest::Client::builder()
            .use_native_tls()
            .tls_built_in_root_certs(false)
            .identity(identity)
            .connect_timeout(timeout)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none());
        for ca in ca_pool {
            builder = builder.add_root_certificate(ca);
        }

        let http = builder
            .build()
            .map_err(|e| Error::AuthFailure(format!("cannot build TLS client: {}", describe(&e))))?;

        Ok(Self { http, server_url })
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Resolves an API path below the server URL, keeping any path prefix
    /// the server URL carries (proxied API servers mount below one).
    pub fn endpoint(&self, path: &str) -> std::result::Result<Url, url::ParseError> {
        api_url(&self.server_url, path)
    }

    pub(crate) async fn get(&self, url: Url) -> reqwest::Result<reqwest::Response> {
        self.http.get(url).send().await
    }

    /// GETs `path` and decodes a JSON body, failing on any non-2xx status.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, String> {
        let url = self.endpoint(path).map_err(|e| e.to_string())?;
        let response = self.get(url.clone()).await.map_err(|e| describe(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("GET {} returned {}", url.path(), status));
        }

        response.json::<T>().await.map_err(|e| describe(&e))
    }
}

/// Successful probe: the status the server answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthResult {
    pub status: u16,
}

/// Single-shot mTLS check against a cluster's API server.
#[derive(Debug, Clone)]
pub struct AuthenticationProbe {
    timeout: Duration,
}

impl AuthenticationProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends one request to the server URL. Any transport or TLS error and
    /// any non-2xx status is an [`Error::AuthFailure`]. No retries.
    pub async fn verify(&self, bundle: CredentialBundle) -> Result<AuthResult> {
        let client = ControlPlaneClient::new(bundle, self.timeout)?;
        let url = client.server_url().clone();
        debug!(server = %url, "Probing API server");

        let response = client.get(url.clone()).await.map_err(|e| {
            let reason = describe(&e);
            warn!(server = %url, error = %reason, "mTLS probe failed");
            Error::AuthFailure(reason)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(server = %url, %status, "API server rejected probe");
            return Err(Error::AuthFailure(format!(
                "server answered with status {}",
                status
            )));
        }

        info!(server = %url, %status, "mTLS probe succeeded");
        Ok(AuthResult {
            status: status.as_u16(),
        })
    }
}

fn api_url(server_url: &Url, path: &str) -> std::result::Result<Url, url::ParseError> {
    let mut base = server_url.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
}

/// reqwest's Display stops at the outermost error; TLS failures live in the
/// source chain.
pub(crate) fn describe(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
