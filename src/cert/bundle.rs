// src/cert/bundle.rs
use openssl::{hash::MessageDigest, pkey::PKey, x509::X509};
use std::fmt;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use super::secret::SecretMaterial;
use crate::error::{Error, Result};
use crate::kubeconfig::{ClusterEntry, UserEntry};

const CLIENT_CERT_FIELD: &str = "client-certificate-data";
const CLIENT_KEY_FIELD: &str = "client-key-data";
const CA_CERT_FIELD: &str = "certificate-authority-data";

/// Opaque mTLS credentials for one authentication attempt.
///
/// Holds only TLS objects built from the decoded PEM; the plaintext itself is
/// gone by the time a bundle exists. Consumed by the probe.
pub struct CredentialBundle {
    server_url: Url,
    identity: reqwest::Identity,
    ca_pool: Vec<reqwest::Certificate>,
}

impl CredentialBundle {
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub fn ca_count(&self) -> usize {
        self.ca_pool.len()
    }

    pub(crate) fn into_parts(self) -> (Url, reqwest::Identity, Vec<reqwest::Certificate>) {
        (self.server_url, self.identity, self.ca_pool)
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("server_url", &self.server_url.as_str())
            .field("identity", &"[REDACTED]")
            .field("ca_pool", &self.ca_pool.len())
            .finish()
    }
}

pub struct CredentialResolver;

impl CredentialResolver {
    /// Decodes a cluster/user pair into a [`CredentialBundle`].
    ///
    /// Decoded certificate, key and CA bytes live in [`SecretMaterial`]
    /// buffers owned by this call and are zeroed before it returns, on the
    /// error paths as well. `cluster` and `user` are only read.
    pub fn build(cluster: &ClusterEntry, user: &UserEntry) -> Result<CredentialBundle> {
        let server_url = parse_server_url(&cluster.server_url)?;

        let client_cert = SecretMaterial::decode(CLIENT_CERT_FIELD, &user.client_cert_encoded)?;
        let client_key = SecretMaterial::decode(CLIENT_KEY_FIELD, &user.client_key_encoded)?;
        let ca_cert = SecretMaterial::decode(CA_CERT_FIELD, &cluster.ca_cert_encoded)?;

        let identity = pair_identity(&client_cert, &client_key)?;
        let ca_pool = trust_pool(&ca_cert)?;

        debug!(
            cluster = %cluster.name,
            user = %user.name,
            ca_certs = ca_pool.len(),
            "Built mTLS credentials"
        );

        Ok(CredentialBundle {
            server_url,
            identity,
            ca_pool,
        })
    }

    /// Decode-only path: returns the plaintext of one field without building
    /// any TLS object.
    pub fn decode_field(field: &'static str, encoded: &str) -> Result<SecretMaterial> {
        SecretMaterial::decode(field, encoded)
    }
}

fn parse_server_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidServerUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "https" {
        return Err(Error::InvalidServerUrl {
            url: raw.to_string(),
            reason: format!("scheme must be https, got {}", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidServerUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Checks that the key belongs to the certificate and builds the TLS identity.
fn pair_identity(cert: &SecretMaterial, key: &SecretMaterial) -> Result<reqwest::Identity> {
    let x509 = X509::from_pem(cert.as_bytes())
        .map_err(|e| Error::InvalidKeyPair(format!("unreadable client certificate: {}", e)))?;
    let private_key = PKey::private_key_from_pem(key.as_bytes())
        .map_err(|e| Error::InvalidKeyPair(format!("unreadable client key: {}", e)))?;
    let public_key = x509
        .public_key()
        .map_err(|e| Error::InvalidKeyPair(format!("certificate has no public key: {}", e)))?;

    if !public_key.public_eq(&private_key) {
        return Err(Error::InvalidKeyPair(
            "client key does not match client certificate".to_string(),
        ));
    }

    if let Ok(digest) = x509.digest(MessageDigest::sha256()) {
        debug!(fingerprint = %hex::encode(&*digest), "Client certificate paired with key");
    }

    // The TLS stack only takes PKCS#8; kubeconfigs often carry PKCS#1 keys.
    let pkcs8 = Zeroizing::new(
        private_key
            .private_key_to_pem_pkcs8()
            .map_err(|e| Error::InvalidKeyPair(format!("cannot re-encode client key: {}", e)))?,
    );

    reqwest::Identity::from_pkcs8_pem(cert.as_bytes(), &pkcs8)
        .map_err(|e| Error::InvalidKeyPair(e.to_string()))
}

/// Every certificate in the CA bundle becomes a trust root.
fn trust_pool(ca: &SecretMaterial) -> Result<Vec<reqwest::Certificate>> {
    let certs = X509::stack_from_pem(ca.as_bytes())
        .map_err(|e| Error::InvalidCaCert(e.to_string()))?;
    if certs.is_empty() {
        return Err(Error::InvalidCaCert(
            "no PEM certificates found".to_string(),
        ));
    }

    certs
        .iter()
        .map(|cert| {
            let der = cert
                .to_der()
                .map_err(|e| Error::InvalidCaCert(e.to_string()))?;
            reqwest::Certificate::from_der(&der).map_err(|e| Error::InvalidCaCert(e.to_string()))
        })
        .collect()
}
