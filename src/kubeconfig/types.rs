// src/kubeconfig/types.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use utoipa::ToSchema;

// Raw document layout, as written by kubectl. Any field may be absent or an
// explicit null; both read as the zero value.

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct KubeConfigDocument {
    #[serde(default, deserialize_with = "null_default")]
    pub contexts: Vec<NamedContext>,
    #[serde(default, deserialize_with = "null_default")]
    pub clusters: Vec<NamedCluster>,
    #[serde(default, deserialize_with = "null_default")]
    pub users: Vec<NamedUser>,
    #[serde(default, deserialize_with = "null_default")]
    pub current_context: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedContext {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub context: ContextFields,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContextFields {
    #[serde(default, deserialize_with = "null_default")]
    pub cluster: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedCluster {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub cluster: ClusterFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ClusterFields {
    #[serde(default, deserialize_with = "null_default")]
    pub server: String,
    #[serde(default, deserialize_with = "null_default")]
    pub certificate_authority_data: String,
}

#[derive(Deserialize)]
pub(crate) struct NamedUser {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user: UserFields,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct UserFields {
    #[serde(default, deserialize_with = "null_default")]
    pub client_certificate_data: String,
    #[serde(default, deserialize_with = "null_default")]
    pub client_key_data: String,
}

/// A named pairing of a cluster and a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContextEntry {
    pub name: String,
    #[serde(rename = "cluster")]
    pub cluster_ref: String,
    #[serde(rename = "user")]
    pub user_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEntry {
    pub name: String,
    pub server_url: String,
    /// base64 over a PEM CA bundle
    pub ca_cert_encoded: String,
}

/// Client credentials, base64 over PEM.
#[derive(Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub name: String,
    pub client_cert_encoded: String,
    pub client_key_encoded: String,
}

impl fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEntry")
            .field("name", &self.name)
            .field("client_cert_encoded", &"[REDACTED]")
            .field("client_key_encoded", &"[REDACTED]")
            .finish()
    }
}

impl From<NamedContext> for ContextEntry {
    fn from(raw: NamedContext) -> Self {
        Self {
            name: raw.name,
            cluster_ref: raw.context.cluster,
            user_ref: raw.context.user,
        }
    }
}

impl From<NamedCluster> for ClusterEntry {
    fn from(raw: NamedCluster) -> Self {
        Self {
            name: raw.name,
            server_url: raw.cluster.server,
            ca_cert_encoded: raw.cluster.certificate_authority_data,
        }
    }
}

impl From<NamedUser> for UserEntry {
    fn from(raw: NamedUser) -> Self {
        Self {
            name: raw.name,
            client_cert_encoded: raw.user.client_certificate_data,
            client_key_encoded: raw.user.client_key_data,
        }
    }
}
