// src/auth/rbac.rs
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::identity::{AuthorizationDecision, Identity};
use super::probe::ControlPlaneClient;
use crate::error::{Error, Result};

pub const USER_SUBJECT_KIND: &str = "User";

const CLUSTER_ROLE_BINDINGS_PATH: &str = "/apis/rbac.authorization.k8s.io/v1/clusterrolebindings";
const ROLE_BINDINGS_PATH: &str = "/apis/rbac.authorization.k8s.io/v1/rolebindings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Subject {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Subject {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: USER_SUBJECT_KIND.to_string(),
            name: name.into(),
            namespace: None,
        }
    }
}

/// A ClusterRoleBinding or RoleBinding, reduced to what access checks and the
/// protected page need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoleBinding {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub role_ref_kind: String,
    pub role_ref_name: String,
    pub subjects: Vec<Subject>,
}

impl RoleBinding {
    pub fn new(name: impl Into<String>, role: impl Into<String>, subjects: Vec<Subject>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            role_ref_kind: "ClusterRole".to_string(),
            role_ref_name: role.into(),
            subjects,
        }
    }

    fn grants(&self, role: &str, identity: &Identity) -> bool {
        self.role_ref_name == role
            && self
                .subjects
                .iter()
                .any(|s| s.kind == USER_SUBJECT_KIND && s.name == identity.name)
    }
}

/// Decides whether `identity` holds `required_role` through any binding.
///
/// Existential over the whole set, so the answer does not depend on binding
/// or subject order. There are no deny bindings. With no required role
/// configured nobody is authorized.
pub fn check_access(
    identity: &Identity,
    required_role: Option<&str>,
    bindings: &[RoleBinding],
) -> AuthorizationDecision {
    let authorized = required_role
        .is_some_and(|role| bindings.iter().any(|binding| binding.grants(role, identity)));
    AuthorizationDecision { authorized }
}

// Wire format of the rbac.authorization.k8s.io/v1 list endpoints.

#[derive(Deserialize)]
struct BindingList {
    #[serde(default)]
    items: Vec<WireBinding>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBinding {
    #[serde(default)]
    metadata: ObjectMeta,
    // null when a binding has no subjects
    #[serde(default)]
    subjects: Option<Vec<Subject>>,
    role_ref: RoleRef,
}

#[derive(Default, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Deserialize)]
struct RoleRef {
    #[serde(default)]
    kind: String,
    name: String,
}

impl From<WireBinding> for RoleBinding {
    fn from(wire: WireBinding) -> Self {
        Self {
            name: wire.metadata.name,
            namespace: wire.metadata.namespace,
            role_ref_kind: wire.role_ref.kind,
            role_ref_name: wire.role_ref.name,
            subjects: wire.subjects.unwrap_or_default(),
        }
    }
}

/// Reads role bindings from the API server with an authenticated client.
pub struct RbacClient {
    client: ControlPlaneClient,
}

impl RbacClient {
    pub fn new(client: ControlPlaneClient) -> Self {
        Self { client }
    }

    pub async fn cluster_role_bindings(&self) -> Result<Vec<RoleBinding>> {
        self.list(CLUSTER_ROLE_BINDINGS_PATH).await
    }

    /// RoleBindings across all namespaces.
    pub async fn role_bindings(&self) -> Result<Vec<RoleBinding>> {
        self.list(ROLE_BINDINGS_PATH).await
    }

    async fn list(&self, path: &str) -> Result<Vec<RoleBinding>> {
        let list: BindingList = self.client.get_json(path).await.map_err(|reason| {
            warn!(path, error = %reason, "Failed to list bindings");
            Error::AuthorizationQuery(reason)
        })?;

        debug!(path, count = list.items.len(), "Listed bindings");
        Ok(list.items.into_iter().map(RoleBinding::from).collect())
    }
}
