// src/app/flow.rs
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::{
    check_access, AuthenticationProbe, ControlPlaneClient, Identity, RbacClient, RoleBinding,
    Session,
};
use crate::cert::CredentialResolver;
use crate::error::{Error, Result};
use crate::kubeconfig::ConfigStore;

/// Outcome of a successful context selection.
#[derive(Debug)]
pub struct Authenticated {
    pub identity: Identity,
    pub context: String,
}

/// The protected payload: every binding the cluster reports.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProtectedResources {
    pub cluster_role_bindings: Vec<RoleBinding>,
    pub role_bindings: Vec<RoleBinding>,
}

/// Per-request authentication and authorization over a shared, read-only
/// kubeconfig.
pub struct AuthFlow {
    store: Option<Arc<ConfigStore>>,
    probe: AuthenticationProbe,
    required_role: Option<String>,
}

impl AuthFlow {
    pub fn new(
        store: Option<Arc<ConfigStore>>,
        probe: AuthenticationProbe,
        required_role: Option<String>,
    ) -> Self {
        Self {
            store,
            probe,
            required_role: required_role.filter(|r| !r.is_empty()),
        }
    }

    /// The kubeconfig, if one was loaded and it has contexts.
    pub fn store(&self) -> Result<&ConfigStore> {
        match self.store.as_deref() {
            Some(store) if !store.is_empty() => Ok(store),
            _ => Err(Error::Unavailable),
        }
    }

    pub fn required_role(&self) -> Option<&str> {
        self.required_role.as_deref()
    }

    /// Resolves `context_name`, builds its mTLS credentials and probes the
    /// cluster with them.
    pub async fn authenticate(&self, context_name: &str) -> Result<Authenticated> {
        let store = self.store()?;
        let (cluster, user) = store.resolve(context_name)?;
        let bundle = CredentialResolver::build(cluster, user)?;
        self.probe.verify(bundle).await?;

        info!(context = context_name, user = %user.name, "Authenticated");
        Ok(Authenticated {
            identity: Identity::new(user.name.as_str()),
            context: context_name.to_string(),
        })
    }

    /// Checks the session's identity against the cluster role bindings and,
    /// when granted, returns all bindings.
    pub async fn authorize(&self, session: &Session) -> Result<ProtectedResources> {
        let rbac = self.rbac_client(&session.context)?;

        let cluster_role_bindings = rbac.cluster_role_bindings().await?;
        let decision = check_access(
            &session.identity,
            self.required_role(),
            &cluster_role_bindings,
        );
        if !decision.authorized {
            warn!(
                user = %session.identity.name,
                required_role = ?self.required_role(),
                "Access denied"
            );
            return Err(Error::Forbidden(session.identity.name.clone()));
        }

        let role_bindings = rbac.role_bindings().await?;
        info!(user = %session.identity.name, "Access granted");
        Ok(ProtectedResources {
            cluster_role_bindings,
            role_bindings,
        })
    }

    // Credentials never outlive a request, so each query rebuilds them from
    // the kubeconfig. Transport failures here are query failures, not
    // authentication failures.
    fn rbac_client(&self, context_name: &str) -> Result<RbacClient> {
        let store = self.store()?;
        let (cluster, user) = store.resolve(context_name)?;
        let bundle = CredentialResolver::build(cluster, user)?;
        let client = ControlPlaneClient::new(bundle, self.probe.timeout()).map_err(|e| match e {
            Error::AuthFailure(reason) => Error::AuthorizationQuery(reason),
            other => other,
        })?;
        Ok(RbacClient::new(client))
    }
}
