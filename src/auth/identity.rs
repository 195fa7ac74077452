// src/auth/identity.rs
use serde::Serialize;
use utoipa::ToSchema;

/// The authenticated user, by kubeconfig user name. No secret is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Outcome of one access check. Computed per request, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub authorized: bool,
}
