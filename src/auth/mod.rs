// src/auth/mod.rs
mod identity;
mod probe;
pub mod rbac;
mod session;

pub use identity::{AuthorizationDecision, Identity};
pub use probe::{AuthResult, AuthenticationProbe, ControlPlaneClient};
pub use rbac::{check_access, RbacClient, RoleBinding, Subject};
pub use session::{Session, SessionStore, SESSION_COOKIE};
