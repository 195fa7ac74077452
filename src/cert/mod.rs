// src/cert/mod.rs
mod bundle;
mod secret;

pub use bundle::{CredentialBundle, CredentialResolver};
pub use secret::SecretMaterial;
