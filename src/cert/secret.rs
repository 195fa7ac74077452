// src/cert/secret.rs
use base64::{engine::general_purpose, Engine as _};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Decoded plaintext certificate or key material.
///
/// The buffer is zeroed when the value is dropped, whichever path drops it.
/// It is never cloned and never handed out by value.
pub struct SecretMaterial {
    field: &'static str,
    bytes: Zeroizing<Vec<u8>>,
}

impl SecretMaterial {
    /// Decodes a base64 kubeconfig field such as `client-key-data`.
    ///
    /// Line breaks and other ASCII whitespace inside the encoded text are
    /// ignored, since kubeconfigs written by hand often wrap long values.
    pub fn decode(field: &'static str, encoded: &str) -> Result<Self> {
        let compact: Zeroizing<String> = Zeroizing::new(
            encoded
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect(),
        );

        // Decode into a pre-sized buffer so a failed decode never leaves an
        // unzeroed partial copy behind.
        let mut bytes = Zeroizing::new(Vec::with_capacity(base64::decoded_len_estimate(
            compact.len(),
        )));
        general_purpose::STANDARD
            .decode_vec(compact.as_bytes(), &mut bytes)
            .map_err(|source| Error::Decode { field, source })?;

        Ok(Self { field, bytes })
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretMaterial")
            .field("field", &self.field)
            .field("len", &self.bytes.len())
            .finish()
    }
}
