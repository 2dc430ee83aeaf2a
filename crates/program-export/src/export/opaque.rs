use sha2::{Digest, Sha256};

use crate::config::ExportSettings;
use crate::error::ExportError;

/// Deterministic one-way identifier derived from a secret salt.
#[derive(Clone)]
pub struct OpaqueHasher {
    secret: String,
}

impl std::fmt::Debug for OpaqueHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpaqueHasher").finish_non_exhaustive()
    }
}

impl OpaqueHasher {
    pub fn new(secret: impl Into<String>) -> Result<Self, ExportError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ExportError::Configuration(
                "opaque identifiers need a non-empty secret".to_string(),
            ));
        }
        Ok(Self { secret })
    }

    /// Fails when no secret is configured.
    pub fn from_settings(settings: &ExportSettings) -> Result<Self, ExportError> {
        match settings.secret.as_deref() {
            Some(secret) => Self::new(secret),
            None => Err(ExportError::Configuration(
                "EXPORT_SECRET_KEY must be set to export opaque columns".to_string(),
            )),
        }
    }

    /// Lowercase hex SHA-256 of secret followed by value.
    pub fn hash(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(value.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn hash_id(&self, id: u64) -> String {
        self.hash(&id.to_string())
    }
}
