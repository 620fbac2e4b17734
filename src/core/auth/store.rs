use std::path::PathBuf;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tokio::sync::RwLock;

use super::types::{ExpiryClaims, Session};
use crate::config::Config;
use crate::enums::PersistencePolicy;
use crate::errors::Error;

/// Single home for credentials. The tab-scoped layer lives in memory; the
/// persistent layer is a JSON session file shared by every process that
/// points at it. Reads prefer memory and fall back to the file.
pub struct AuthStore {
    tab: RwLock<Option<Session>>,
    session_file: Option<PathBuf>,
}

impl AuthStore {
    pub fn new(session_file: Option<PathBuf>) -> Self {
        Self {
            tab: RwLock::new(None),
            session_file,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Store for a process: seeds it with `AUTH_TOKEN` when given, otherwise
    /// relies on whatever the session file holds.
    pub async fn from_config(config: &Config) -> Result<Self, Error> {
        let store = Self::new(config.session_file.clone());
        if let Some(token) = &config.auth_token {
            store
                .set(Session::new(token, config.role), config.persistence)
                .await?;
        }

        match store.get().await {
            Some(session) => tracing::info!("Using {session}"),
            None => tracing::warn!("No session available, requests will fail until one is set"),
        }
        Ok(store)
    }

    pub async fn get(&self) -> Option<Session> {
        if let Some(session) = self.tab.read().await.clone() {
            return Some(session);
        }

        match self.read_persistent().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Failed to read session file: {e}");
                None
            }
        }
    }

    /// Bearer token of the current session, unless it is a JWT past its `exp`.
    pub async fn token(&self) -> Option<String> {
        let session = self.get().await?;
        if token_expired(&session.token) {
            tracing::info!("Stored token has expired, ignoring it");
            return None;
        }
        Some(session.token)
    }

    pub async fn set(&self, session: Session, policy: PersistencePolicy) -> Result<(), Error> {
        if policy == PersistencePolicy::Persistent {
            self.write_persistent(&session).await?;
        }
        *self.tab.write().await = Some(session);
        Ok(())
    }

    /// Clears both layers.
    pub async fn clear(&self) {
        *self.tab.write().await = None;

        if let Some(path) = &self.session_file {
            match tokio::fs::remove_file(path).await {
                Ok(()) => tracing::debug!("Removed session file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove session file {}: {e}", path.display()),
            }
        }
    }

    async fn read_persistent(&self) -> Result<Option<Session>, Error> {
        let Some(path) = &self.session_file else {
            return Ok(None);
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_persistent(&self, session: &Session) -> Result<(), Error> {
        let Some(path) = &self.session_file else {
            return Err(Error::bad_request(
                "persistent sessions need a session file",
            ));
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, serde_json::to_vec(session)?).await?;
        Ok(())
    }
}

/// Opaque (non-JWT) tokens never expire client side.
pub fn token_expired(token: &str) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data
            .claims
            .exp
            .is_some_and(|exp| exp <= Utc::now().timestamp()),
        Err(_) => false,
    }
}
