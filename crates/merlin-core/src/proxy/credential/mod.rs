//! Cached upstream bearer credential with single-flight refresh.
//!
//! One [`CredentialStore`] exists per acquisition path (chat and image) and is
//! injected through `AppState`. Readers take the `RwLock` fast path while a
//! valid credential is cached; a miss serializes on `refresh_lock` and
//! re-checks the cache before walking the source chain, so concurrent misses
//! produce exactly one upstream exchange. Callers that queued behind a failed
//! attempt receive that attempt's error instead of repeating it.

mod sources;

#[cfg(test)]
mod tests;

pub use sources::{
    chat_sources, image_sources, RefreshTokenSource, SessionCookieSource, StaticTokenSource,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use merlin_types::error::{CredentialError, CredentialSourceKind};
use merlin_types::models::config::redact;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// A bearer credential and the instant it stops being trusted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self { value: value.into(), expires_at }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Usable only while `now < expires_at`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        if self.value.starts_with("Bearer ") {
            self.value.clone()
        } else {
            format!("Bearer {}", self.value)
        }
    }

    pub fn redacted(&self) -> String {
        redact(self.value.trim_start_matches("Bearer "))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("value", &self.redacted())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// One way of minting a bearer credential from a long-lived secret.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    fn kind(&self) -> CredentialSourceKind;

    /// Exchange the secret for an access token. Empty tokens count as failure.
    async fn fetch(&self) -> Result<String, CredentialError>;
}

pub struct CredentialStore {
    name: &'static str,
    cached: RwLock<Option<Credential>>,
    /// Holds the error of the most recent failed attempt, if any.
    refresh_lock: Mutex<Option<CredentialError>>,
    /// Completed refresh attempts; only bumped while `refresh_lock` is held.
    attempts: AtomicU64,
    sources: Vec<Arc<dyn CredentialSource>>,
    lease: TimeDelta,
}

impl CredentialStore {
    /// `sources` are tried in order on every refresh; the first non-empty token wins.
    pub fn new(name: &'static str, sources: Vec<Arc<dyn CredentialSource>>, lease: Duration) -> Self {
        let lease = TimeDelta::from_std(lease).unwrap_or_else(|_| TimeDelta::seconds(3300));
        Self {
            name,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(None),
            attempts: AtomicU64::new(0),
            sources,
            lease,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Kinds of the configured sources, in fallback order.
    pub fn source_kinds(&self) -> Vec<CredentialSourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    fn cached_valid(&self, now: DateTime<Utc>) -> Option<Credential> {
        self.cached.read().as_ref().filter(|c| c.is_valid_at(now)).cloned()
    }

    /// Return the cached credential, refreshing it first if missing or expired.
    pub async fn get_credential(&self) -> Result<Credential, CredentialError> {
        if let Some(credential) = self.cached_valid(Utc::now()) {
            return Ok(credential);
        }

        let observed = self.attempts.load(Ordering::Acquire);
        let mut last_failure = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(credential) = self.cached_valid(Utc::now()) {
            tracing::debug!("[{}] Credential refreshed by concurrent caller", self.name);
            return Ok(credential);
        }

        // An attempt finished while we waited and failed: share its outcome
        if self.attempts.load(Ordering::Acquire) != observed {
            if let Some(error) = last_failure.as_ref() {
                tracing::debug!("[{}] Reusing failure of concurrent refresh", self.name);
                return Err(error.clone());
            }
        }

        let result = self.refresh().await;
        *last_failure = result.as_ref().err().cloned();
        self.attempts.fetch_add(1, Ordering::AcqRel);

        let credential = result?;
        *self.cached.write() = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential so the next call refreshes.
    pub fn invalidate(&self) {
        if self.cached.write().take().is_some() {
            tracing::info!("[{}] Cached credential invalidated", self.name);
        }
    }

    async fn refresh(&self) -> Result<Credential, CredentialError> {
        let mut last_error = None;

        for source in &self.sources {
            let kind = source.kind();
            match source.fetch().await {
                Ok(token) if !token.trim().is_empty() => {
                    let credential = Credential::new(token.trim(), Utc::now() + self.lease);
                    tracing::info!(
                        "[{}] Obtained credential via {} ({}), valid until {}",
                        self.name,
                        kind,
                        credential.redacted(),
                        credential.expires_at().to_rfc3339()
                    );
                    return Ok(credential);
                },
                Ok(_) => {
                    tracing::warn!("[{}] {} exchange returned an empty token", self.name, kind);
                    last_error = Some(CredentialError::UpstreamRejected {
                        source_kind: kind,
                        status: None,
                        message: "empty access token in response".to_string(),
                    });
                },
                Err(e) => {
                    tracing::warn!("[{}] {} exchange failed: {}", self.name, kind, e);
                    last_error = Some(e);
                },
            }
        }

        let error = last_error.unwrap_or(CredentialError::NoSecret);
        tracing::error!("[{}] All credential sources exhausted: {}", self.name, error);
        Err(error)
    }

    #[cfg(test)]
    pub(crate) fn set_cached(&self, credential: Credential) {
        *self.cached.write() = Some(credential);
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("name", &self.name)
            .field("sources", &self.source_kinds())
            .field("lease_secs", &self.lease.num_seconds())
            .finish()
    }
}
