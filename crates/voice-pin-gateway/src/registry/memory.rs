//! In-memory session registry.

use super::{SessionId, SessionStatus, SessionSummary, VerificationSession};
use crate::error::RegistryError;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Sessions indexed by id, with a secondary index by phone number.
#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<SessionId, VerificationSession>,
    /// Session ids per phone, oldest first
    by_phone: HashMap<String, VecDeque<SessionId>>,
    /// Session ids in insertion order
    order: Vec<SessionId>,
}

impl Inner {
    fn remove(&mut self, id: &SessionId) -> Option<VerificationSession> {
        let session = self.sessions.remove(id)?;

        if let Some(ids) = self.by_phone.get_mut(&session.phone) {
            ids.retain(|other| other != id);
            if ids.is_empty() {
                self.by_phone.remove(&session.phone);
            }
        }
        self.order.retain(|other| other != id);

        Some(session)
    }
}

/// Result of an eviction sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Verified sessions removed
    pub verified: usize,
    /// Pending sessions removed for exceeding the TTL
    pub expired: usize,
    /// Sessions left in the registry
    pub remaining: usize,
}

impl EvictionReport {
    pub fn removed(&self) -> usize {
        self.verified + self.expired
    }
}

/// Concurrency-safe store of verification sessions.
///
/// Every operation takes the lock once, so read-modify-write sequences
/// such as finalize or evict are atomic with respect to each other.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<Inner>>,
    reject_duplicate_phone: bool,
}

impl SessionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to create a session for a phone that already has a pending one.
    pub fn with_duplicate_phone_rejection(mut self, reject: bool) -> Self {
        self.reject_duplicate_phone = reject;
        self
    }

    /// Validate and insert a new pending session.
    pub async fn create(
        &self,
        phone: &str,
        callback_url: &str,
        secret: &str,
    ) -> Result<SessionId, RegistryError> {
        let session = VerificationSession::new_pending(phone, callback_url, secret)?;
        let id = session.id;

        let mut inner = self.inner.write().await;

        if self.reject_duplicate_phone {
            let has_pending = inner
                .by_phone
                .get(phone)
                .into_iter()
                .flatten()
                .filter_map(|other| inner.sessions.get(other))
                .any(VerificationSession::is_pending);
            if has_pending {
                return Err(RegistryError::DuplicatePhone(phone.to_string()));
            }
        }

        inner
            .by_phone
            .entry(session.phone.clone())
            .or_default()
            .push_back(id);
        inner.order.push(id);
        inner.sessions.insert(id, session);

        info!(session_id = %id, phone = %phone, "Session created");
        Ok(id)
    }

    /// Find the oldest session for a phone number.
    pub async fn find_by_phone(&self, phone: &str) -> Option<VerificationSession> {
        let inner = self.inner.read().await;
        inner
            .by_phone
            .get(phone)?
            .front()
            .and_then(|id| inner.sessions.get(id))
            .cloned()
    }

    /// Get a session by id.
    pub async fn get(&self, id: &SessionId) -> Option<VerificationSession> {
        self.inner.read().await.sessions.get(id).cloned()
    }

    /// Mark a session verified. Returns false if the session is absent.
    pub async fn mark_verified(&self, id: &SessionId) -> bool {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(id) {
            Some(session) => {
                session.status = SessionStatus::Verified;
                true
            }
            None => false,
        }
    }

    /// Delete a session. Returns the removed session, or None if it was already gone.
    pub async fn delete(&self, id: &SessionId) -> Option<VerificationSession> {
        let removed = self.inner.write().await.remove(id);
        if removed.is_some() {
            debug!(session_id = %id, "Session deleted");
        }
        removed
    }

    /// Mark a pending session verified and remove it in one step.
    ///
    /// Returns true only for the caller that performed the transition.
    pub async fn finalize_verified(&self, id: &SessionId) -> bool {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(id) {
            Some(session) if session.is_pending() => {
                session.status = SessionStatus::Verified;
                inner.remove(id);
                info!(session_id = %id, "Session verified and removed");
                true
            }
            _ => false,
        }
    }

    /// Count a retryable verification failure against a session.
    pub async fn record_failed_attempt(&self, id: &SessionId) -> Result<u32, RegistryError> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        session.attempts += 1;
        Ok(session.attempts)
    }

    /// List all sessions in insertion order.
    pub async fn list_all(&self) -> Vec<SessionSummary> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.sessions.get(id))
            .map(VerificationSession::summary)
            .collect()
    }

    /// Number of sessions currently held.
    pub async fn count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Remove verified sessions and sessions older than `ttl`.
    ///
    /// A `ttl` reaching past the earliest representable time expires nothing;
    /// verified sessions are still removed.
    pub async fn evict_expired_and_verified(&self, ttl: Duration) -> EvictionReport {
        let cutoff = match Utc::now().checked_sub_signed(ttl) {
            Some(cutoff) => cutoff,
            None => {
                warn!(ttl = %ttl, "Session TTL out of range, only evicting verified sessions");
                DateTime::<Utc>::MIN_UTC
            }
        };
        self.evict_at(cutoff).await
    }

    /// Remove verified sessions and sessions created at or before `cutoff`.
    pub async fn evict_at(&self, cutoff: DateTime<Utc>) -> EvictionReport {
        let mut inner = self.inner.write().await;
        let mut report = EvictionReport::default();

        let doomed: Vec<(SessionId, bool)> = inner
            .order
            .iter()
            .filter_map(|id| inner.sessions.get(id))
            .filter_map(|session| {
                if session.status == SessionStatus::Verified {
                    Some((session.id, true))
                } else if session.created_at <= cutoff {
                    Some((session.id, false))
                } else {
                    None
                }
            })
            .collect();

        for (id, verified) in doomed {
            if let Some(session) = inner.remove(&id) {
                if verified {
                    debug!(session_id = %id, phone = %session.phone, "Evicting verified session");
                    report.verified += 1;
                } else {
                    debug!(
                        session_id = %id,
                        phone = %session.phone,
                        created_at = %session.created_at,
                        "Evicting expired session"
                    );
                    report.expired += 1;
                }
            }
        }

        report.remaining = inner.sessions.len();
        report
    }

    #[cfg(test)]
    async fn backdate(&self, id: &SessionId, created_at: DateTime<Utc>) {
        if let Some(session) = self.inner.write().await.sessions.get_mut(id) {
            session.created_at = created_at;
        }
    }
}
