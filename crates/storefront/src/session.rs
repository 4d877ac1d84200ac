//! Persistent session state: auth token, user snapshot, order draft.
//!
//! The store is the client-side analog of the storefront's three session
//! cookies. Each record expires seven days after it was written; an expired
//! or absent record reads as `None`, never an error. Records are
//! independent of each other - a token without a user snapshot (or the
//! reverse) is a legal state that every caller tolerates.
//!
//! Every mutation bumps a monotonic epoch and publishes a
//! [`SessionSnapshot`] on a watch channel. Components that care about auth
//! state subscribe instead of polling, and the checkout wizard uses the
//! epoch to detect a session that was cleared underneath an in-flight
//! request.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::StorefrontConfig;
use crate::models::{OrderDraft, User};

/// How long a session record lives after it is written.
const RECORD_TTL_DAYS: i64 = 7;

/// Errors raised by session persistence. Reads never error; absence and
/// expiry read as `None`.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What subscribers see after each mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Monotonic mutation counter. Compare before/after an await to detect
    /// a session that changed mid-flight.
    pub epoch: u64,
    /// Whether a live auth token is present.
    pub authenticated: bool,
}

/// One stored value with its absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

impl<T> Record<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            expires_at: Utc::now() + Duration::days(RECORD_TTL_DAYS),
        }
    }

    fn live(&self) -> Option<&T> {
        (self.expires_at > Utc::now()).then_some(&self.value)
    }
}

/// On-disk shape of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Records {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<Record<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<Record<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_draft: Option<Record<OrderDraft>>,
}

struct Inner {
    records: Records,
    path: PathBuf,
    epoch: u64,
}

/// The session store. Cheaply cloneable; all clones share state, so the
/// API client can clear the session on a 401 while the wizard still holds
/// it.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// Open the session store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing session file cannot be read. A
    /// malformed file is treated like an expired session and discarded.
    pub fn open(config: &StorefrontConfig) -> Result<Self, SessionError> {
        Self::open_at(&config.session_file)
    }

    /// Open the session store backed by a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing session file cannot be read.
    pub fn open_at(path: &Path) -> Result<Self, SessionError> {
        let records = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding malformed session file");
                    Records::default()
                }
            }
        } else {
            Records::default()
        };

        let authenticated = records.token.as_ref().is_some_and(|r| r.live().is_some());
        let (tx, _rx) = watch::channel(SessionSnapshot {
            epoch: 0,
            authenticated,
        });

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                records,
                path: path.to_path_buf(),
                epoch: 0,
            })),
            tx,
        })
    }

    // =========================================================================
    // Auth records
    // =========================================================================

    /// Store the auth token and user snapshot. Both records get a fresh
    /// seven-day expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub fn set_auth(&self, token: &str, user: &User) -> Result<(), SessionError> {
        self.mutate(|records| {
            records.token = Some(Record::fresh(token.to_owned()));
            records.user = Some(Record::fresh(user.clone()));
        })
    }

    /// The live auth token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        let inner = self.lock();
        inner
            .records
            .token
            .as_ref()
            .and_then(Record::live)
            .map(|t| SecretString::from(t.clone()))
    }

    /// The live user snapshot, if any. Present independently of the token.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let inner = self.lock();
        inner.records.user.as_ref().and_then(Record::live).cloned()
    }

    /// Whether a live token is present. Presence is the only check the
    /// client performs; token validity is the backend's call.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Drop the token and user snapshot. The order draft survives.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub fn clear_auth(&self) -> Result<(), SessionError> {
        self.mutate(|records| {
            records.token = None;
            records.user = None;
        })
    }

    /// Refresh the stored user snapshot without touching the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub fn update_user(&self, user: &User) -> Result<(), SessionError> {
        self.mutate(|records| {
            records.user = Some(Record::fresh(user.clone()));
        })
    }

    // =========================================================================
    // Order draft
    // =========================================================================

    /// Persist the in-progress order selection. Overwrites any previous
    /// draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub fn save_order_draft(&self, draft: &OrderDraft) -> Result<(), SessionError> {
        self.mutate(|records| {
            records.order_draft = Some(Record::fresh(draft.clone()));
        })
    }

    /// The live order draft, if any.
    #[must_use]
    pub fn order_draft(&self) -> Option<OrderDraft> {
        let inner = self.lock();
        inner
            .records
            .order_draft
            .as_ref()
            .and_then(Record::live)
            .cloned()
    }

    /// Drop the order draft (submitted or cancelled).
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub fn clear_order_draft(&self) -> Result<(), SessionError> {
        self.mutate(|records| {
            records.order_draft = None;
        })
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    /// Subscribe to session mutations. The receiver always holds the most
    /// recent [`SessionSnapshot`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Current mutation epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate(&self, apply: impl FnOnce(&mut Records)) -> Result<(), SessionError> {
        let snapshot = {
            let mut inner = self.lock();
            apply(&mut inner.records);
            inner.epoch += 1;

            let serialized = serde_json::to_string_pretty(&inner.records)?;
            if let Some(parent) = inner.path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&inner.path, serialized)?;

            SessionSnapshot {
                epoch: inner.epoch,
                authenticated: inner.records.token.as_ref().is_some_and(|r| r.live().is_some()),
            }
        };

        // Notify after the lock is released; receivers may read the store.
        self.tx.send_replace(snapshot);
        Ok(())
    }

    /// Backdate every record's expiry, as if seven days had passed.
    #[cfg(test)]
    pub(crate) fn expire_all_for_test(&self) {
        let mut inner = self.lock();
        let past = Utc::now() - Duration::days(1);
        if let Some(r) = inner.records.token.as_mut() {
            r.expires_at = past;
        }
        if let Some(r) = inner.records.user.as_mut() {
            r.expires_at = past;
        }
        if let Some(r) = inner.records.order_draft.as_mut() {
            r.expires_at = past;
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("path", &inner.path)
            .field("epoch", &inner.epoch)
            .field(
                "token",
                &inner.records.token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user", &inner.records.user.as_ref().map(|r| &r.value))
            .field(
                "order_draft",
                &inner.records.order_draft.as_ref().map(|r| &r.value),
            )
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fernway_core::{Email, Price, ProductId, SizeId, UserId};
    use secrecy::ExposeSecret;

    use crate::models::{Product, ProductSize};

    use super::*;

    fn temp_store() -> (SessionStore, PathBuf) {
        let path = std::env::temp_dir()
            .join("fernway-tests")
            .join(format!("session-{}.json", uuid::Uuid::new_v4()));
        (SessionStore::open_at(&path).unwrap(), path)
    }

    fn user() -> User {
        User {
            id: UserId::new(1),
            first_name: "Mira".to_string(),
            last_name: "Holt".to_string(),
            email: Email::parse("mira@example.com").unwrap(),
            phone: "2345550123".to_string(),
        }
    }

    fn draft() -> OrderDraft {
        let product = Product {
            id: ProductId::new(4),
            name: "First Flush Darjeeling".to_string(),
            description: String::new(),
            image: None,
            stock: 8,
            sizes: vec![ProductSize {
                id: SizeId::new(1),
                name: "100g".to_string(),
                weight: 100,
                price: Price::from_cents(2200),
            }],
        };
        OrderDraft::new(&product, 0, 2).unwrap()
    }

    #[test]
    fn test_auth_roundtrip() {
        let (store, path) = temp_store();
        assert!(store.token().is_none());
        assert!(!store.is_authenticated());

        store.set_auth("tok-123", &user()).unwrap();
        assert_eq!(store.token().unwrap().expose_secret(), "tok-123");
        assert_eq!(store.user().unwrap().first_name, "Mira");
        assert!(store.is_authenticated());

        store.clear_auth().unwrap();
        assert!(store.token().is_none());
        assert!(store.user().is_none());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_draft_survives_logout() {
        let (store, path) = temp_store();
        store.set_auth("tok", &user()).unwrap();
        store.save_order_draft(&draft()).unwrap();

        store.clear_auth().unwrap();
        assert_eq!(store.order_draft().unwrap().quantity, 2);

        store.clear_order_draft().unwrap();
        assert!(store.order_draft().is_none());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_expired_records_read_as_none() {
        let (store, path) = temp_store();
        store.set_auth("tok", &user()).unwrap();
        store.save_order_draft(&draft()).unwrap();

        store.expire_all_for_test();
        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert!(store.order_draft().is_none());
        assert!(!store.is_authenticated());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_persists_across_reopen() {
        let (store, path) = temp_store();
        store.set_auth("tok-456", &user()).unwrap();

        let reopened = SessionStore::open_at(&path).unwrap();
        assert_eq!(reopened.token().unwrap().expose_secret(), "tok-456");
        assert_eq!(reopened.user().unwrap().id, UserId::new(1));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_partial_state_tolerated() {
        let (store, path) = temp_store();
        store.set_auth("tok", &user()).unwrap();
        store.expire_all_for_test();

        // A fresh user snapshot without a live token is legal.
        store.update_user(&user()).unwrap();
        assert!(store.token().is_none());
        assert!(store.user().is_some());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_mutations_publish_snapshots() {
        let (store, path) = temp_store();
        let rx = store.subscribe();
        assert_eq!(rx.borrow().epoch, 0);
        assert!(!rx.borrow().authenticated);

        store.set_auth("tok", &user()).unwrap();
        assert_eq!(rx.borrow().epoch, 1);
        assert!(rx.borrow().authenticated);

        store.clear_auth().unwrap();
        assert_eq!(rx.borrow().epoch, 2);
        assert!(!rx.borrow().authenticated);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_malformed_file_discarded() {
        let path = std::env::temp_dir()
            .join("fernway-tests")
            .join(format!("session-{}.json", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json at all {").unwrap();

        let store = SessionStore::open_at(&path).unwrap();
        assert!(store.token().is_none());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_debug_redacts_token() {
        let (store, path) = temp_store();
        store.set_auth("super-secret-token", &user()).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-token"));

        let _ = std::fs::remove_file(path);
    }
}
