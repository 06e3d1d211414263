use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::{Identity, NewSession, SessionMode, SessionStore};
use crate::error::SaveError;
use crate::events::Event;
use crate::notify::Notifier;

/// Sessions shorter than this are discarded rather than stored.
pub const MIN_RECORDABLE_SECS: u64 = 10;

/// Validates finished sessions and inserts them for the current user.
pub struct SessionRecorder {
    identity: Arc<dyn Identity>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    saving: AtomicBool,
}

impl SessionRecorder {
    pub fn new(
        identity: Arc<dyn Identity>,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            identity,
            store,
            notifier,
            saving: AtomicBool::new(false),
        }
    }

    /// An insert is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    /// Record one finished session.
    ///
    /// Issues at most one insert and never retries. Too-short sessions and
    /// missing sign-in are rejected before the store is contacted.
    ///
    /// # Errors
    /// - [`SaveError::TooShort`] when `duration_secs` is below [`MIN_RECORDABLE_SECS`]
    /// - [`SaveError::Unauthenticated`] when nobody is signed in
    /// - [`SaveError::SaveFailed`] when the store rejects the insert
    pub async fn record(&self, mode: SessionMode, duration_secs: u64) -> Result<(), SaveError> {
        if duration_secs < MIN_RECORDABLE_SECS {
            tracing::debug!(%mode, duration_secs, "session below recordable floor");
            self.notifier.notify(&Event::SessionTooShort {
                mode,
                duration_secs,
                at: Utc::now(),
            });
            return Err(SaveError::TooShort {
                duration: duration_secs,
                minimum: MIN_RECORDABLE_SECS,
            });
        }

        self.saving.store(true, Ordering::SeqCst);
        self.notifier.notify(&Event::SaveStarted {
            mode,
            duration_secs,
            at: Utc::now(),
        });
        let result = self.insert(mode, duration_secs).await;
        self.saving.store(false, Ordering::SeqCst);

        match &result {
            Ok(()) => {
                tracing::info!(%mode, duration_secs, "session saved");
                self.notifier.notify(&Event::SessionSaved {
                    mode,
                    duration_secs,
                    at: Utc::now(),
                });
            }
            Err(SaveError::Unauthenticated) => {
                tracing::warn!(%mode, duration_secs, "session not saved: nobody signed in");
                self.notifier.notify(&Event::SignInRequired { at: Utc::now() });
            }
            Err(e) => {
                tracing::warn!(%mode, duration_secs, error = %e, "session save failed");
                self.notifier.notify(&Event::SaveFailed {
                    mode,
                    duration_secs,
                    message: e.to_string(),
                    at: Utc::now(),
                });
            }
        }
        result
    }

    async fn insert(&self, mode: SessionMode, duration_secs: u64) -> Result<(), SaveError> {
        let user_id = self
            .identity
            .current_user()
            .await
            .map_err(SaveError::SaveFailed)?
            .ok_or(SaveError::Unauthenticated)?;
        self.store
            .insert(NewSession {
                mode,
                duration_secs,
                user_id,
            })
            .await
            .map_err(SaveError::SaveFailed)
    }
}
