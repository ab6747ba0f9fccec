use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An authenticated dashboard session for one owner.
///
/// Handed to whatever needs it at construction time. Validity is re-checked
/// explicitly with [`Session::ensure_active`] before each use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub owner_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(owner_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            owner_id: owner_id.into(),
            expires_at,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.is_active(now) {
            Ok(())
        } else {
            Err(CoreError::SessionExpired)
        }
    }
}

/// Turns a bearer credential into a [`Session`].
pub trait SessionVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> anyhow::Result<Session>;
}
