//! Cached response entry

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A generated response stored under its prompt's identity token
///
/// The TTL is fixed when the entry is stored; hits never extend it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    identity_token: String,
    response_text: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    hit_count: u64,
    model_id: Option<String>,
}

impl CacheEntry {
    /// Create a new entry; it is stamped with its lifetime when stored
    pub fn new(identity_token: impl Into<String>, response_text: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            identity_token: identity_token.into(),
            response_text: response_text.into(),
            created_at: now,
            expires_at: now,
            hit_count: 0,
            model_id: None,
        }
    }

    /// Set the model that produced the response
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Stamp creation time now and derive the expiry from `ttl`
    pub fn expiring_in(mut self, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);

        self.created_at = now;
        self.expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self
    }

    /// Replace the hit counter (used by stores when materialising a snapshot)
    pub fn with_hit_count(mut self, hit_count: u64) -> Self {
        self.hit_count = hit_count;
        self
    }

    pub fn identity_token(&self) -> &str {
        &self.identity_token
    }

    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    /// Remaining lifetime, zero once expired
    pub fn ttl_remaining(&self) -> Duration {
        (self.expires_at - Utc::now()).to_std().unwrap_or_default()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
