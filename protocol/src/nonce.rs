//! # Login Nonces
//!
//! Every login page gets a fresh nonce that ends up inside the challenge
//! message. The provider remembers the nonces it handed out and accepts each
//! one exactly once, within [`DEFAULT_NONCE_TTL`](crate::config::DEFAULT_NONCE_TTL).
//! That keeps a captured signature from being replayed.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{DEFAULT_MAX_NONCES, DEFAULT_NONCE_TTL, NONCE_BYTES};

/// Reasons a submitted nonce is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NonceError {
    /// Never issued by this provider, or already used.
    #[error("unknown or already used nonce")]
    Unknown,

    /// Issued, but too long ago.
    #[error("nonce expired")]
    Expired,

    /// Too many nonces outstanding to hand out another one.
    #[error("too many outstanding nonces ({0})")]
    Exhausted(usize),
}

/// A hex-encoded random nonce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    /// Draw [`NONCE_BYTES`] bytes from the thread RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outstanding nonces keyed by value, with their issue time.
///
/// Challenges are handed out to anyone, so the store holds at most
/// `capacity` entries.
#[derive(Debug)]
pub struct NonceStore {
    issued: DashMap<String, DateTime<Utc>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_TTL)
    }
}

impl NonceStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_NONCES)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            issued: DashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Generate and remember a new nonce. When the store is full, expired
    /// entries are purged first; if it is still full the request is refused.
    pub fn issue(&self) -> Result<Nonce, NonceError> {
        if self.issued.len() >= self.capacity {
            self.purge_expired();
            if self.issued.len() >= self.capacity {
                tracing::warn!(capacity = self.capacity, "nonce store full");
                return Err(NonceError::Exhausted(self.capacity));
            }
        }

        let nonce = Nonce::generate();
        self.issued.insert(nonce.0.clone(), Utc::now());
        tracing::debug!(nonce = %nonce, "nonce issued");
        Ok(nonce)
    }

    /// Accept `nonce` once. The entry is removed whatever the outcome, so a
    /// second attempt with the same value always fails with `Unknown`.
    pub fn consume(&self, nonce: &str) -> Result<(), NonceError> {
        self.consume_at(nonce, Utc::now())
    }

    fn consume_at(&self, nonce: &str, now: DateTime<Utc>) -> Result<(), NonceError> {
        let (_, issued_at) = self.issued.remove(nonce).ok_or(NonceError::Unknown)?;
        if self.is_expired(issued_at, now) {
            return Err(NonceError::Expired);
        }
        Ok(())
    }

    /// Drop every expired nonce and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.issued.len();
        self.issued
            .retain(|_, issued_at| !self.is_expired(*issued_at, now));
        before.saturating_sub(self.issued.len())
    }

    /// Number of nonces currently outstanding.
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pretend `nonce` was issued `age` ago.
    #[cfg(test)]
    pub(crate) fn backdate(&self, nonce: &str, age: Duration) {
        if let Some(mut issued_at) = self.issued.get_mut(nonce) {
            *issued_at = Utc::now() - chrono::Duration::from_std(age).unwrap();
        }
    }

    fn is_expired(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - issued_at).to_std() {
            Ok(age) => age > self.ttl,
            // Issue time in the future: clock went backwards, treat as fresh.
            Err(_) => false,
        }
    }
}
