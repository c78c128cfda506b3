// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Server nonce lifecycle: generation, validation, replay rules, expiry.
//!
//! A nonce value is `hex(timestamp ‖ salt ‖ tag)` where `tag` is an
//! HMAC-SHA256 over the timestamp and salt under a key generated at process
//! start. The signature lets the manager tell a fabricated value from one it
//! really issued without trusting the store contents, and the embedded
//! timestamp lets an expired nonce surface as stale even after its entry has
//! been swept. Restarting the process invalidates all outstanding nonces,
//! which is acceptable: clients transparently retry on a stale challenge.
//!
//! The store is the only shared mutable state in the stack. DashMap's
//! per-shard locking serializes the check-and-mutate step for a given entry,
//! so a single-use nonce can never hand out two VALID results, while
//! unrelated nonces validate without contention.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use hmac::{Hmac, Mac};
use rand::{thread_rng, RngCore};
use sha2::Sha256;
use smol_str::SmolStr;
use tracing::debug;

use httpauth_core::hex;

type HmacSha256 = Hmac<Sha256>;

const TIMESTAMP_LEN: usize = 8;
const SALT_LEN: usize = 16;
const TAG_LEN: usize = 32;
const NONCE_RAW_LEN: usize = TIMESTAMP_LEN + SALT_LEN + TAG_LEN;
const SESSION_KEY_LEN: usize = 16;
const SECRET_KEY_LEN: usize = 32;

/// Maximum number of live nonces kept in memory to bound growth.
const MAX_NONCE_ENTRIES: usize = 10_000;

/// Outcome of validating a client-supplied nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceStatus {
    /// Authentic, live, and the replay rules passed; the entry has been
    /// marked used or had its counter advanced.
    Valid,
    /// Authentic but expired, already consumed (RFC 2069 mode), or the
    /// nonce-count did not advance (qop mode). The client should retry
    /// against a fresh challenge carrying `stale=true`.
    Stale,
    /// Fabricated, tampered, or unknown. Indistinguishable on purpose.
    Rejected,
}

#[derive(Debug)]
struct NonceEntry {
    issued_at_ms: u64,
    /// Private per-nonce key used to derive a chained successor.
    session_key: [u8; SESSION_KEY_LEN],
    /// Set on first consumption when no qop is in effect.
    used: bool,
    /// Highest client nonce-count accepted so far (qop mode).
    nonce_count: u32,
}

/// Generates, validates, and expires server nonces.
#[derive(Debug)]
pub struct NonceManager {
    secret: [u8; SECRET_KEY_LEN],
    entries: Arc<DashMap<SmolStr, NonceEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl NonceManager {
    pub fn new(ttl: Duration) -> Self {
        let mut secret = [0u8; SECRET_KEY_LEN];
        thread_rng().fill_bytes(&mut secret);
        Self {
            secret,
            entries: Arc::new(DashMap::new()),
            ttl,
            max_entries: MAX_NONCE_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Generates a new nonce, stores its entry, and returns the wire value.
    pub fn create_nonce(&self) -> SmolStr {
        if self.entries.len() >= self.max_entries {
            self.sweep();

            // Still at capacity after dropping expired entries: shed the
            // oldest tenth so issuance never fails.
            if self.entries.len() >= self.max_entries {
                self.remove_oldest(self.max_entries / 10);
            }
        }

        let mut salt = [0u8; SALT_LEN];
        thread_rng().fill_bytes(&mut salt);
        let mut session_key = [0u8; SESSION_KEY_LEN];
        thread_rng().fill_bytes(&mut session_key);

        self.insert_entry(now_ms(), salt, session_key)
    }

    /// Validates a client-supplied nonce and applies the replay rules.
    ///
    /// The check and the entry mutation (marking used, advancing the counter)
    /// happen under the entry's shard lock as one atomic unit: of two requests
    /// racing on a single-use nonce, exactly one sees [`NonceStatus::Valid`].
    pub fn validate(
        &self,
        value: &str,
        qop_in_use: bool,
        nonce_count: Option<u32>,
    ) -> NonceStatus {
        // Tampered and never-issued values fail the signature the same way,
        // so neither case is distinguishable from the other.
        let issued_at_ms = match self.verify_value(value) {
            Some(ts) => ts,
            None => return NonceStatus::Rejected,
        };

        if self.is_expired(issued_at_ms) {
            self.entries.remove(value);
            debug!("nonce expired");
            return NonceStatus::Stale;
        }

        let mut entry = match self.entries.get_mut(value) {
            Some(entry) => entry,
            None => return NonceStatus::Rejected,
        };

        if qop_in_use {
            match nonce_count {
                Some(nc) if nc > entry.nonce_count => {
                    entry.nonce_count = nc;
                    NonceStatus::Valid
                }
                _ => NonceStatus::Stale,
            }
        } else if entry.used {
            NonceStatus::Stale
        } else {
            entry.used = true;
            NonceStatus::Valid
        }
    }

    /// Produces a replacement nonce chained to the previous entry's session
    /// key, for `Authentication-Info: nextnonce=...` continuity in RFC 2069
    /// mode. The previous entry stays in the store (marked used) until the
    /// sweep, so a replay of it reads as stale rather than unknown.
    pub fn next_nonce(&self, previous: &str) -> SmolStr {
        let session_key = self.entries.get(previous).map(|e| e.session_key);
        let session_key = match session_key {
            Some(key) => key,
            None => return self.create_nonce(),
        };

        let ts = now_ms();
        let mut mac = HmacSha256::new_from_slice(&session_key)
            .expect("hmac accepts keys of any length");
        mac.update(&ts.to_be_bytes());
        mac.update(b"nextnonce");
        let derived = mac.finalize().into_bytes();

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&derived[..SALT_LEN]);

        self.insert_entry(ts, salt, session_key)
    }

    /// Removes expired entries. Only needed for bounded memory; validation
    /// judges expiry from the timestamp embedded in the value itself.
    pub fn sweep(&self) {
        self.entries
            .retain(|_, entry| !self.is_expired(entry.issued_at_ms));
    }

    /// Number of live entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    fn insert_entry(
        &self,
        issued_at_ms: u64,
        salt: [u8; SALT_LEN],
        session_key: [u8; SESSION_KEY_LEN],
    ) -> SmolStr {
        let value = self.encode(issued_at_ms, &salt);
        self.entries.insert(
            value.clone(),
            NonceEntry {
                issued_at_ms,
                session_key,
                used: false,
                nonce_count: 0,
            },
        );
        value
    }

    fn encode(&self, issued_at_ms: u64, salt: &[u8; SALT_LEN]) -> SmolStr {
        let mut raw = Vec::with_capacity(NONCE_RAW_LEN);
        raw.extend_from_slice(&issued_at_ms.to_be_bytes());
        raw.extend_from_slice(salt);

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("hmac accepts keys of any length");
        mac.update(&raw);
        raw.extend_from_slice(&mac.finalize().into_bytes());

        hex::to_hex(&raw)
    }

    /// Checks the keyed signature; returns the embedded issue timestamp for
    /// an authentic value. Signature verification is constant time.
    fn verify_value(&self, value: &str) -> Option<u64> {
        let raw = hex::from_hex(value)?;
        if raw.len() != NONCE_RAW_LEN {
            return None;
        }
        let (signed, tag) = raw.split_at(TIMESTAMP_LEN + SALT_LEN);

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("hmac accepts keys of any length");
        mac.update(signed);
        mac.verify_slice(tag).ok()?;

        let mut ts = [0u8; TIMESTAMP_LEN];
        ts.copy_from_slice(&signed[..TIMESTAMP_LEN]);
        Some(u64::from_be_bytes(ts))
    }

    fn is_expired(&self, issued_at_ms: u64) -> bool {
        now_ms().saturating_sub(issued_at_ms) > self.ttl.as_millis() as u64
    }

    fn remove_oldest(&self, count: usize) {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().issued_at_ms))
            .collect();
        entries.sort_by_key(|(_, issued_at_ms)| *issued_at_ms);

        for (key, _) in entries.iter().take(count) {
            self.entries.remove(key);
        }
    }
}

impl Default for NonceManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
