// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Credential collaborator boundary.
//!
//! The mechanism never stores credentials itself; it asks a [`CredentialStore`]
//! for the secret belonging to a username. Lookups return a plain `Option` so
//! the unknown-user path is an ordinary value branch, never error-driven
//! control flow.

use smol_str::SmolStr;

use httpauth_core::DigestAlgorithm;

/// The secret a store holds for a user.
///
/// A store that keeps pre-computed HA1 values never has to hold a plaintext
/// password at all; HA1 is `digest(username:realm:password)` under the realm's
/// configured algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Secret {
    Password(SmolStr),
    /// Hex-encoded HA1, pre-computed with the algorithm the realm uses.
    PrecomputedHa1(SmolStr),
}

impl Secret {
    /// Resolves this secret to the hex HA1 the response formulas consume.
    pub fn ha1(&self, algorithm: DigestAlgorithm, username: &str, realm: &str) -> SmolStr {
        match self {
            Secret::Password(password) => {
                let a1 = format!("{}:{}:{}", username, realm, password);
                algorithm.hex_digest(a1.as_bytes())
            }
            Secret::PrecomputedHa1(ha1) => ha1.clone(),
        }
    }
}

/// Credential store abstraction for server-side verification.
pub trait CredentialStore: Send + Sync {
    /// Looks up the secret for a username within a realm. `None` means the
    /// user is unknown; the mechanism treats that identically to a wrong
    /// password so clients cannot enumerate usernames.
    fn lookup(&self, username: &str, realm: &str) -> Option<Secret>;
}

/// A single stored credential.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: SmolStr,
    pub realm: SmolStr,
    pub secret: Secret,
}

impl Credential {
    /// Convenience constructor for a plaintext-password credential.
    pub fn password(username: &str, realm: &str, password: &str) -> Self {
        Self {
            username: SmolStr::new(username),
            realm: SmolStr::new(realm),
            secret: Secret::Password(SmolStr::new(password)),
        }
    }
}

/// In-memory credential store for testing/demo.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    creds: Vec<Credential>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(creds: Vec<Credential>) -> Self {
        Self { creds }
    }

    pub fn add(&mut self, cred: Credential) {
        self.creds.push(cred);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn lookup(&self, username: &str, realm: &str) -> Option<Secret> {
        self.creds
            .iter()
            .find(|c| c.username == username && c.realm == realm)
            .map(|c| c.secret.clone())
    }
}
