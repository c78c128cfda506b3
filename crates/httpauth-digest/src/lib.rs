// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Server and client Digest authentication built on `httpauth-core`.
//!
//! The server side is [`DigestAuthenticationMechanism`]: configure a realm,
//! a [`CredentialStore`] and the accepted algorithm/qop lists, then call
//! [`DigestAuthenticationMechanism::authenticate`] per request and act on the
//! returned [`AuthOutcome`]. Nonce issuance, replay detection and expiry live
//! in [`NonceManager`], which is safe to share across request-handling
//! threads.
//!
//! The client side is [`DigestClient`], mostly useful for tests and for
//! talking to other digest-protected servers.
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use httpauth_core::{Headers, Method, Request};
//! use httpauth_digest::{
//!     AuthOutcome, Credential, DigestAuthenticationMechanism, MemoryCredentialStore,
//! };
//!
//! let store = MemoryCredentialStore::with(vec![Credential::password(
//!     "alice", "example.com", "open sesame",
//! )]);
//! let mechanism = DigestAuthenticationMechanism::new("example.com", store);
//!
//! let request = Request::new(Method::Get, "/", Headers::new(), Bytes::new());
//! match mechanism.authenticate(&request) {
//!     AuthOutcome::Challenge { header, .. } => assert!(header.starts_with("Digest ")),
//!     other => panic!("expected a challenge, got {:?}", other),
//! }
//! ```

pub mod client;
pub mod mechanism;
pub mod nonce;
pub mod store;

pub use client::{ChallengeError, DigestClient};
pub use mechanism::{AuthOutcome, DigestAuthenticationMechanism};
pub use nonce::{NonceManager, NonceStatus};
pub use store::{Credential, CredentialStore, MemoryCredentialStore, Secret};
