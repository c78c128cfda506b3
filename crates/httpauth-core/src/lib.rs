// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and pure codecs for HTTP Digest authentication.
//!
//! This crate provides the stateless foundation the mechanism crate builds on:
//! - **Requests**: [`Request`], [`Headers`], [`Method`]
//! - **Header grammar**: [`ChallengeToken`], [`AuthorizationToken`], [`InfoToken`]
//!   with [`parse_token_map`] / [`serialize_token_map`]
//! - **Algorithms**: [`DigestAlgorithm`] (MD5, SHA-256, SHA-512) and [`DigestQop`]
//! - **Hex**: lowercase hex encoding as RFC 2617 requires on the wire
//!
//! Everything here is pure and requires no synchronization; the only shared
//! mutable state in the stack lives in the mechanism crate's nonce manager.
//!
//! # Examples
//!
//! ```
//! use httpauth_core::{parse_token_map, ChallengeToken};
//!
//! let challenge = "realm=\"example\", nonce=\"abc\", algorithm=MD5";
//! let tokens = parse_token_map::<ChallengeToken>(challenge).unwrap();
//! assert_eq!(tokens[&ChallengeToken::Realm].as_str(), "example");
//! ```

pub mod algorithm;
pub mod headers;
pub mod hex;
pub mod method;
pub mod request;
pub mod tokens;

pub use algorithm::{DigestAlgorithm, DigestQop};
pub use headers::{Header, Headers};
pub use method::Method;
pub use request::Request;
pub use tokens::{
    parse_token_map, serialize_token_map, AuthorizationToken, ChallengeToken, HeaderToken,
    InfoToken, ParseError,
};
