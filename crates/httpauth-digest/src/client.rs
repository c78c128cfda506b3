// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client-side digest state machine.
//!
//! Holds the credentials plus the nonce/qop state learned from the last
//! challenge, and produces `Authorization` header values. A client that feeds
//! `Authentication-Info` back in can ride a chain of nextnonces without ever
//! seeing a second 401.

use std::collections::BTreeMap;
use std::fmt;

use rand::{distributions::Alphanumeric, thread_rng, Rng};
use smol_str::SmolStr;

use httpauth_core::{
    parse_token_map, serialize_token_map, AuthorizationToken, ChallengeToken, DigestAlgorithm,
    DigestQop, InfoToken, Method, ParseError,
};

use crate::mechanism::{ha2_hex, request_digest};

/// Why a challenge could not be adopted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    /// The header did not carry the `Digest` scheme.
    NotDigest,
    /// The directive list failed to parse.
    Malformed(ParseError),
    /// The challenge lacked a realm or nonce.
    Incomplete,
    /// The server demanded an algorithm this client does not implement.
    UnsupportedAlgorithm(SmolStr),
}

impl fmt::Display for ChallengeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengeError::NotDigest => write!(f, "challenge is not a digest challenge"),
            ChallengeError::Malformed(err) => write!(f, "malformed challenge: {}", err),
            ChallengeError::Incomplete => write!(f, "challenge lacks realm or nonce"),
            ChallengeError::UnsupportedAlgorithm(token) => {
                write!(f, "unsupported digest algorithm: {}", token)
            }
        }
    }
}

impl std::error::Error for ChallengeError {}

impl From<ParseError> for ChallengeError {
    fn from(err: ParseError) -> Self {
        ChallengeError::Malformed(err)
    }
}

/// Digest client for one username/password pair.
pub struct DigestClient {
    username: SmolStr,
    password: SmolStr,
    realm: Option<SmolStr>,
    nonce: Option<SmolStr>,
    algorithm: DigestAlgorithm,
    qop: Option<DigestQop>,
    opaque: Option<SmolStr>,
    nonce_count: u32,
}

impl DigestClient {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: SmolStr::new(username),
            password: SmolStr::new(password),
            realm: None,
            nonce: None,
            algorithm: DigestAlgorithm::Md5,
            qop: None,
            opaque: None,
            nonce_count: 0,
        }
    }

    /// Adopts a `WWW-Authenticate` header value, replacing any prior state.
    pub fn handle_challenge(&mut self, header: &str) -> Result<(), ChallengeError> {
        let (scheme, fields) = header
            .trim()
            .split_once(' ')
            .ok_or(ChallengeError::NotDigest)?;
        if !scheme.eq_ignore_ascii_case("Digest") {
            return Err(ChallengeError::NotDigest);
        }

        let fields = parse_token_map::<ChallengeToken>(fields)?;

        let realm = fields
            .get(&ChallengeToken::Realm)
            .ok_or(ChallengeError::Incomplete)?;
        let nonce = fields
            .get(&ChallengeToken::Nonce)
            .ok_or(ChallengeError::Incomplete)?;

        let algorithm = match fields.get(&ChallengeToken::Algorithm) {
            Some(token) => DigestAlgorithm::parse(token)
                .ok_or_else(|| ChallengeError::UnsupportedAlgorithm(token.clone()))?,
            None => DigestAlgorithm::Md5,
        };

        // Prefer auth over auth-int when the server offers both.
        let qop = fields.get(&ChallengeToken::Qop).and_then(|offer| {
            let mut chosen = None;
            for token in offer.split(',') {
                match DigestQop::parse(token.trim()) {
                    Some(DigestQop::Auth) => return Some(DigestQop::Auth),
                    Some(DigestQop::AuthInt) => chosen = Some(DigestQop::AuthInt),
                    None => {}
                }
            }
            chosen
        });

        self.realm = Some(realm.clone());
        self.nonce = Some(nonce.clone());
        self.algorithm = algorithm;
        self.qop = qop;
        self.opaque = fields.get(&ChallengeToken::Opaque).cloned();
        self.nonce_count = 0;
        Ok(())
    }

    /// Adopts the nextnonce from an `Authentication-Info` header value, when
    /// present. Malformed info headers are ignored; the worst outcome is a
    /// stale retry later.
    pub fn handle_authentication_info(&mut self, value: &str) {
        if let Ok(fields) = parse_token_map::<InfoToken>(value) {
            if let Some(nextnonce) = fields.get(&InfoToken::NextNonce) {
                self.nonce = Some(nextnonce.clone());
                self.nonce_count = 0;
            }
        }
    }

    /// Produces an `Authorization` header value for the given request, or
    /// `None` when no challenge has been adopted yet.
    pub fn authorization(&mut self, method: &Method, uri: &str, body: &[u8]) -> Option<SmolStr> {
        let realm = self.realm.clone()?;
        let nonce = self.nonce.clone()?;

        let a1 = format!("{}:{}:{}", self.username, realm, self.password);
        let ha1 = self.algorithm.hex_digest(a1.as_bytes());
        let ha2 = ha2_hex(self.algorithm, self.qop, method, uri, body);

        let mut map = BTreeMap::new();
        map.insert(AuthorizationToken::Username, self.username.clone());
        map.insert(AuthorizationToken::Realm, realm);
        map.insert(AuthorizationToken::Nonce, nonce.clone());
        map.insert(AuthorizationToken::DigestUri, SmolStr::new(uri));
        map.insert(
            AuthorizationToken::Algorithm,
            SmolStr::new(self.algorithm.token()),
        );
        if let Some(opaque) = &self.opaque {
            map.insert(AuthorizationToken::Opaque, opaque.clone());
        }

        let response = match self.qop {
            Some(qop) => {
                self.nonce_count += 1;
                let nc = SmolStr::new(format!("{:08x}", self.nonce_count));
                let cnonce: String = thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(16)
                    .map(char::from)
                    .collect();
                let cnonce = SmolStr::new(cnonce);

                let response = request_digest(
                    self.algorithm,
                    &ha1,
                    &nonce,
                    Some((&nc, &cnonce, qop)),
                    &ha2,
                );
                map.insert(AuthorizationToken::Qop, SmolStr::new(qop.token()));
                map.insert(AuthorizationToken::NonceCount, nc);
                map.insert(AuthorizationToken::Cnonce, cnonce);
                response
            }
            None => request_digest(self.algorithm, &ha1, &nonce, None, &ha2),
        };
        map.insert(AuthorizationToken::Response, response);

        Some(SmolStr::new(format!(
            "Digest {}",
            serialize_token_map(&map)
        )))
    }
}
