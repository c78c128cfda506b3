// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Digest authentication mechanism (RFC 2617, with RFC 2069 fallback).
//!
//! One mechanism instance serves a realm. For each request it decides among
//! three terminal outcomes: authenticated, challenge (no or stale
//! credentials), or rejected (bad credentials). No failure in here is ever a
//! server fault; malformed headers, forged nonces and wrong passwords all
//! fold into an outcome carrying a fresh challenge for the client.

use std::collections::BTreeMap;

use rand::{distributions::Alphanumeric, thread_rng, Rng};
use smol_str::SmolStr;
use tracing::info;

use httpauth_core::{
    parse_token_map, serialize_token_map, AuthorizationToken, ChallengeToken, DigestAlgorithm,
    DigestQop, InfoToken, Method, Request,
};

use crate::nonce::{NonceManager, NonceStatus};
use crate::store::CredentialStore;

const DIGEST_SCHEME: &str = "Digest";

// Bounds on client-supplied directive values.
const MAX_USERNAME_LEN: usize = 256;
const MAX_NONCE_LEN: usize = 256;
const MAX_URI_LEN: usize = 2048;
const MAX_RESPONSE_LEN: usize = 512;
const MAX_CNONCE_LEN: usize = 256;
const MAX_NC_LEN: usize = 8;

/// Terminal outcome of authenticating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials verified. `info` carries the `Authentication-Info` header
    /// value the server should attach to its 200 response.
    Authenticated {
        username: SmolStr,
        info: Option<SmolStr>,
    },
    /// No usable credentials, or a stale nonce. `header` is the
    /// `WWW-Authenticate` value for the 401 response; `stale` is true only
    /// when the client should transparently retry with the fresh nonce.
    Challenge { header: SmolStr, stale: bool },
    /// Credentials were presented and are wrong (or unparseable). The 401
    /// carries a fresh, non-stale challenge; unknown user and wrong password
    /// are indistinguishable here.
    Rejected { header: SmolStr },
}

/// Digest authentication mechanism for a single realm.
pub struct DigestAuthenticationMechanism<S> {
    realm: SmolStr,
    /// Acceptance list in preference order; the first is advertised.
    algorithms: Vec<DigestAlgorithm>,
    /// Acceptance list in preference order; empty selects RFC 2069 mode.
    qop_modes: Vec<DigestQop>,
    domain: Option<SmolStr>,
    opaque: SmolStr,
    store: S,
    nonce_manager: NonceManager,
}

impl<S> DigestAuthenticationMechanism<S> {
    /// Creates a mechanism with MD5 and no qop (RFC 2069 compatibility
    /// defaults). Use the builder methods to opt into RFC 2617 qop modes.
    pub fn new(realm: &str, store: S) -> Self {
        let opaque: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        Self {
            realm: SmolStr::new(realm),
            algorithms: vec![DigestAlgorithm::Md5],
            qop_modes: Vec::new(),
            domain: None,
            opaque: SmolStr::new(opaque),
            store,
            nonce_manager: NonceManager::default(),
        }
    }

    /// Sets the ordered algorithm acceptance list. An empty list is ignored;
    /// the mechanism always offers at least one algorithm.
    pub fn with_algorithms(mut self, algorithms: Vec<DigestAlgorithm>) -> Self {
        if !algorithms.is_empty() {
            self.algorithms = algorithms;
        }
        self
    }

    /// Sets the ordered qop acceptance list; an empty list selects RFC 2069
    /// behavior (no qop directive in challenges).
    pub fn with_qop_modes(mut self, qop_modes: Vec<DigestQop>) -> Self {
        self.qop_modes = qop_modes;
        self
    }

    /// Sets the nonce time-to-live.
    pub fn with_nonce_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.nonce_manager = NonceManager::new(ttl);
        self
    }

    /// Sets the protection-space `domain` advertised in challenges.
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(SmolStr::new(domain));
        self
    }

    /// Read access to the nonce manager (tests and diagnostics).
    pub fn nonce_manager(&self) -> &NonceManager {
        &self.nonce_manager
    }

    fn preferred_algorithm(&self) -> DigestAlgorithm {
        self.algorithms[0]
    }

    /// Builds a `WWW-Authenticate: Digest ...` header value around a fresh
    /// nonce.
    fn challenge_header(&self, stale: bool) -> SmolStr {
        let mut map = BTreeMap::new();
        map.insert(ChallengeToken::Realm, self.realm.clone());
        map.insert(ChallengeToken::Nonce, self.nonce_manager.create_nonce());
        map.insert(
            ChallengeToken::Algorithm,
            SmolStr::new(self.preferred_algorithm().token()),
        );
        if !self.qop_modes.is_empty() {
            let offer = self
                .qop_modes
                .iter()
                .map(|q| q.token())
                .collect::<Vec<_>>()
                .join(",");
            map.insert(ChallengeToken::Qop, SmolStr::new(offer));
            map.insert(ChallengeToken::Opaque, self.opaque.clone());
        }
        if stale {
            map.insert(ChallengeToken::Stale, SmolStr::new("true"));
        }
        if let Some(domain) = &self.domain {
            map.insert(ChallengeToken::Domain, domain.clone());
        }

        SmolStr::new(format!("{} {}", DIGEST_SCHEME, serialize_token_map(&map)))
    }

    fn challenge(&self, stale: bool) -> AuthOutcome {
        AuthOutcome::Challenge {
            header: self.challenge_header(stale),
            stale,
        }
    }

    fn reject(&self) -> AuthOutcome {
        AuthOutcome::Rejected {
            header: self.challenge_header(false),
        }
    }
}

impl<S: CredentialStore> DigestAuthenticationMechanism<S> {
    /// Authenticates one request.
    ///
    /// A request without a Digest `Authorization` header gets a plain
    /// challenge; anything presented but unacceptable gets a rejection with a
    /// fresh challenge; a stale nonce gets a `stale=true` challenge so the
    /// client retries without prompting the user again.
    pub fn authenticate(&self, request: &Request) -> AuthOutcome {
        let header = match request.headers.get("Authorization") {
            Some(header) => header,
            None => {
                info!(realm = %self.realm, "issuing digest challenge");
                return self.challenge(false);
            }
        };

        let (scheme, fields) = match header.trim().split_once(' ') {
            Some(parts) => parts,
            None => return self.challenge(false),
        };
        if !scheme.eq_ignore_ascii_case(DIGEST_SCHEME) {
            return self.challenge(false);
        }

        let fields = match parse_token_map::<AuthorizationToken>(fields) {
            Ok(fields) => fields,
            Err(err) => {
                info!(error = %err, "malformed digest authorization header");
                return self.reject();
            }
        };

        let (username, realm, nonce, uri, response) = match (
            fields.get(&AuthorizationToken::Username),
            fields.get(&AuthorizationToken::Realm),
            fields.get(&AuthorizationToken::Nonce),
            fields.get(&AuthorizationToken::DigestUri),
            fields.get(&AuthorizationToken::Response),
        ) {
            (Some(u), Some(r), Some(n), Some(d), Some(resp)) => (u, r, n, d, resp),
            _ => {
                info!("digest authorization missing a required directive");
                return self.reject();
            }
        };

        if username.len() > MAX_USERNAME_LEN
            || nonce.len() > MAX_NONCE_LEN
            || uri.len() > MAX_URI_LEN
            || response.len() > MAX_RESPONSE_LEN
        {
            info!("digest directive exceeds length bounds");
            return self.reject();
        }

        if realm.as_str() != self.realm.as_str() {
            info!(client_realm = %realm, "digest realm mismatch");
            return self.reject();
        }

        if uri.as_str() != request.target.as_str() {
            info!("digest uri does not match request target");
            return self.reject();
        }

        // A client-echoed opaque must be ours; RFC 2069 clients never saw
        // one, so absence is tolerated.
        if let Some(client_opaque) = fields.get(&AuthorizationToken::Opaque) {
            if client_opaque.as_str() != self.opaque.as_str() {
                info!("digest opaque mismatch");
                return self.reject();
            }
        }

        // RFC 2617 defaults the algorithm directive to MD5 when absent.
        let algorithm = match fields.get(&AuthorizationToken::Algorithm) {
            Some(token) => match DigestAlgorithm::parse(token) {
                Some(algorithm) => algorithm,
                None => {
                    info!(token = %token, "unsupported digest algorithm");
                    return self.reject();
                }
            },
            None => DigestAlgorithm::Md5,
        };
        if !self.algorithms.contains(&algorithm) {
            info!(algorithm = algorithm.token(), "algorithm was not offered");
            return self.reject();
        }

        // A present qop must be one we offered; an absent qop falls back to
        // the RFC 2069 formula even when qop was offered.
        let qop = match fields.get(&AuthorizationToken::Qop) {
            Some(token) => match DigestQop::parse(token) {
                Some(qop) if self.qop_modes.contains(&qop) => Some(qop),
                _ => {
                    info!(token = %token, "qop was not offered");
                    return self.reject();
                }
            },
            None => None,
        };

        let (nc_raw, cnonce, nc_value) = if qop.is_some() {
            let nc_raw = match fields.get(&AuthorizationToken::NonceCount) {
                Some(nc) if nc.len() <= MAX_NC_LEN => nc,
                _ => {
                    info!("missing or oversized nc with qop");
                    return self.reject();
                }
            };
            let cnonce = match fields.get(&AuthorizationToken::Cnonce) {
                Some(cnonce) if cnonce.len() <= MAX_CNONCE_LEN => cnonce,
                _ => {
                    info!("missing or oversized cnonce with qop");
                    return self.reject();
                }
            };
            let nc_value = match u32::from_str_radix(nc_raw, 16) {
                Ok(value) => value,
                Err(_) => {
                    info!("nc is not a hex count");
                    return self.reject();
                }
            };
            (Some(nc_raw), Some(cnonce), Some(nc_value))
        } else {
            (None, None, None)
        };

        match self.nonce_manager.validate(nonce, qop.is_some(), nc_value) {
            NonceStatus::Rejected => {
                info!("unknown or tampered nonce");
                return self.reject();
            }
            NonceStatus::Stale => {
                info!("stale nonce, issuing replacement");
                return self.challenge(true);
            }
            NonceStatus::Valid => {}
        }

        let secret = match self.store.lookup(username, realm) {
            Some(secret) => secret,
            None => {
                // Same outcome as a wrong password so usernames cannot be
                // enumerated.
                info!("credential lookup failed");
                return self.reject();
            }
        };

        let ha1 = secret.ha1(algorithm, username, realm);
        let ha2 = ha2_hex(algorithm, qop, &request.method, uri, &request.body);
        let qop_parts = match (qop, nc_raw, cnonce) {
            (Some(qop), Some(nc), Some(cnonce)) => Some((nc.as_str(), cnonce.as_str(), qop)),
            _ => None,
        };
        let expected = request_digest(algorithm, &ha1, nonce, qop_parts, &ha2);

        if !constant_time_eq(expected.as_bytes(), response.as_bytes()) {
            info!(user = %username, "digest response mismatch");
            return self.reject();
        }

        let info = self.authentication_info(algorithm, &ha1, nonce, qop_parts, uri, &request.body);
        info!(user = %username, realm = %self.realm, "digest authentication succeeded");

        AuthOutcome::Authenticated {
            username: username.clone(),
            info: Some(info),
        }
    }

    /// Builds the `Authentication-Info` value for a success response.
    ///
    /// RFC 2069 mode chains a nextnonce so the client can keep a session of
    /// single-use nonces going without a fresh challenge round-trip. Qop mode
    /// instead proves mutual authentication through `rspauth`.
    fn authentication_info(
        &self,
        algorithm: DigestAlgorithm,
        ha1: &str,
        nonce: &str,
        qop_parts: Option<(&str, &str, DigestQop)>,
        uri: &str,
        body: &[u8],
    ) -> SmolStr {
        let mut map = BTreeMap::new();
        match qop_parts {
            None => {
                map.insert(InfoToken::NextNonce, self.nonce_manager.next_nonce(nonce));
            }
            Some((nc, cnonce, qop)) => {
                let ha2 = rspauth_ha2_hex(algorithm, qop, uri, body);
                let rspauth = request_digest(algorithm, ha1, nonce, qop_parts, &ha2);
                map.insert(InfoToken::Qop, SmolStr::new(qop.token()));
                map.insert(InfoToken::ResponseAuth, rspauth);
                map.insert(InfoToken::Cnonce, SmolStr::new(cnonce));
                map.insert(InfoToken::NonceCount, SmolStr::new(nc));
            }
        }
        serialize_token_map(&map)
    }
}

/// HA2 for the request direction: `method:uri`, with the body digest appended
/// for auth-int.
pub(crate) fn ha2_hex(
    algorithm: DigestAlgorithm,
    qop: Option<DigestQop>,
    method: &Method,
    uri: &str,
    body: &[u8],
) -> SmolStr {
    match qop {
        Some(DigestQop::AuthInt) => {
            let body_hash = algorithm.hex_digest(body);
            algorithm.hex_digest(format!("{}:{}:{}", method.as_str(), uri, body_hash).as_bytes())
        }
        _ => algorithm.hex_digest(format!("{}:{}", method.as_str(), uri).as_bytes()),
    }
}

/// HA2 for the response direction (`rspauth`): same as the request HA2 but
/// with an empty method, per RFC 2617 §3.2.3.
pub(crate) fn rspauth_ha2_hex(
    algorithm: DigestAlgorithm,
    qop: DigestQop,
    uri: &str,
    body: &[u8],
) -> SmolStr {
    match qop {
        DigestQop::Auth => algorithm.hex_digest(format!(":{}", uri).as_bytes()),
        DigestQop::AuthInt => {
            let body_hash = algorithm.hex_digest(body);
            algorithm.hex_digest(format!(":{}:{}", uri, body_hash).as_bytes())
        }
    }
}

/// The request-digest: RFC 2069 form without qop, RFC 2617 form with it.
pub(crate) fn request_digest(
    algorithm: DigestAlgorithm,
    ha1: &str,
    nonce: &str,
    qop_parts: Option<(&str, &str, DigestQop)>,
    ha2: &str,
) -> SmolStr {
    let input = match qop_parts {
        Some((nc, cnonce, qop)) => {
            format!("{}:{}:{}:{}:{}:{}", ha1, nonce, nc, cnonce, qop.token(), ha2)
        }
        None => format!("{}:{}:{}", ha1, nonce, ha2),
    };
    algorithm.hex_digest(input.as_bytes())
}

/// Fixed-time byte comparison so digest matching leaks no timing signal.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use httpauth_core::Headers;

    use crate::store::{Credential, MemoryCredentialStore};

    fn mechanism_2069() -> DigestAuthenticationMechanism<MemoryCredentialStore> {
        let store = MemoryCredentialStore::with(vec![Credential::password(
            "userOne",
            "Digest_Realm",
            "passwordOne",
        )]);
        DigestAuthenticationMechanism::new("Digest_Realm", store)
    }

    fn bare_request() -> Request {
        Request::new(Method::Get, "/", Headers::new(), Bytes::new())
    }

    fn request_with_authorization(value: &str) -> Request {
        let mut headers = Headers::new();
        headers.push("Authorization", value);
        Request::new(Method::Get, "/", headers, Bytes::new())
    }

    #[test]
    fn rfc2617_worked_example_digest() {
        // Section 3.5 of RFC 2617: Mufasa / Circle Of Life.
        let ha1 = "939e7578ed9e3c518a452acee763bce9";
        let ha2 = ha2_hex(
            DigestAlgorithm::Md5,
            Some(DigestQop::Auth),
            &Method::Get,
            "/dir/index.html",
            b"",
        );
        assert_eq!(ha2.as_str(), "39aff3a2bab6126f332b942af96d3366");

        let response = request_digest(
            DigestAlgorithm::Md5,
            ha1,
            "dcd98b7102dd2f0e8b11d0f600bfb0c093",
            Some(("00000001", "0a4f113b", DigestQop::Auth)),
            &ha2,
        );
        assert_eq!(response.as_str(), "6629fae49393a05397450978507c4ef1");
    }

    #[test]
    fn rfc2069_digest_formula() {
        let ha1 = DigestAlgorithm::Md5.hex_digest(b"userOne:Digest_Realm:passwordOne");
        let ha2 = ha2_hex(DigestAlgorithm::Md5, None, &Method::Get, "/", b"");
        let with_nonce = request_digest(DigestAlgorithm::Md5, &ha1, "abc", None, &ha2);
        let manual = DigestAlgorithm::Md5
            .hex_digest(format!("{}:abc:{}", ha1, ha2).as_bytes());
        assert_eq!(with_nonce, manual);
    }

    #[test]
    fn missing_authorization_yields_plain_challenge() {
        let mechanism = mechanism_2069();
        match mechanism.authenticate(&bare_request()) {
            AuthOutcome::Challenge { header, stale } => {
                assert!(!stale);
                assert!(header.starts_with("Digest "));
                let map =
                    parse_token_map::<ChallengeToken>(&header["Digest ".len()..]).expect("parse");
                assert_eq!(map[&ChallengeToken::Realm].as_str(), "Digest_Realm");
                assert_eq!(map[&ChallengeToken::Algorithm].as_str(), "MD5");
                assert!(!map.contains_key(&ChallengeToken::Qop));
                assert!(!map.contains_key(&ChallengeToken::Stale));
            }
            other => panic!("expected challenge, got {:?}", other),
        }
    }

    #[test]
    fn non_digest_scheme_yields_challenge_not_rejection() {
        let mechanism = mechanism_2069();
        let request = request_with_authorization("Basic dXNlcjpwYXNz");
        assert!(matches!(
            mechanism.authenticate(&request),
            AuthOutcome::Challenge { stale: false, .. }
        ));
    }

    #[test]
    fn malformed_header_is_rejected_with_fresh_challenge() {
        let mechanism = mechanism_2069();
        let request = request_with_authorization("Digest realm=\"never closed");
        match mechanism.authenticate(&request) {
            AuthOutcome::Rejected { header } => {
                let map =
                    parse_token_map::<ChallengeToken>(&header["Digest ".len()..]).expect("parse");
                assert!(!map.contains_key(&ChallengeToken::Stale));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn missing_required_directive_is_rejected() {
        let mechanism = mechanism_2069();
        // No response directive.
        let request = request_with_authorization(
            "Digest username=\"userOne\", realm=\"Digest_Realm\", nonce=\"n\", uri=\"/\"",
        );
        assert!(matches!(
            mechanism.authenticate(&request),
            AuthOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn realm_mismatch_is_rejected() {
        let mechanism = mechanism_2069();
        let request = request_with_authorization(
            "Digest username=\"userOne\", realm=\"Other_Realm\", nonce=\"n\", uri=\"/\", \
             response=\"00000000000000000000000000000000\"",
        );
        assert!(matches!(
            mechanism.authenticate(&request),
            AuthOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn algorithm_not_offered_is_rejected() {
        let mechanism = mechanism_2069();
        let nonce = mechanism.nonce_manager().create_nonce();
        let request = request_with_authorization(&format!(
            "Digest username=\"userOne\", realm=\"Digest_Realm\", nonce=\"{}\", uri=\"/\", \
             algorithm=SHA-256, response=\"00000000000000000000000000000000\"",
            nonce
        ));
        assert!(matches!(
            mechanism.authenticate(&request),
            AuthOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn qop_not_offered_is_rejected() {
        let mechanism = mechanism_2069();
        let nonce = mechanism.nonce_manager().create_nonce();
        let request = request_with_authorization(&format!(
            "Digest username=\"userOne\", realm=\"Digest_Realm\", nonce=\"{}\", uri=\"/\", \
             qop=auth, nc=00000001, cnonce=\"x\", \
             response=\"00000000000000000000000000000000\"",
            nonce
        ));
        assert!(matches!(
            mechanism.authenticate(&request),
            AuthOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn challenge_in_qop_mode_offers_configured_list() {
        let store = MemoryCredentialStore::new();
        let mechanism = DigestAuthenticationMechanism::new("example.com", store)
            .with_algorithms(vec![DigestAlgorithm::Sha256, DigestAlgorithm::Md5])
            .with_qop_modes(vec![DigestQop::Auth, DigestQop::AuthInt]);

        match mechanism.authenticate(&bare_request()) {
            AuthOutcome::Challenge { header, .. } => {
                let map =
                    parse_token_map::<ChallengeToken>(&header["Digest ".len()..]).expect("parse");
                assert_eq!(map[&ChallengeToken::Algorithm].as_str(), "SHA-256");
                assert_eq!(map[&ChallengeToken::Qop].as_str(), "auth,auth-int");
                assert!(map.contains_key(&ChallengeToken::Opaque));
            }
            other => panic!("expected challenge, got {:?}", other),
        }
    }

    #[test]
    fn empty_algorithm_list_keeps_the_default() {
        let mechanism = DigestAuthenticationMechanism::new("example.com", MemoryCredentialStore::new())
            .with_algorithms(Vec::new());

        // Challenge generation must not panic and still advertises MD5.
        match mechanism.authenticate(&bare_request()) {
            AuthOutcome::Challenge { header, .. } => {
                let map =
                    parse_token_map::<ChallengeToken>(&header["Digest ".len()..]).expect("parse");
                assert_eq!(map[&ChallengeToken::Algorithm].as_str(), "MD5");
            }
            other => panic!("expected challenge, got {:?}", other),
        }
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
