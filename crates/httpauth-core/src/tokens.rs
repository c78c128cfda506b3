// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Token codec for the three RFC 2617 header grammars.
//!
//! `WWW-Authenticate`, `Authorization` and `Authentication-Info` all share the
//! same comma-separated `name=value` surface, but each recognizes a closed set
//! of directive names and quotes them differently. Every set is a dedicated
//! enum here so the mechanism never dispatches on raw strings.
//!
//! Per RFC 2617 §1.2 unrecognized directive names are skipped, never an error;
//! only broken syntax (an unterminated quoted-string, a directive without `=`)
//! fails the parse.

use std::collections::BTreeMap;
use std::fmt;

use smol_str::SmolStr;

// Input bounds so a hostile header cannot force unbounded allocation.
const MAX_HEADER_TOKENS: usize = 30;
const MAX_TOKEN_VALUE_LENGTH: usize = 2048;

/// Error raised for malformed header syntax.
///
/// Recognized-but-unexpected directive values are not parse errors; this only
/// covers input the grammar itself cannot describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A quoted-string value was opened but never closed.
    UnterminatedQuote,
    /// A directive name was not followed by `=`.
    MissingEquals,
    /// More directives than any legitimate header carries.
    TooManyTokens { max: usize },
    /// A single directive value exceeded the size bound.
    ValueTooLong { max: usize },
    /// A directive value contained an ASCII control character.
    ControlCharacter,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnterminatedQuote => write!(f, "unterminated quoted-string"),
            ParseError::MissingEquals => write!(f, "directive without '=' separator"),
            ParseError::TooManyTokens { max } => {
                write!(f, "too many directives (max {})", max)
            }
            ParseError::ValueTooLong { max } => {
                write!(f, "directive value too long (max {})", max)
            }
            ParseError::ControlCharacter => {
                write!(f, "directive value contains a control character")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A directive name belonging to one of the closed header grammars.
///
/// Declaration order of the implementing enum is the canonical serialization
/// order, which keeps `serialize_token_map` deterministic.
pub trait HeaderToken: Copy + Ord {
    /// The wire-format directive name.
    fn name(self) -> &'static str;

    /// Whether the grammar emits this directive's value as a quoted-string.
    fn quoted(self) -> bool;

    /// Resolves a directive name, ignoring ASCII case. Unrecognized names
    /// return `None` and are skipped by the parser.
    fn from_name(name: &str) -> Option<Self>;
}

/// Directives of a `WWW-Authenticate: Digest` challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChallengeToken {
    Realm,
    Nonce,
    Algorithm,
    Qop,
    Stale,
    Domain,
    Opaque,
}

impl HeaderToken for ChallengeToken {
    fn name(self) -> &'static str {
        match self {
            ChallengeToken::Realm => "realm",
            ChallengeToken::Nonce => "nonce",
            ChallengeToken::Algorithm => "algorithm",
            ChallengeToken::Qop => "qop",
            ChallengeToken::Stale => "stale",
            ChallengeToken::Domain => "domain",
            ChallengeToken::Opaque => "opaque",
        }
    }

    fn quoted(self) -> bool {
        // The qop offer list is quoted in a challenge, unlike the single qop
        // value echoed back in an Authorization header.
        !matches!(self, ChallengeToken::Algorithm | ChallengeToken::Stale)
    }

    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("realm") {
            Some(ChallengeToken::Realm)
        } else if name.eq_ignore_ascii_case("nonce") {
            Some(ChallengeToken::Nonce)
        } else if name.eq_ignore_ascii_case("algorithm") {
            Some(ChallengeToken::Algorithm)
        } else if name.eq_ignore_ascii_case("qop") {
            Some(ChallengeToken::Qop)
        } else if name.eq_ignore_ascii_case("stale") {
            Some(ChallengeToken::Stale)
        } else if name.eq_ignore_ascii_case("domain") {
            Some(ChallengeToken::Domain)
        } else if name.eq_ignore_ascii_case("opaque") {
            Some(ChallengeToken::Opaque)
        } else {
            None
        }
    }
}

/// Directives of an `Authorization: Digest` credential response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthorizationToken {
    Username,
    Realm,
    Nonce,
    DigestUri,
    Response,
    Algorithm,
    Qop,
    NonceCount,
    Cnonce,
    Opaque,
}

impl HeaderToken for AuthorizationToken {
    fn name(self) -> &'static str {
        match self {
            AuthorizationToken::Username => "username",
            AuthorizationToken::Realm => "realm",
            AuthorizationToken::Nonce => "nonce",
            AuthorizationToken::DigestUri => "uri",
            AuthorizationToken::Response => "response",
            AuthorizationToken::Algorithm => "algorithm",
            AuthorizationToken::Qop => "qop",
            AuthorizationToken::NonceCount => "nc",
            AuthorizationToken::Cnonce => "cnonce",
            AuthorizationToken::Opaque => "opaque",
        }
    }

    fn quoted(self) -> bool {
        !matches!(
            self,
            AuthorizationToken::Algorithm
                | AuthorizationToken::Qop
                | AuthorizationToken::NonceCount
        )
    }

    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("username") {
            Some(AuthorizationToken::Username)
        } else if name.eq_ignore_ascii_case("realm") {
            Some(AuthorizationToken::Realm)
        } else if name.eq_ignore_ascii_case("nonce") {
            Some(AuthorizationToken::Nonce)
        } else if name.eq_ignore_ascii_case("uri") {
            Some(AuthorizationToken::DigestUri)
        } else if name.eq_ignore_ascii_case("response") {
            Some(AuthorizationToken::Response)
        } else if name.eq_ignore_ascii_case("algorithm") {
            Some(AuthorizationToken::Algorithm)
        } else if name.eq_ignore_ascii_case("qop") {
            Some(AuthorizationToken::Qop)
        } else if name.eq_ignore_ascii_case("nc") {
            Some(AuthorizationToken::NonceCount)
        } else if name.eq_ignore_ascii_case("cnonce") {
            Some(AuthorizationToken::Cnonce)
        } else if name.eq_ignore_ascii_case("opaque") {
            Some(AuthorizationToken::Opaque)
        } else {
            None
        }
    }
}

/// Directives of an `Authentication-Info` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InfoToken {
    NextNonce,
    Qop,
    ResponseAuth,
    Cnonce,
    NonceCount,
}

impl HeaderToken for InfoToken {
    fn name(self) -> &'static str {
        match self {
            InfoToken::NextNonce => "nextnonce",
            InfoToken::Qop => "qop",
            InfoToken::ResponseAuth => "rspauth",
            InfoToken::Cnonce => "cnonce",
            InfoToken::NonceCount => "nc",
        }
    }

    fn quoted(self) -> bool {
        !matches!(self, InfoToken::Qop | InfoToken::NonceCount)
    }

    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("nextnonce") {
            Some(InfoToken::NextNonce)
        } else if name.eq_ignore_ascii_case("qop") {
            Some(InfoToken::Qop)
        } else if name.eq_ignore_ascii_case("rspauth") {
            Some(InfoToken::ResponseAuth)
        } else if name.eq_ignore_ascii_case("cnonce") {
            Some(InfoToken::Cnonce)
        } else if name.eq_ignore_ascii_case("nc") {
            Some(InfoToken::NonceCount)
        } else {
            None
        }
    }
}

/// Parses a comma-separated directive list into recognized tokens.
///
/// Quoted-string values may contain backslash-escaped characters; the returned
/// values are unescaped. Repeated directives keep the last occurrence.
/// Unrecognized directive names are skipped per RFC guidance.
pub fn parse_token_map<T: HeaderToken>(input: &str) -> Result<BTreeMap<T, SmolStr>, ParseError> {
    let mut map = BTreeMap::new();
    let mut rest = input;
    let mut seen = 0usize;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let (name, after_eq) = match rest.find(['=', ',', '"']) {
            Some(i) if rest.as_bytes()[i] == b'=' => (rest[..i].trim(), &rest[i + 1..]),
            _ => return Err(ParseError::MissingEquals),
        };

        let after_eq = after_eq.trim_start();
        let (value, next) = if let Some(quoted) = after_eq.strip_prefix('"') {
            let mut value = String::new();
            let mut closing = None;
            let mut chars = quoted.char_indices();
            while let Some((i, ch)) = chars.next() {
                match ch {
                    '\\' => match chars.next() {
                        Some((_, escaped)) => value.push(escaped),
                        None => return Err(ParseError::UnterminatedQuote),
                    },
                    '"' => {
                        closing = Some(i);
                        break;
                    }
                    _ => value.push(ch),
                }
            }
            let closing = closing.ok_or(ParseError::UnterminatedQuote)?;
            (value, &quoted[closing + 1..])
        } else {
            match after_eq.find(',') {
                Some(i) => (after_eq[..i].trim_end().to_owned(), &after_eq[i..]),
                None => (after_eq.trim_end().to_owned(), ""),
            }
        };

        seen += 1;
        if seen > MAX_HEADER_TOKENS {
            return Err(ParseError::TooManyTokens {
                max: MAX_HEADER_TOKENS,
            });
        }
        if value.len() > MAX_TOKEN_VALUE_LENGTH {
            return Err(ParseError::ValueTooLong {
                max: MAX_TOKEN_VALUE_LENGTH,
            });
        }
        if value.chars().any(|c| c.is_ascii_control()) {
            return Err(ParseError::ControlCharacter);
        }

        if let Some(token) = T::from_name(name) {
            map.insert(token, SmolStr::new(value));
        }
        rest = next;
    }

    Ok(map)
}

/// Serializes a token map back to RFC 2617 wire form.
///
/// Directives appear in declaration order of the token enum; values are quoted
/// or bare according to each token's grammar, with embedded quotes and
/// backslashes escaped.
pub fn serialize_token_map<T: HeaderToken>(map: &BTreeMap<T, SmolStr>) -> SmolStr {
    let mut out = String::new();
    for (i, (token, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(token.name());
        out.push('=');
        if token.quoted() {
            out.push('"');
            out.push_str(&escape_quoted_value(value));
            out.push('"');
        } else {
            out.push_str(value);
        }
    }
    SmolStr::new(out)
}

fn escape_quoted_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out
}
