// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Digest algorithm and quality-of-protection registry.
//!
//! Each variant carries its RFC 2617 wire token and its digest behavior. The
//! mechanism configures an ordered acceptance list of each and only ever
//! advertises values from those lists.

use sha2::{Digest, Sha256, Sha512};
use smol_str::SmolStr;

use crate::hex;

/// Digest algorithm advertised in a challenge and echoed in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the wire-format token for this algorithm.
    pub fn token(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Parses a wire token, case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "MD5" => Some(DigestAlgorithm::Md5),
            "SHA-256" => Some(DigestAlgorithm::Sha256),
            "SHA-512" => Some(DigestAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Maps an arbitrary byte sequence to this algorithm's fixed-length digest.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Md5 => md5::compute(data).0.to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Digests and hex-encodes in one step, as every RFC 2617 formula requires.
    pub fn hex_digest(&self, data: &[u8]) -> SmolStr {
        hex::to_hex(&self.digest(data))
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

/// Quality of protection negotiated between challenge and response.
///
/// An empty configured qop list selects the legacy RFC 2069 behavior, which
/// has no qop directive at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestQop {
    Auth,
    AuthInt,
}

impl DigestQop {
    /// Returns the wire-format token for this qop level.
    pub fn token(&self) -> &'static str {
        match self {
            DigestQop::Auth => "auth",
            DigestQop::AuthInt => "auth-int",
        }
    }

    /// Parses a wire token, case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "auth" => Some(DigestQop::Auth),
            "auth-int" => Some(DigestQop::AuthInt),
            _ => None,
        }
    }
}

impl std::str::FromStr for DigestQop {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_tokens() {
        assert_eq!(DigestAlgorithm::parse("MD5"), Some(DigestAlgorithm::Md5));
        assert_eq!(DigestAlgorithm::parse("md5"), Some(DigestAlgorithm::Md5));
        assert_eq!(
            DigestAlgorithm::parse("SHA-256"),
            Some(DigestAlgorithm::Sha256)
        );
        assert_eq!(
            DigestAlgorithm::parse("sha-512"),
            Some(DigestAlgorithm::Sha512)
        );
        assert_eq!(DigestAlgorithm::parse("SHA-1"), None);
    }

    #[test]
    fn qop_tokens() {
        assert_eq!(DigestQop::parse("auth"), Some(DigestQop::Auth));
        assert_eq!(DigestQop::parse("AUTH-INT"), Some(DigestQop::AuthInt));
        assert_eq!(DigestQop::parse("none"), None);
    }

    #[test]
    fn md5_known_vector() {
        // MD5("") from RFC 1321.
        assert_eq!(
            DigestAlgorithm::Md5.hex_digest(b"").as_str(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            DigestAlgorithm::Sha256.hex_digest(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(DigestAlgorithm::Md5.digest(b"x").len(), 16);
        assert_eq!(DigestAlgorithm::Sha256.digest(b"x").len(), 32);
        assert_eq!(DigestAlgorithm::Sha512.digest(b"x").len(), 64);
    }
}
