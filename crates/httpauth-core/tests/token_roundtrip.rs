// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::BTreeMap;

use proptest::prelude::*;
use smol_str::SmolStr;

use httpauth_core::{
    parse_token_map, serialize_token_map, AuthorizationToken, ChallengeToken, InfoToken,
};

proptest! {
    /// Serializing, reparsing and serializing again is a fixed point for any
    /// map built from the recognized token set.
    #[test]
    fn authorization_serialize_is_stable(
        username in proptest::option::of("[ -~]{0,16}"),
        realm in proptest::option::of("[ -~]{0,16}"),
        nonce in proptest::option::of("[ -~]{1,24}"),
        uri in proptest::option::of("[!-~&&[^,\"]]{1,16}"),
        response in proptest::option::of("[0-9a-f]{32}"),
        algorithm in proptest::option::of("[A-Z0-9-]{1,8}"),
        qop in proptest::option::of("auth(-int)?"),
        nc in proptest::option::of("[0-9a-f]{8}"),
    ) {
        let mut map = BTreeMap::new();
        if let Some(v) = username { map.insert(AuthorizationToken::Username, SmolStr::new(v)); }
        if let Some(v) = realm { map.insert(AuthorizationToken::Realm, SmolStr::new(v)); }
        if let Some(v) = nonce { map.insert(AuthorizationToken::Nonce, SmolStr::new(v)); }
        if let Some(v) = uri { map.insert(AuthorizationToken::DigestUri, SmolStr::new(v)); }
        if let Some(v) = response { map.insert(AuthorizationToken::Response, SmolStr::new(v)); }
        if let Some(v) = algorithm { map.insert(AuthorizationToken::Algorithm, SmolStr::new(v)); }
        if let Some(v) = qop { map.insert(AuthorizationToken::Qop, SmolStr::new(v)); }
        if let Some(v) = nc { map.insert(AuthorizationToken::NonceCount, SmolStr::new(v)); }

        let wire = serialize_token_map(&map);
        let reparsed = parse_token_map::<AuthorizationToken>(&wire).expect("reparse");
        prop_assert_eq!(&map, &reparsed);
        prop_assert_eq!(wire, serialize_token_map(&reparsed));
    }

    /// Challenge maps survive the same round trip, including the quoted qop
    /// offer list.
    #[test]
    fn challenge_serialize_is_stable(
        realm in "[ -~]{1,16}",
        nonce in "[0-9a-f]{16,64}",
        qop in proptest::option::of(prop::sample::select(vec!["auth", "auth-int", "auth,auth-int"])),
        stale in proptest::bool::ANY,
    ) {
        let mut map = BTreeMap::new();
        map.insert(ChallengeToken::Realm, SmolStr::new(realm));
        map.insert(ChallengeToken::Nonce, SmolStr::new(nonce));
        map.insert(ChallengeToken::Algorithm, SmolStr::new("MD5"));
        if let Some(v) = qop { map.insert(ChallengeToken::Qop, SmolStr::new(v)); }
        if stale { map.insert(ChallengeToken::Stale, SmolStr::new("true")); }

        let wire = serialize_token_map(&map);
        let reparsed = parse_token_map::<ChallengeToken>(&wire).expect("reparse");
        prop_assert_eq!(&map, &reparsed);
        prop_assert_eq!(wire, serialize_token_map(&reparsed));
    }

    /// Authentication-Info maps survive the round trip.
    #[test]
    fn info_serialize_is_stable(
        nextnonce in "[0-9a-f]{16,64}",
        rspauth in proptest::option::of("[0-9a-f]{32}"),
        nc in proptest::option::of("[0-9a-f]{8}"),
    ) {
        let mut map = BTreeMap::new();
        map.insert(InfoToken::NextNonce, SmolStr::new(nextnonce));
        if let Some(v) = rspauth {
            map.insert(InfoToken::ResponseAuth, SmolStr::new(v));
            map.insert(InfoToken::Qop, SmolStr::new("auth"));
        }
        if let Some(v) = nc { map.insert(InfoToken::NonceCount, SmolStr::new(v)); }

        let wire = serialize_token_map(&map);
        let reparsed = parse_token_map::<InfoToken>(&wire).expect("reparse");
        prop_assert_eq!(&map, &reparsed);
        prop_assert_eq!(wire, serialize_token_map(&reparsed));
    }
}
