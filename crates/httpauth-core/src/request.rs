// httpauth-rs - HTTP Digest Authentication
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytes::Bytes;
use smol_str::SmolStr;

use crate::{headers::Headers, method::Method};

/// The slice of an HTTP request the authentication layer consumes.
///
/// Connection handling and routing live outside this stack; a server adapter
/// builds one of these per request from whatever HTTP front end it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// The request-target exactly as it appeared in the request line.
    pub target: SmolStr,
    pub headers: Headers,
    pub body: Bytes,
}

impl Request {
    /// Creates a request from its parts.
    pub fn new(method: Method, target: impl Into<SmolStr>, headers: Headers, body: Bytes) -> Self {
        Self {
            method,
            target: target.into(),
            headers,
            body,
        }
    }
}
