// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::security::{AuthProtocol, PrivProtocol};

/// Config-file spelling of an authentication protocol (RFC 3414 §6).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocolKind {
    #[serde(rename = "MD5", alias = "md5")]
    Md5,
    #[serde(rename = "SHA1", alias = "sha1", alias = "SHA")]
    Sha1,
}
impl fmt::Display for AuthProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthProtocolKind::Md5 => "MD5",
            AuthProtocolKind::Sha1 => "SHA1",
        })
    }
}
impl From<AuthProtocolKind> for AuthProtocol {
    fn from(kind: AuthProtocolKind) -> Self {
        match kind {
            AuthProtocolKind::Md5 => AuthProtocol::Md5,
            AuthProtocolKind::Sha1 => AuthProtocol::Sha1,
        }
    }
}

/// Config-file spelling of a privacy protocol (RFC 3414 §8, RFC 3826).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivProtocolKind {
    #[serde(rename = "DES", alias = "des")]
    Des,
    #[serde(rename = "AES128", alias = "aes128", alias = "AES")]
    Aes128,
}
impl fmt::Display for PrivProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrivProtocolKind::Des => "DES",
            PrivProtocolKind::Aes128 => "AES128",
        })
    }
}
impl From<PrivProtocolKind> for PrivProtocol {
    fn from(kind: PrivProtocolKind) -> Self {
        match kind {
            PrivProtocolKind::Des => PrivProtocol::Des,
            PrivProtocolKind::Aes128 => PrivProtocol::Aes128,
        }
    }
}
