// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Named HMAC authentication algorithms (RFC 3414 §6, Appendix A).

use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;

use crate::error::{SnmpClientError, UsmErrorKind};

/// Length, in bytes, of the authentication digest placed in `auth_params`.
pub const AUTH_DIGEST_LEN: usize = 12;

/// Closed set of supported authentication protocols. Mirrors the way
/// `original_source` resolves an algorithm by name, but as a Rust enum
/// rather than a runtime string registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocol {
    Md5,
    Sha1,
}

impl AuthProtocol {
    fn key_digest_len(self) -> usize {
        match self {
            AuthProtocol::Md5 => 16,
            AuthProtocol::Sha1 => 20,
        }
    }

    /// RFC 3414 Appendix A.2.1: expands `passphrase` cyclically to exactly
    /// one megabyte and digests the stream.
    fn password_to_key(self, passphrase: &[u8]) -> Vec<u8> {
        const EXPANDED_LEN: usize = 1_048_576;
        let mut buf = vec![0u8; 64];
        let mut total = 0usize;
        let mut cursor = 0usize;

        match self {
            AuthProtocol::Md5 => {
                use md5::Digest;
                let mut hasher = Md5::new();
                while total < EXPANDED_LEN {
                    for b in buf.iter_mut() {
                        *b = passphrase[cursor % passphrase.len()];
                        cursor += 1;
                    }
                    hasher.update(&buf);
                    total += 64;
                }
                hasher.finalize().to_vec()
            },
            AuthProtocol::Sha1 => {
                use sha1::Digest;
                let mut hasher = Sha1::new();
                while total < EXPANDED_LEN {
                    for b in buf.iter_mut() {
                        *b = passphrase[cursor % passphrase.len()];
                        cursor += 1;
                    }
                    hasher.update(&buf);
                    total += 64;
                }
                hasher.finalize().to_vec()
            },
        }
    }

    /// RFC 3414 Appendix A.2.2: localizes a user key to a specific
    /// authoritative engine.
    pub fn localize_key(self, passphrase: &[u8], engine_id: &[u8]) -> Vec<u8> {
        let ku = self.password_to_key(passphrase);
        let mut data = Vec::with_capacity(ku.len() * 2 + engine_id.len());
        data.extend_from_slice(&ku);
        data.extend_from_slice(engine_id);
        data.extend_from_slice(&ku);

        match self {
            AuthProtocol::Md5 => {
                use md5::Digest;
                let mut hasher = Md5::new();
                hasher.update(&data);
                hasher.finalize().to_vec()
            },
            AuthProtocol::Sha1 => {
                use sha1::Digest;
                let mut hasher = Sha1::new();
                hasher.update(&data);
                hasher.finalize().to_vec()
            },
        }
    }

    /// Computes the 12-byte truncated HMAC digest over `whole_message`
    /// (with the `auth_params` slot already zeroed in place).
    pub fn authenticate_outgoing(
        self,
        key: &[u8],
        whole_message: &[u8],
    ) -> Result<[u8; AUTH_DIGEST_LEN], SnmpClientError> {
        let full = self.hmac(key, whole_message)?;
        let mut out = [0u8; AUTH_DIGEST_LEN];
        out.copy_from_slice(&full[..AUTH_DIGEST_LEN]);
        Ok(out)
    }

    /// Verifies `expected_digest` against a fresh computation over
    /// `whole_message` (with the `auth_params` slot zeroed in place).
    pub fn authenticate_incoming(
        self,
        key: &[u8],
        whole_message: &[u8],
        expected_digest: &[u8],
    ) -> Result<(), SnmpClientError> {
        if expected_digest.len() != AUTH_DIGEST_LEN {
            return Err(UsmErrorKind::AuthFailure.into());
        }
        let computed = self.authenticate_outgoing(key, whole_message)?;
        if computed.as_slice() == expected_digest {
            Ok(())
        } else {
            Err(UsmErrorKind::AuthFailure.into())
        }
    }

    fn hmac(self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, SnmpClientError> {
        debug_assert_eq!(key.len(), self.key_digest_len());
        match self {
            AuthProtocol::Md5 => {
                let mut mac = Hmac::<Md5>::new_from_slice(key)
                    .map_err(|_| SnmpClientError::encoding("invalid auth key length"))?;
                mac.update(message);
                Ok(mac.finalize().into_bytes().to_vec())
            },
            AuthProtocol::Sha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(key)
                    .map_err(|_| SnmpClientError::encoding("invalid auth key length"))?;
                mac.update(message);
                Ok(mac.finalize().into_bytes().to_vec())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let key = AuthProtocol::Md5.localize_key(b"maplesyrup", b"\x80\x00\x1f\x88\x80");
        let message = b"hello snmp world, this is a message body";
        let digest = AuthProtocol::Md5.authenticate_outgoing(&key, message).unwrap();
        AuthProtocol::Md5
            .authenticate_incoming(&key, message, &digest)
            .unwrap();
    }

    #[test]
    fn tampering_breaks_verification() {
        let key = AuthProtocol::Sha1.localize_key(b"maplesyrup", b"\x80\x00\x1f\x88\x80");
        let message = b"hello snmp world, this is a message body".to_vec();
        let digest = AuthProtocol::Sha1.authenticate_outgoing(&key, &message).unwrap();

        let mut tampered = message.clone();
        tampered[0] ^= 0xFF;
        assert!(
            AuthProtocol::Sha1
                .authenticate_incoming(&key, &tampered, &digest)
                .is_err()
        );
    }
}
