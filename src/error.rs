// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Error taxonomy for the SNMP client pipeline.

use thiserror::Error;

use crate::oid::ObjectIdentifier;

pub type Result<T> = std::result::Result<T, SnmpClientError>;

/// USM (SNMPv3 security) failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsmErrorKind {
    #[error("user name in response does not match configured credentials")]
    UnknownUser,
    #[error("security level requested is not supported by the configured credentials")]
    UnsupportedSecurityLevel,
    #[error("authentication digest verification failed")]
    AuthFailure,
    #[error("privacy decryption failed")]
    DecryptionError,
    #[error("message outside the authoritative engine's time window")]
    NotInTimeWindow,
}

/// Server-reported error-status values (RFC 1157 / RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    Other(i64),
}

impl From<i64> for ErrorStatus {
    fn from(v: i64) -> Self {
        match v {
            0 => ErrorStatus::NoError,
            1 => ErrorStatus::TooBig,
            2 => ErrorStatus::NoSuchName,
            3 => ErrorStatus::BadValue,
            4 => ErrorStatus::ReadOnly,
            5 => ErrorStatus::GenErr,
            other => ErrorStatus::Other(other),
        }
    }
}

/// Top-level error type returned by every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum SnmpClientError {
    #[error("transport timed out after exhausting retries: {0}")]
    Timeout(String),

    #[error("failed to encode wire message: {0}")]
    EncodingError(String),

    #[error("failed to decode wire message: {0}")]
    DecodingError(String),

    #[error(
        "device returned error-status {status:?} at index {error_index} for oid {oid:?}"
    )]
    SnmpError {
        status: ErrorStatus,
        error_index: i64,
        oid: Option<ObjectIdentifier>,
    },

    #[error("request id mismatch: expected {expected}, got {actual}")]
    RequestIdMismatch { expected: i32, actual: i32 },

    #[error("cardinality mismatch: expected {expected} varbinds, got {actual}")]
    CardinalityMismatch { expected: usize, actual: usize },

    #[error("device reported NoSuchObject/NoSuchInstance for {0:?}")]
    NoSuchOid(ObjectIdentifier),

    #[error("faulty SNMP implementation: {0}")]
    FaultySnmpImplementation(String),

    #[error("USM error: {0}")]
    Usm(#[from] UsmErrorKind),

    #[error("client API misuse: {0}")]
    TypeError(String),
}

impl SnmpClientError {
    pub fn decoding(msg: impl Into<String>) -> Self {
        SnmpClientError::DecodingError(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        SnmpClientError::EncodingError(msg.into())
    }
}
