// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{collections::HashMap, time::Duration};

use crate::{
    error::{Result, SnmpClientError},
    oid::ObjectIdentifier,
    security::{AuthProtocol, Lcd, PrivProtocol},
    value::Value,
};

/// Security credentials for one target. `V1`/`V2C` carry only a community
/// string; `V3` carries a user name plus optional auth/priv key material.
#[derive(Debug, Clone)]
pub enum Credentials {
    V1 { community: Vec<u8> },
    V2C { community: Vec<u8> },
    V3 {
        username: Vec<u8>,
        auth: Option<(AuthProtocol, Vec<u8>)>,
        priv_: Option<(PrivProtocol, Vec<u8>)>,
    },
}

impl Credentials {
    /// Enforces `priv ⇒ auth`: privacy without authentication is not a
    /// representable security level.
    pub fn validate(&self) -> Result<()> {
        if let Credentials::V3 { auth, priv_, .. } = self {
            if priv_.is_some() && auth.is_none() {
                return Err(SnmpClientError::TypeError(
                    "V3 credentials: privacy requires authentication".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn is_v3(&self) -> bool {
        matches!(self, Credentials::V3 { .. })
    }
}

/// v3 context; ignored for v1/v2c.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub engine_id: Vec<u8>,
    pub name: Vec<u8>,
}

/// Immutable snapshot of everything needed to talk to one target. The
/// client holds exactly one current config, replaceable only via a scoped
/// override (see `client::reconfigure`).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub context: Context,
    pub lcd: Lcd,
    pub timeout: Duration,
    pub retries: u32,
}

impl ClientConfig {
    pub fn new(credentials: Credentials, context: Context, timeout: Duration, retries: u32) -> Result<Self> {
        credentials.validate()?;
        Ok(Self { credentials, context, lcd: Lcd::new(), timeout, retries })
    }
}

/// Result of a `bulkget`/`bulktable`-style request: the non-repeated
/// scalars, plus the repeated listing in wire order.
#[derive(Debug, Clone, Default)]
pub struct BulkResult {
    pub scalars: HashMap<ObjectIdentifier, Value>,
    pub listing: Vec<(ObjectIdentifier, Value)>,
}
