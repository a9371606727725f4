// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, net::SocketAddr, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    cfg::enums::{AuthProtocolKind, PrivProtocolKind},
    client::model::{ClientConfig, Context as SnmpContext, Credentials},
};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Target address and v3 context parameters.
    pub target: TargetConfig,
    /// Security model and credentials for this target.
    pub security: SecurityConfig,
    /// Implementation/runtime parameters that live outside the SNMP protocol.
    pub runtime: RuntimeConfig,
}

/// Target address plus v3 context naming.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TargetConfig {
    #[serde(rename = "Address")]
    /// `host:port` of the agent.
    pub address: String,

    #[serde(default, rename = "ContextEngineId")]
    /// Pre-shared authoritative engine ID, as a hex string. Left empty to
    /// discover it from the agent on first contact.
    pub context_engine_id: String,

    #[serde(default, rename = "ContextName")]
    /// `contextName` of the scoped PDU; empty for the default context.
    pub context_name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(tag = "Version")]
/// Security model selection. v3 stores raw passphrases, never localized
/// keys: localization (RFC 3414 appendix A.2) needs the target's
/// `engineID`, which for a freshly configured target is only known after
/// discovery, so it happens in [`Config::to_client_config`] instead of here.
pub enum SecurityConfig {
    #[serde(rename = "v1")]
    V1 {
        #[serde(rename = "Community")]
        community: String,
    },
    #[serde(rename = "v2c")]
    V2C {
        #[serde(rename = "Community")]
        community: String,
    },
    #[serde(rename = "v3")]
    V3 {
        #[serde(rename = "Username")]
        username: String,
        #[serde(default, rename = "Auth")]
        auth: Option<AuthCredentialConfig>,
        #[serde(default, rename = "Priv")]
        priv_: Option<PrivCredentialConfig>,
    },
}

#[derive(Deserialize, Serialize, Debug, Clone)]
/// Authentication passphrase and protocol for a v3 user.
pub struct AuthCredentialConfig {
    #[serde(rename = "Protocol")]
    pub protocol: AuthProtocolKind,
    #[serde(rename = "Passphrase")]
    pub passphrase: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
/// Privacy passphrase and protocol for a v3 user.
pub struct PrivCredentialConfig {
    #[serde(rename = "Protocol")]
    pub protocol: PrivProtocolKind,
    #[serde(rename = "Passphrase")]
    pub passphrase: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
/// Runtime-only settings that do not map to protocol fields.
pub struct RuntimeConfig {
    #[serde(rename = "Timeout", with = "serde_secs")]
    /// Per-request timeout, applied to each retry attempt individually.
    pub timeout: Duration,

    #[serde(rename = "Retries")]
    /// Number of retries after the initial attempt.
    pub retries: u32,
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let mut cfg: Config = serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Validates invariants that are cheap to check before ever touching the
    /// network.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(!self.target.address.is_empty(), "target.Address must not be empty");
        ensure!(self.runtime.retries <= 10, "runtime.Retries is unreasonably large");
        ensure!(!self.runtime.timeout.is_zero(), "runtime.Timeout must not be zero");

        match &self.security {
            SecurityConfig::V1 { community } | SecurityConfig::V2C { community } => {
                ensure!(!community.is_empty(), "security.Community must not be empty");
            },
            SecurityConfig::V3 { username, auth, priv_ } => {
                ensure!(!username.is_empty(), "security.Username must not be empty for v3");
                ensure!(
                    priv_.is_none() || auth.is_some(),
                    "security.Priv requires security.Auth: privacy without authentication is not supported"
                );
            },
        }

        if !self.target.context_engine_id.is_empty() {
            hex::decode(&self.target.context_engine_id).context("target.ContextEngineId must be a hex string")?;
        }

        Ok(())
    }

    /// Parses `target.Address` into a connectable socket address.
    pub fn endpoint(&self) -> Result<SocketAddr> {
        self.target.address.parse().with_context(|| format!("target.Address '{}' is not host:port", self.target.address))
    }

    /// Parses the pre-shared `target.ContextEngineId`, if any.
    pub fn configured_engine_id(&self) -> Result<Option<Vec<u8>>> {
        if self.target.context_engine_id.is_empty() {
            return Ok(None);
        }
        Ok(Some(hex::decode(&self.target.context_engine_id).context("target.ContextEngineId must be a hex string")?))
    }

    /// Builds the client-facing [`ClientConfig`] for this target given a
    /// known authoritative `engine_id` (from `target.ContextEngineId` or a
    /// prior discovery round trip). v3 passphrases are localized into keys
    /// here, once, rather than on every request.
    pub fn to_client_config(&self, engine_id: &[u8]) -> Result<ClientConfig> {
        let credentials = match &self.security {
            SecurityConfig::V1 { community } => Credentials::V1 { community: community.clone().into_bytes() },
            SecurityConfig::V2C { community } => Credentials::V2C { community: community.clone().into_bytes() },
            SecurityConfig::V3 { username, auth, priv_ } => {
                let auth = auth.as_ref().map(|a| {
                    let protocol = crate::security::AuthProtocol::from(a.protocol);
                    let key = protocol.localize_key(a.passphrase.as_bytes(), engine_id);
                    (protocol, key)
                });
                let priv_ = match (priv_, &auth) {
                    (Some(p), Some((auth_protocol, _))) => {
                        let protocol = crate::security::PrivProtocol::from(p.protocol);
                        let key = auth_protocol.localize_key(p.passphrase.as_bytes(), engine_id);
                        Some((protocol, key))
                    },
                    (Some(_), None) => {
                        return Err(anyhow::anyhow!("security.Priv requires security.Auth"));
                    },
                    (None, _) => None,
                };
                Credentials::V3 { username: username.clone().into_bytes(), auth, priv_ }
            },
        };

        let context = SnmpContext { engine_id: engine_id.to_vec(), name: self.target.context_name.clone().into_bytes() };

        ClientConfig::new(credentials, context, self.runtime.timeout, self.runtime.retries).map_err(anyhow::Error::from)
    }
}

/// Serde helpers for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_v3() -> Config {
        Config {
            target: TargetConfig {
                address: "203.0.113.5:161".to_string(),
                context_engine_id: String::new(),
                context_name: String::new(),
            },
            security: SecurityConfig::V3 {
                username: "admin".to_string(),
                auth: Some(AuthCredentialConfig { protocol: AuthProtocolKind::Sha1, passphrase: "authpassword".to_string() }),
                priv_: Some(PrivCredentialConfig { protocol: PrivProtocolKind::Aes128, passphrase: "privpassword".to_string() }),
            },
            runtime: RuntimeConfig { timeout: Duration::from_secs(2), retries: 1 },
        }
    }

    #[test]
    fn validates_priv_without_auth_as_an_error() {
        let mut cfg = sample_v3();
        if let SecurityConfig::V3 { auth, .. } = &mut cfg.security {
            *auth = None;
        }
        assert!(cfg.validate_and_normalize().is_err());
    }

    #[test]
    fn to_client_config_localizes_passphrases_into_keys() {
        let cfg = sample_v3();
        let engine_id = b"\x80\x00\x1f\x88\x80\x59\x02\x1e\xa7\x15\xa0\x8d\x8b";
        let client_cfg = cfg.to_client_config(engine_id).unwrap();
        match client_cfg.credentials {
            Credentials::V3 { auth, priv_, .. } => {
                let (_, auth_key) = auth.expect("auth key");
                assert_ne!(auth_key, b"authpassword".to_vec());
                let (_, priv_key) = priv_.expect("priv key");
                assert_ne!(priv_key, b"privpassword".to_vec());
            },
            _ => panic!("expected v3 credentials"),
        }
    }

    #[test]
    fn rejects_malformed_engine_id_hex() {
        let mut cfg = sample_v3();
        cfg.target.context_engine_id = "not-hex".to_string();
        assert!(cfg.validate_and_normalize().is_err());
    }
}
