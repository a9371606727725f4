// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The User-based Security Model: authentication and privacy primitives
//! (RFC 3414 §§6-8), the wire shape of `msgSecurityParameters`, engine
//! discovery, and the per-engine timeliness cache.

pub mod auth;
pub mod discovery;
pub mod lcd;
pub mod priv_crypto;
pub mod usm;

pub use auth::AuthProtocol;
pub use discovery::{discover, DiscoData, DiscoveryChannel};
pub use lcd::{EngineTime, Lcd};
pub use priv_crypto::PrivProtocol;
pub use usm::{UsmSecurityParameters, V3Credentials};
