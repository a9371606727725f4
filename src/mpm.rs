// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Message Processing Model dispatch (RFC 3412 §4): per-version encode/decode
//! of the outer SNMP message. v1/v2c are trivial wrappers; v3 delegates
//! security handling to [`crate::security::usm`].

use rand::Rng;

use crate::{
    client::model::{Context, Credentials},
    error::{Result, SnmpClientError},
    message::{
        codec::{decode_v1v2_message, decode_v3_message, encode_v1v2_message, encode_v3_message},
        model::{HeaderData, MsgFlags, ScopedPdu, ScopedPduData},
    },
    pdu::model::Pdu,
    security::{
        discovery::DiscoData,
        usm::{generate_request_message, process_incoming_message, UsmSecurityParameters, V3Credentials},
    },
};

/// Authoritative engine state needed to address a v3 message. Populated by
/// discovery, refreshed by every authenticated response.
#[derive(Debug, Clone, Copy)]
pub struct EngineState<'a> {
    pub engine_id: &'a [u8],
    pub engine_boots: u32,
    pub engine_time: u32,
}

/// Result of decoding one response datagram: the PDU, plus (for v3) the
/// engine state observed in this message, which the caller folds into the
/// LCD on every successful response, not only on Report.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub pdu: Pdu,
    pub refreshed_engine: Option<DiscoData>,
}

/// Per-version encode/decode. `V1V2c` covers both v1 and v2c: the two
/// differ only in the `version` integer, which is read off `Credentials`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mpm {
    V1V2c,
    V3,
}

impl Mpm {
    pub fn for_credentials(credentials: &Credentials) -> Self {
        match credentials {
            Credentials::V1 { .. } | Credentials::V2C { .. } => Mpm::V1V2c,
            Credentials::V3 { .. } => Mpm::V3,
        }
    }

    /// Encodes one outgoing request. For v3, `engine` must already be
    /// populated (by discovery) before this is called.
    pub fn encode(
        self,
        request_id: i32,
        credentials: &Credentials,
        context: &Context,
        engine: Option<EngineState<'_>>,
        pdu: Pdu,
    ) -> Result<Vec<u8>> {
        match (self, credentials) {
            (Mpm::V1V2c, Credentials::V1 { community }) => {
                Ok(encode_v1v2_message(0, community, &pdu))
            },
            (Mpm::V1V2c, Credentials::V2C { community }) => {
                Ok(encode_v1v2_message(1, community, &pdu))
            },
            (Mpm::V3, Credentials::V3 { username, auth, priv_ }) => {
                let engine = engine.ok_or_else(|| {
                    SnmpClientError::TypeError(
                        "v3 encode requires a discovered engine state".to_string(),
                    )
                })?;
                let header = HeaderData {
                    msg_id: request_id,
                    msg_max_size: 65507,
                    flags: MsgFlags {
                        auth: auth.is_some(),
                        priv_: priv_.is_some(),
                        reportable: true,
                    },
                    security_model: 3,
                };
                let scoped_pdu = ScopedPdu {
                    context_engine_id: context.engine_id.clone(),
                    context_name: context.name.clone(),
                    pdu,
                };
                let creds = V3Credentials {
                    username: username.clone(),
                    auth: auth.clone(),
                    priv: priv_.clone(),
                };
                let mut salt = [0u8; 8];
                rand::rng().fill(&mut salt);
                let message = generate_request_message(
                    header,
                    scoped_pdu,
                    engine.engine_id,
                    engine.engine_boots,
                    engine.engine_time,
                    &creds,
                    salt,
                )?;
                Ok(encode_v3_message(&message))
            },
            _ => Err(SnmpClientError::TypeError(
                "MPM variant does not match credentials variant".to_string(),
            )),
        }
    }

    /// Decodes a response datagram. For v1/v2c this validates the echoed
    /// community string; for v3 it runs full USM verification/decryption
    /// and reports the engine state observed in the message so the caller
    /// can refresh the LCD, per RFC 3414 §2.3 ("on each successful
    /// auth'd response, update LCD with the received boots/time").
    pub fn decode(self, bytes: &[u8], credentials: &Credentials) -> Result<Decoded> {
        match (self, credentials) {
            (Mpm::V1V2c, Credentials::V1 { community } | Credentials::V2C { community }) => {
                let (_version, resp_community, pdu) = decode_v1v2_message(bytes)?;
                if &resp_community != community {
                    return Err(SnmpClientError::decoding("community string mismatch"));
                }
                Ok(Decoded { pdu, refreshed_engine: None })
            },
            (Mpm::V3, Credentials::V3 { username, auth, priv_ }) => {
                let message = decode_v3_message(bytes)?;
                let creds = V3Credentials {
                    username: username.clone(),
                    auth: auth.clone(),
                    priv: priv_.clone(),
                };
                let verified = process_incoming_message(message, &creds)?;
                let params = UsmSecurityParameters::from_bytes(&verified.security_parameters)?;
                let refreshed_engine = Some(DiscoData {
                    engine_id: params.authoritative_engine_id,
                    engine_boots: params.authoritative_engine_boots,
                    engine_time: params.authoritative_engine_time,
                });

                let ScopedPduData::Plain(scoped_pdu) = verified.scoped_pdu else {
                    return Err(SnmpClientError::decoding(
                        "decoded message still carried an opaque scoped PDU",
                    ));
                };

                Ok(Decoded { pdu: scoped_pdu.pdu, refreshed_engine })
            },
            _ => Err(SnmpClientError::TypeError(
                "MPM variant does not match credentials variant".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{oid::ObjectIdentifier, pdu::model::PduContent, value::Value, varbind::VarBind};

    #[test]
    fn v1v2c_round_trips_through_mpm() {
        let credentials = Credentials::V2C { community: b"public".to_vec() };
        let mpm = Mpm::for_credentials(&credentials);
        let oid = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.1.1.0").unwrap();
        let pdu = Pdu::Get(PduContent::request(42, vec![VarBind::new(oid, Value::Null)]));
        let context = Context::default();

        let encoded = mpm.encode(42, &credentials, &context, None, pdu.clone()).unwrap();
        let decoded = mpm.decode(&encoded, &credentials).unwrap();
        assert_eq!(decoded.pdu, pdu);
        assert!(decoded.refreshed_engine.is_none());
    }

    #[test]
    fn v3_encode_requires_engine_state() {
        let credentials = Credentials::V3 { username: b"alice".to_vec(), auth: None, priv_: None };
        let mpm = Mpm::for_credentials(&credentials);
        let oid = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.1.1.0").unwrap();
        let pdu = Pdu::Get(PduContent::request(1, vec![VarBind::new(oid, Value::Null)]));
        let err = mpm
            .encode(1, &credentials, &Context::default(), None, pdu)
            .unwrap_err();
        assert!(matches!(err, SnmpClientError::TypeError(_)));
    }
}
