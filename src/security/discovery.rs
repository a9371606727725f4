// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! USM engine discovery (RFC 3414 §4): a single unauthenticated request
//! with an empty `engineID`, `engineBoots` and `engineTime` draws a
//! Report from the authoritative engine carrying all three for real, in
//! one round trip — the engine doesn't need a second request bearing its
//! own id back to it before it will disclose its current boots/time.

use std::{future::Future, pin::Pin};

use crate::{
    error::{Result, SnmpClientError},
    message::{
        codec::{decode_v3_message, encode_v3_message},
        model::{HeaderData, MsgFlags, ScopedPdu, ScopedPduData, V3Message},
    },
    pdu::model::{Pdu, PduContent},
    security::usm::UsmSecurityParameters,
};

/// What discovery learns about a previously-unknown authoritative engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoData {
    pub engine_id: Vec<u8>,
    pub engine_boots: u32,
    pub engine_time: u32,
}

/// One request/response round trip, supplied by the transport layer. Kept
/// separate from any concrete socket type so discovery can be driven
/// against a stub in tests.
pub trait DiscoveryChannel: Send + Sync {
    fn round_trip<'a>(
        &'a self,
        request: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;
}

fn unauthenticated_message(msg_id: i32, security_parameters: Vec<u8>, pdu: Pdu) -> V3Message {
    V3Message {
        header: HeaderData {
            msg_id,
            msg_max_size: 65507,
            flags: MsgFlags { auth: false, priv_: false, reportable: true },
            security_model: 3,
        },
        security_parameters,
        scoped_pdu: ScopedPduData::Plain(ScopedPdu {
            context_engine_id: vec![],
            context_name: vec![],
            pdu,
        }),
    }
}

fn empty_security_params(engine_id: Vec<u8>, boots: u32, time: u32) -> Vec<u8> {
    UsmSecurityParameters {
        authoritative_engine_id: engine_id,
        authoritative_engine_boots: boots,
        authoritative_engine_time: time,
        user_name: vec![],
        auth_params: vec![],
        priv_params: vec![],
    }
    .to_bytes()
}

fn response_security_params(response: &V3Message) -> Result<UsmSecurityParameters> {
    UsmSecurityParameters::from_bytes(&response.security_parameters)
}

/// Sends the bootstrap request — empty `engineID`, zeroed boots/time, no
/// user name — and reads the authoritative engine's real `engineID`,
/// `engineBoots`, and `engineTime` back out of the single Report it sends
/// in response.
pub async fn discover(channel: &dyn DiscoveryChannel, msg_id: i32) -> Result<DiscoData> {
    let request = unauthenticated_message(
        msg_id,
        empty_security_params(vec![], 0, 0),
        Pdu::Get(PduContent::request(msg_id, vec![])),
    );
    let encoded = encode_v3_message(&request);

    let raw = channel.round_trip(&encoded).await?;
    let response = decode_v3_message(&raw)?;
    let params = response_security_params(&response)?;

    if params.authoritative_engine_id.is_empty() {
        return Err(SnmpClientError::FaultySnmpImplementation(
            "discovery response carried an empty engineID".to_string(),
        ));
    }

    Ok(DiscoData {
        engine_id: params.authoritative_engine_id,
        engine_boots: params.authoritative_engine_boots,
        engine_time: params.authoritative_engine_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubChannel {
        engine_id: Vec<u8>,
        engine_boots: u32,
        engine_time: u32,
    }

    impl DiscoveryChannel for StubChannel {
        fn round_trip<'a>(
            &'a self,
            request: &'a [u8],
        ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
            Box::pin(async move {
                let req = decode_v3_message(request)?;
                let response = unauthenticated_message(
                    req.header.msg_id,
                    empty_security_params(
                        self.engine_id.clone(),
                        self.engine_boots,
                        self.engine_time,
                    ),
                    Pdu::Report(PduContent::request(req.header.msg_id, vec![])),
                );
                Ok(encode_v3_message(&response))
            })
        }
    }

    #[tokio::test]
    async fn discovery_learns_engine_id_boots_and_time_in_one_round_trip() {
        let channel = StubChannel {
            engine_id: b"\x80\x00\x1f\x88\x80".to_vec(),
            engine_boots: 4,
            engine_time: 900,
        };
        let disco = discover(&channel, 1).await.unwrap();
        assert_eq!(disco.engine_id, b"\x80\x00\x1f\x88\x80");
        assert_eq!(disco.engine_boots, 4);
        assert_eq!(disco.engine_time, 900);
    }

    struct EmptyEngineIdChannel;

    impl DiscoveryChannel for EmptyEngineIdChannel {
        fn round_trip<'a>(
            &'a self,
            request: &'a [u8],
        ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
            Box::pin(async move {
                let req = decode_v3_message(request)?;
                let response = unauthenticated_message(
                    req.header.msg_id,
                    empty_security_params(vec![], 0, 0),
                    Pdu::Report(PduContent::request(req.header.msg_id, vec![])),
                );
                Ok(encode_v3_message(&response))
            })
        }
    }

    #[tokio::test]
    async fn discovery_rejects_empty_engine_id_response() {
        let err = discover(&EmptyEngineIdChannel, 1).await.unwrap_err();
        assert!(matches!(err, SnmpClientError::FaultySnmpImplementation(_)));
    }
}
