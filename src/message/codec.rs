// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{
    ber::{
        decode::{decode_integer, parse_tlv},
        encode::{encode_integer, encode_octet_string, encode_tlv},
        tag::universal,
    },
    error::SnmpClientError,
    message::model::{HeaderData, MsgFlags, ScopedPdu, ScopedPduData, V3Message},
    pdu::{
        codec::{decode_pdu, encode_pdu},
        model::Pdu,
    },
};

/// Encodes a v1/v2c message: `SEQUENCE { version, community, pdu }`.
pub fn encode_v1v2_message(version: i64, community: &[u8], pdu: &Pdu) -> Vec<u8> {
    let mut body = encode_integer(universal::INTEGER, version);
    body.extend(encode_octet_string(universal::OCTET_STRING, community));
    body.extend(encode_pdu(pdu));
    encode_tlv(universal::SEQUENCE, &body)
}

/// Decodes a v1/v2c message, returning `(version, community, pdu)`.
pub fn decode_v1v2_message(buf: &[u8]) -> Result<(i64, Vec<u8>, Pdu), SnmpClientError> {
    let outer = parse_tlv(buf)?;
    if outer.tag != universal::SEQUENCE {
        return Err(SnmpClientError::decoding("expected message SEQUENCE"));
    }
    let version_tlv = parse_tlv(outer.value)?;
    let version = decode_integer(version_tlv.value)?;

    let community_tlv = parse_tlv(version_tlv.rest)?;
    let community = community_tlv.value.to_vec();

    let pdu = decode_pdu(community_tlv.rest)?;
    Ok((version, community, pdu))
}

fn encode_header_data(header: &HeaderData) -> Vec<u8> {
    let mut body = encode_integer(universal::INTEGER, header.msg_id as i64);
    body.extend(encode_integer(universal::INTEGER, header.msg_max_size as i64));
    body.extend(encode_octet_string(universal::OCTET_STRING, &[header.flags.to_byte()]));
    body.extend(encode_integer(universal::INTEGER, header.security_model as i64));
    encode_tlv(universal::SEQUENCE, &body)
}

fn decode_header_data(buf: &[u8]) -> Result<HeaderData, SnmpClientError> {
    let tlv = parse_tlv(buf)?;
    if tlv.tag != universal::SEQUENCE {
        return Err(SnmpClientError::decoding("expected HeaderData SEQUENCE"));
    }
    let id_tlv = parse_tlv(tlv.value)?;
    let msg_id = decode_integer(id_tlv.value)? as i32;

    let size_tlv = parse_tlv(id_tlv.rest)?;
    let msg_max_size = decode_integer(size_tlv.value)? as i32;

    let flags_tlv = parse_tlv(size_tlv.rest)?;
    let flags_byte = *flags_tlv
        .value
        .first()
        .ok_or_else(|| SnmpClientError::decoding("empty msgFlags"))?;
    let flags = MsgFlags::from_byte(flags_byte);
    if flags.priv_ && !flags.auth {
        return Err(SnmpClientError::decoding(
            "invalid msgFlags: privacy without authentication",
        ));
    }

    let model_tlv = parse_tlv(flags_tlv.rest)?;
    let security_model = decode_integer(model_tlv.value)? as i32;

    Ok(HeaderData {
        msg_id,
        msg_max_size,
        flags,
        security_model,
    })
}

pub fn encode_scoped_pdu_plain(sp: &ScopedPdu) -> Vec<u8> {
    let mut body = encode_octet_string(universal::OCTET_STRING, &sp.context_engine_id);
    body.extend(encode_octet_string(universal::OCTET_STRING, &sp.context_name));
    body.extend(encode_pdu(&sp.pdu));
    encode_tlv(universal::SEQUENCE, &body)
}

pub fn decode_scoped_pdu_plain(buf: &[u8]) -> Result<ScopedPdu, SnmpClientError> {
    let engine_tlv = parse_tlv(buf)?;
    let context_engine_id = engine_tlv.value.to_vec();

    let name_tlv = parse_tlv(engine_tlv.rest)?;
    let context_name = name_tlv.value.to_vec();

    let pdu = decode_pdu(name_tlv.rest)?;
    Ok(ScopedPdu {
        context_engine_id,
        context_name,
        pdu,
    })
}

/// Encodes a full v3 message: `SEQUENCE { version=3, HeaderData,
/// msgSecurityParameters, scopedPduData }`.
pub fn encode_v3_message(msg: &V3Message) -> Vec<u8> {
    let mut body = encode_integer(universal::INTEGER, 3);
    body.extend(encode_header_data(&msg.header));
    body.extend(encode_octet_string(universal::OCTET_STRING, &msg.security_parameters));
    body.extend(match &msg.scoped_pdu {
        ScopedPduData::Plain(sp) => encode_scoped_pdu_plain(sp),
        ScopedPduData::Encrypted(ct) => encode_octet_string(universal::OCTET_STRING, ct),
    });
    encode_tlv(universal::SEQUENCE, &body)
}

/// Decodes a full v3 message.
pub fn decode_v3_message(buf: &[u8]) -> Result<V3Message, SnmpClientError> {
    let outer = parse_tlv(buf)?;
    if outer.tag != universal::SEQUENCE {
        return Err(SnmpClientError::decoding("expected message SEQUENCE"));
    }
    let version_tlv = parse_tlv(outer.value)?;
    let version = decode_integer(version_tlv.value)?;
    if version != 3 {
        return Err(SnmpClientError::decoding(format!("unknown SNMP version: {version}")));
    }

    let header = decode_header_data(version_tlv.rest)?;
    let header_tlv = parse_tlv(version_tlv.rest)?;

    let sec_params_tlv = parse_tlv(header_tlv.rest)?;
    let security_parameters = sec_params_tlv.value.to_vec();

    let scoped_tlv = parse_tlv(sec_params_tlv.rest)?;
    let scoped_pdu = if scoped_tlv.tag == universal::OCTET_STRING {
        ScopedPduData::Encrypted(scoped_tlv.value.to_vec())
    } else {
        ScopedPduData::Plain(decode_scoped_pdu_plain(sec_params_tlv.rest)?)
    };

    Ok(V3Message {
        header,
        security_parameters,
        scoped_pdu,
    })
}
