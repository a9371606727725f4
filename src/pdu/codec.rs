// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `to_bytes`/`from_bytes` for PDUs: encode → decode is the identity on
//! canonical input (invariant 1, §8 of the design).

use crate::{
    ber::{
        decode::{decode_integer, decode_oid, parse_tlv},
        encode::{encode_integer, encode_oid, encode_tlv},
        tag::{pdu as pdu_tag, universal},
    },
    error::SnmpClientError,
    oid::ObjectIdentifier,
    pdu::model::{Pdu, PduContent},
    value::Value,
    varbind::VarBind,
};

fn encode_varbind(vb: &VarBind) -> Vec<u8> {
    let mut body = encode_oid(universal::OBJECT_IDENTIFIER, &vb.oid);
    body.extend(vb.value.to_bytes());
    encode_tlv(universal::SEQUENCE, &body)
}

fn decode_varbind(buf: &[u8]) -> Result<VarBind, SnmpClientError> {
    let oid_tlv = parse_tlv(buf)?;
    if oid_tlv.tag != universal::OBJECT_IDENTIFIER {
        return Err(SnmpClientError::decoding("varbind missing OID"));
    }
    let oid = decode_oid(oid_tlv.value)?;
    let (value, rest) = Value::from_bytes(oid_tlv.rest)?;
    if !rest.is_empty() {
        return Err(SnmpClientError::decoding("trailing bytes after varbind value"));
    }
    Ok(VarBind::new(oid, value))
}

fn encode_varbind_list(varbinds: &[VarBind]) -> Vec<u8> {
    let mut body = Vec::new();
    for vb in varbinds {
        body.extend(encode_varbind(vb));
    }
    encode_tlv(universal::SEQUENCE, &body)
}

fn decode_varbind_list(buf: &[u8]) -> Result<Vec<VarBind>, SnmpClientError> {
    let tlv = parse_tlv(buf)?;
    if tlv.tag != universal::SEQUENCE {
        return Err(SnmpClientError::decoding("expected VarBindList SEQUENCE"));
    }
    let mut out = Vec::new();
    let mut rest = tlv.value;
    while !rest.is_empty() {
        let entry = parse_tlv(rest)?;
        if entry.tag != universal::SEQUENCE {
            return Err(SnmpClientError::decoding("expected VarBind SEQUENCE"));
        }
        out.push(decode_varbind(entry.value)?);
        rest = entry.rest;
    }
    Ok(out)
}

fn encode_pdu_content(content: &PduContent) -> Vec<u8> {
    let mut body = encode_integer(universal::INTEGER, content.request_id as i64);
    body.extend(encode_integer(universal::INTEGER, content.error_status));
    body.extend(encode_integer(universal::INTEGER, content.error_index));
    body.extend(encode_varbind_list(&content.varbinds));
    body
}

fn decode_pdu_content(buf: &[u8]) -> Result<PduContent, SnmpClientError> {
    let req_tlv = parse_tlv(buf)?;
    let request_id = decode_integer(req_tlv.value)? as i32;

    let err_tlv = parse_tlv(req_tlv.rest)?;
    let error_status = decode_integer(err_tlv.value)?;

    let idx_tlv = parse_tlv(err_tlv.rest)?;
    let error_index = decode_integer(idx_tlv.value)?;

    let varbinds = decode_varbind_list(idx_tlv.rest)?;

    Ok(PduContent {
        request_id,
        error_status,
        error_index,
        varbinds,
    })
}

fn tag_for(pdu: &Pdu) -> u8 {
    match pdu {
        Pdu::Get(_) => pdu_tag::GET_REQUEST,
        Pdu::GetNext(_) => pdu_tag::GET_NEXT_REQUEST,
        Pdu::Set(_) => pdu_tag::SET_REQUEST,
        Pdu::Response(_) => pdu_tag::RESPONSE,
        Pdu::Report(_) => pdu_tag::REPORT,
        Pdu::Trap(_) => pdu_tag::TRAP_V2,
        Pdu::InformRequest(_) => pdu_tag::INFORM_REQUEST,
        Pdu::BulkGet { .. } => pdu_tag::GET_BULK_REQUEST,
    }
}

/// Encodes a PDU, tag included, ready to be embedded into a Message.
pub fn encode_pdu(pdu: &Pdu) -> Vec<u8> {
    let tag = tag_for(pdu);
    let body = match pdu {
        Pdu::Get(c)
        | Pdu::GetNext(c)
        | Pdu::Set(c)
        | Pdu::Response(c)
        | Pdu::Report(c)
        | Pdu::Trap(c)
        | Pdu::InformRequest(c) => encode_pdu_content(c),
        Pdu::BulkGet {
            request_id,
            non_repeaters,
            max_repetitions,
            oids,
        } => {
            let mut body = encode_integer(universal::INTEGER, *request_id as i64);
            body.extend(encode_integer(universal::INTEGER, *non_repeaters as i64));
            body.extend(encode_integer(universal::INTEGER, *max_repetitions as i64));
            let placeholders: Vec<VarBind> = oids
                .iter()
                .map(|oid| VarBind::new(oid.clone(), Value::Null))
                .collect();
            body.extend(encode_varbind_list(&placeholders));
            body
        },
    };
    encode_tlv(tag, &body)
}

/// Decodes a tagged PDU TLV (tag included) into a typed `Pdu`.
pub fn decode_pdu(buf: &[u8]) -> Result<Pdu, SnmpClientError> {
    let tlv = parse_tlv(buf)?;
    match tlv.tag {
        pdu_tag::GET_REQUEST => Ok(Pdu::Get(decode_pdu_content(tlv.value)?)),
        pdu_tag::GET_NEXT_REQUEST => Ok(Pdu::GetNext(decode_pdu_content(tlv.value)?)),
        pdu_tag::SET_REQUEST => Ok(Pdu::Set(decode_pdu_content(tlv.value)?)),
        pdu_tag::RESPONSE => Ok(Pdu::Response(decode_pdu_content(tlv.value)?)),
        pdu_tag::REPORT => Ok(Pdu::Report(decode_pdu_content(tlv.value)?)),
        pdu_tag::TRAP_V2 => Ok(Pdu::Trap(decode_pdu_content(tlv.value)?)),
        pdu_tag::INFORM_REQUEST => Ok(Pdu::InformRequest(decode_pdu_content(tlv.value)?)),
        pdu_tag::GET_BULK_REQUEST => {
            let req_tlv = parse_tlv(tlv.value)?;
            let request_id = decode_integer(req_tlv.value)? as i32;
            let nr_tlv = parse_tlv(req_tlv.rest)?;
            let non_repeaters = decode_integer(nr_tlv.value)? as u32;
            let mr_tlv = parse_tlv(nr_tlv.rest)?;
            let max_repetitions = decode_integer(mr_tlv.value)? as u32;
            let varbinds = decode_varbind_list(mr_tlv.rest)?;
            let oids: Vec<ObjectIdentifier> = varbinds.into_iter().map(|vb| vb.oid).collect();
            Ok(Pdu::bulk_get(request_id, non_repeaters, max_repetitions, oids))
        },
        other => Err(SnmpClientError::decoding(format!("unknown PDU tag 0x{other:02x}"))),
    }
}
