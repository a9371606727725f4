// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! SNMP tagged value types and the exceptional response markers.

use crate::{
    ber::{
        decode::{decode_integer, decode_oid, decode_u32, decode_u64, parse_tlv},
        encode::{encode_integer, encode_null, encode_octet_string, encode_oid, encode_unsigned},
        tag::{application, context, universal},
    },
    error::SnmpClientError,
    oid::ObjectIdentifier,
};

/// A tagged SNMP data value, or one of the exceptional response markers.
///
/// `NoSuchObject`/`NoSuchInstance`/`EndOfMibView` only ever appear inside
/// responses; encoding them as an outgoing request value is a client bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectIdentifier(ObjectIdentifier),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),

    /// Exception marker: the named instance does not exist (variable type
    /// unknown to the agent).
    NoSuchObject,
    /// Exception marker: the named instance does not exist for the current
    /// row/column.
    NoSuchInstance,
    /// Exception marker: walked or bulk-fetched past the end of the MIB
    /// view.
    EndOfMibView,
}

impl Value {
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Encodes this value as a single BER TLV using the SNMP application
    /// and context tags from RFC 1155 §3.2.5 / RFC 3416 §2.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Integer(v) => encode_integer(universal::INTEGER, *v),
            Value::OctetString(bytes) => encode_octet_string(universal::OCTET_STRING, bytes),
            Value::Null => encode_null(universal::NULL),
            Value::ObjectIdentifier(oid) => encode_oid(universal::OBJECT_IDENTIFIER, oid),
            Value::IpAddress(bytes) => encode_octet_string(application::IP_ADDRESS, bytes),
            Value::Counter32(v) => encode_unsigned(application::COUNTER32, *v as u64),
            Value::Gauge32(v) => encode_unsigned(application::GAUGE32, *v as u64),
            Value::TimeTicks(v) => encode_unsigned(application::TIME_TICKS, *v as u64),
            Value::Opaque(bytes) => encode_octet_string(application::OPAQUE, bytes),
            Value::Counter64(v) => encode_unsigned(application::COUNTER64, *v),
            Value::NoSuchObject => encode_null(context::NO_SUCH_OBJECT),
            Value::NoSuchInstance => encode_null(context::NO_SUCH_INSTANCE),
            Value::EndOfMibView => encode_null(context::END_OF_MIB_VIEW),
        }
    }

    /// Decodes a single BER TLV into a tagged value.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self, &[u8]), SnmpClientError> {
        let tlv = parse_tlv(buf)?;
        let value = match tlv.tag {
            universal::INTEGER => Value::Integer(decode_integer(tlv.value)?),
            universal::OCTET_STRING => Value::OctetString(tlv.value.to_vec()),
            universal::NULL => {
                if !tlv.value.is_empty() {
                    return Err(SnmpClientError::decoding("NULL with non-zero length"));
                }
                Value::Null
            },
            universal::OBJECT_IDENTIFIER => Value::ObjectIdentifier(decode_oid(tlv.value)?),
            application::IP_ADDRESS => {
                let arr: [u8; 4] = tlv.value.try_into().map_err(|_| {
                    SnmpClientError::decoding("IpAddress must be 4 bytes")
                })?;
                Value::IpAddress(arr)
            },
            application::COUNTER32 => Value::Counter32(decode_u32(tlv.value)?),
            application::GAUGE32 => Value::Gauge32(decode_u32(tlv.value)?),
            application::TIME_TICKS => Value::TimeTicks(decode_u32(tlv.value)?),
            application::OPAQUE => Value::Opaque(tlv.value.to_vec()),
            application::COUNTER64 => Value::Counter64(decode_u64(tlv.value)?),
            context::NO_SUCH_OBJECT => Value::NoSuchObject,
            context::NO_SUCH_INSTANCE => Value::NoSuchInstance,
            context::END_OF_MIB_VIEW => Value::EndOfMibView,
            other => {
                return Err(SnmpClientError::decoding(format!(
                    "unrecognised value tag 0x{other:02x}"
                )));
            },
        };
        Ok((value, tlv.rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trips() {
        let v = Value::Integer(-42);
        let (decoded, rest) = Value::from_bytes(&v.to_bytes()).unwrap();
        assert_eq!(decoded, v);
        assert!(rest.is_empty());
    }

    #[test]
    fn end_of_mib_view_round_trips() {
        let v = Value::EndOfMibView;
        let (decoded, _) = Value::from_bytes(&v.to_bytes()).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn counter64_round_trips() {
        let v = Value::Counter64(u64::MAX);
        let (decoded, _) = Value::from_bytes(&v.to_bytes()).unwrap();
        assert_eq!(decoded, v);
    }
}
