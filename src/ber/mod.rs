// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Hand-rolled BER/TLV codec: the "wire codec adapter" the rest of the
//! crate is built on. Out of scope of the original distillation (treated
//! there as an external ASN.1 library), implemented here directly since
//! SNMP only needs a fixed, small tag table rather than a general ASN.1
//! framework.

pub mod decode;
pub mod encode;
pub mod tag;

pub use decode::{Tlv, parse_tlv, read_length};
pub use encode::{encode_integer, encode_length, encode_octet_string, encode_oid, encode_tlv};
