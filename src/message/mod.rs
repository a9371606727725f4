// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The outer SNMP message envelope: v1/v2c `(version, community, pdu)` and
//! the v3 `(version, HeaderData, security_parameters, scoped_pdu)` shape.

pub mod codec;
pub mod model;

pub use codec::{
    decode_scoped_pdu_plain, decode_v1v2_message, decode_v3_message, encode_scoped_pdu_plain,
    encode_v1v2_message, encode_v3_message,
};
pub use model::{HeaderData, MsgFlags, ScopedPdu, ScopedPduData, V3Message};
