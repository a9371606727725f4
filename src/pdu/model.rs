// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{oid::ObjectIdentifier, varbind::VarBind};

/// Shared shape carried by every PDU variant except `BulkGet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduContent {
    /// 31-bit non-negative request identifier.
    pub request_id: i32,
    /// Non-zero only on `Response`/`Report`.
    pub error_status: i64,
    pub error_index: i64,
    pub varbinds: Vec<VarBind>,
}

impl PduContent {
    pub fn request(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }
}

/// Tagged sum type covering every PDU shape used on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pdu {
    Get(PduContent),
    GetNext(PduContent),
    Set(PduContent),
    Response(PduContent),
    Report(PduContent),
    Trap(PduContent),
    InformRequest(PduContent),
    BulkGet {
        request_id: i32,
        non_repeaters: u32,
        max_repetitions: u32,
        oids: Vec<ObjectIdentifier>,
    },
}

impl Pdu {
    pub fn request_id(&self) -> i32 {
        match self {
            Pdu::Get(c)
            | Pdu::GetNext(c)
            | Pdu::Set(c)
            | Pdu::Response(c)
            | Pdu::Report(c)
            | Pdu::Trap(c)
            | Pdu::InformRequest(c) => c.request_id,
            Pdu::BulkGet { request_id, .. } => *request_id,
        }
    }

    /// Constructs a `BulkGet`, clamping `non_repeaters` to the number of
    /// supplied OIDs per the PDU-model invariant.
    pub fn bulk_get(
        request_id: i32,
        non_repeaters: u32,
        max_repetitions: u32,
        oids: Vec<ObjectIdentifier>,
    ) -> Self {
        let non_repeaters = non_repeaters.min(oids.len() as u32);
        Pdu::BulkGet {
            request_id,
            non_repeaters,
            max_repetitions,
            oids,
        }
    }
}
