// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Typed representation of Get/GetNext/GetBulk/Set/Response/Report/Trap
//! PDUs and their varbind payloads.

pub mod codec;
pub mod model;

pub use model::{Pdu, PduContent};
