// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Conceptual-table assembly: turns the flat varbind sequence produced by
//! a walk rooted at a table's base OID into a list of row dicts, the way
//! `tablify` does — one dict per row, keyed by column id string, with
//! key `"0"` auto-injected as the row's partial-OID suffix string.

use std::collections::HashMap;

use crate::{
    error::{Result, SnmpClientError},
    oid::ObjectIdentifier,
    value::Value,
    varbind::VarBind,
};

/// One conceptual table: a row per distinct index suffix, each row a
/// `column id string -> value` dict. Row order matches first-seen order
/// during assembly. Key `"0"` is always present and holds the row's
/// dotted-decimal index suffix (`"0"` itself for scalar-shaped entries
/// with no trailing index), so a caller can recover the index even for
/// tables that don't expose it as an ordinary column.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub rows: Vec<HashMap<String, Value>>,
}

/// Groups `varbinds` (already known to all lie under `base`, as produced
/// by a walk rooted there) into a `Table`. The arc immediately after
/// `base` is the column; everything after that is the row index.
pub fn assemble(base: &ObjectIdentifier, varbinds: Vec<VarBind>) -> Result<Table> {
    let mut order: Vec<String> = Vec::new();
    let mut by_index: HashMap<String, HashMap<String, Value>> = HashMap::new();

    for vb in varbinds {
        if !base.contains(&vb.oid) {
            return Err(SnmpClientError::FaultySnmpImplementation(format!(
                "table row {} returned by the walk is not under base {base}",
                vb.oid
            )));
        }
        let suffix = &vb.oid.arcs()[base.len()..];
        let (column, index) = suffix
            .split_first()
            .ok_or_else(|| SnmpClientError::FaultySnmpImplementation(format!("table row {} has no column arc", vb.oid)))?;
        let row_index = if index.is_empty() {
            "0".to_string()
        } else {
            index.iter().map(u32::to_string).collect::<Vec<_>>().join(".")
        };

        let row = by_index.entry(row_index.clone()).or_insert_with(|| {
            order.push(row_index.clone());
            let mut row = HashMap::new();
            row.insert("0".to_string(), Value::OctetString(row_index.clone().into_bytes()));
            row
        });
        row.insert(column.to_string(), vb.value);
    }

    let rows = order.into_iter().map(|idx| by_index.remove(&idx).expect("index was just pushed")).collect();
    Ok(Table { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> ObjectIdentifier {
        ObjectIdentifier::from_str_dotted(s).unwrap()
    }

    #[test]
    fn groups_rows_by_index_suffix_and_column_by_arc() {
        let base = oid("1.3.6.1.2.1.2.2.1");
        let varbinds = vec![
            VarBind::new(oid("1.3.6.1.2.1.2.2.1.1.1"), Value::Integer(1)),
            VarBind::new(oid("1.3.6.1.2.1.2.2.1.2.1"), Value::OctetString(b"eth0".to_vec())),
            VarBind::new(oid("1.3.6.1.2.1.2.2.1.1.2"), Value::Integer(2)),
        ];

        let table = assemble(&base, varbinds).unwrap();
        assert_eq!(table.rows.len(), 2);
        let row1 = table.rows.iter().find(|r| r["0"] == Value::OctetString(b"1".to_vec())).unwrap();
        assert_eq!(row1["1"], Value::Integer(1));
        assert_eq!(row1["2"], Value::OctetString(b"eth0".to_vec()));
        let row2 = table.rows.iter().find(|r| r["0"] == Value::OctetString(b"2".to_vec())).unwrap();
        assert_eq!(row2["1"], Value::Integer(2));
    }

    #[test]
    fn rejects_row_outside_base() {
        let base = oid("1.3.6.1.2.1.2.2.1");
        let varbinds = vec![VarBind::new(oid("1.3.6.1.2.1.99.1.1"), Value::Integer(1))];
        let err = assemble(&base, varbinds).unwrap_err();
        assert!(matches!(err, SnmpClientError::FaultySnmpImplementation(_)));
    }
}
