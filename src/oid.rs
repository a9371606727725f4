// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Object Identifier: an ordered, immutable sequence of non-negative
//! integers naming a managed value in the MIB tree.

use std::fmt;

/// An ordered sequence of arcs. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentifier(Vec<u32>);

impl ObjectIdentifier {
    pub fn new(arcs: Vec<u32>) -> Self {
        Self(arcs)
    }

    pub fn from_str_dotted(s: &str) -> Result<Self, std::num::ParseIntError> {
        let arcs = s
            .trim_start_matches('.')
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(Self(arcs))
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `self` prefix-contains `other` iff `self` is a strict prefix of
    /// `other` (`self != other`).
    pub fn contains(&self, other: &ObjectIdentifier) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn child(&self, arc: u32) -> Self {
        let mut arcs = self.0.clone();
        arcs.push(arc);
        Self(arcs)
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl From<&[u32]> for ObjectIdentifier {
    fn from(arcs: &[u32]) -> Self {
        Self(arcs.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_string() {
        let oid = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    }

    #[test]
    fn prefix_containment_is_strict() {
        let root = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.1").unwrap();
        let child = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.1.1.0").unwrap();
        assert!(root.contains(&child));
        assert!(!child.contains(&root));
        assert!(!root.contains(&root));
    }

    #[test]
    fn lexicographic_order_matches_arc_order() {
        let a = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.1.1.0").unwrap();
        let b = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.1.2.0").unwrap();
        assert!(a < b);
    }

    #[test]
    fn not_contains_unrelated_branch() {
        let root = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.1").unwrap();
        let other = ObjectIdentifier::from_str_dotted("1.3.6.1.2.1.2.0").unwrap();
        assert!(!root.contains(&other));
    }
}
