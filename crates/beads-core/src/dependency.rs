//! Dependency edges between issues.
//!
//! An edge is stored twice, once on each endpoint: `A.dependencies` holds
//! `(B, T)` and, symmetrically, `B.dependents` holds `(A, T)` (I3). The store
//! is the sole authority responsible for keeping both sides in sync; this
//! type itself carries no invariant enforcement.

use serde::{Deserialize, Serialize};

use crate::enums::DependencyType;

/// One endpoint of a dependency relationship, as stored on the *other*
/// endpoint's `dependencies`/`dependents` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The other issue's ID.
    pub id: String,
    /// The relationship this edge expresses, from the owning issue's
    /// perspective.
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
}

impl DependencyEdge {
    pub fn new(id: impl Into<String>, dep_type: DependencyType) -> Self {
        Self {
            id: id.into(),
            dep_type,
        }
    }

    pub fn blocks(id: impl Into<String>) -> Self {
        Self::new(id, DependencyType::Blocks)
    }

    pub fn parent_child(id: impl Into<String>) -> Self {
        Self::new(id, DependencyType::ParentChild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_type_as_type_field() {
        let edge = DependencyEdge::blocks("bd-1");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "blocks");
        assert_eq!(json["id"], "bd-1");
    }

    #[test]
    fn roundtrip() {
        let edge = DependencyEdge::parent_child("bd-2");
        let json = serde_json::to_string(&edge).unwrap();
        let back: DependencyEdge = serde_json::from_str(&json).unwrap();
        assert_eq!(back, edge);
    }
}
