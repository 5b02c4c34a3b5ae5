//! Shared identifier and value types for the graph data model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type alias for node identifiers
pub type NodeId = u64;

/// A single property value carried by an exported record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// 64-bit signed integer value
    Long(i64),
    /// 64-bit floating point value
    Double(f64),
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

/// A relationship type as declared by the graph store
///
/// Stores that were loaded without a type projection carry the
/// `AllTypes` wildcard instead of a concrete name. The wildcard never
/// reaches an exported record: it is resolved to a caller-supplied
/// default output name before any iterator is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipType {
    /// A concrete, named relationship type; passed through verbatim
    Named(String),
    /// The wildcard covering every relationship in the store
    AllTypes,
}

impl RelationshipType {
    /// Create a named relationship type
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Resolve this type to its output name, rewriting the wildcard to
    /// the given default and leaving named types unchanged
    pub fn resolve(&self, default_type: &str) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::AllTypes => default_type.to_string(),
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::AllTypes => f.write_str("*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_resolves_to_default() {
        assert_eq!(RelationshipType::AllTypes.resolve("REL"), "REL");
    }

    #[test]
    fn named_type_resolves_to_itself() {
        assert_eq!(RelationshipType::named("KNOWS").resolve("REL"), "KNOWS");
    }

    #[test]
    fn property_value_conversions() {
        assert_eq!(PropertyValue::from(42i64), PropertyValue::Long(42));
        assert_eq!(PropertyValue::from(1.5f64), PropertyValue::Double(1.5));
    }
}
