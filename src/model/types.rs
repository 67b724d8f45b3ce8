use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::TypegraphError;

/// Storage-level kind of a scalar field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScalarKind {
    String,
    Number,
    Date,
    Buffer,
    Boolean,
    ObjectId,
    /// Any kind the model layer reports that has no canonical scalar
    Other(String),
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::String => write!(f, "string"),
            ScalarKind::Number => write!(f, "number"),
            ScalarKind::Date => write!(f, "date"),
            ScalarKind::Buffer => write!(f, "buffer"),
            ScalarKind::Boolean => write!(f, "boolean"),
            ScalarKind::ObjectId => write!(f, "objectid"),
            ScalarKind::Other(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for ScalarKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "string" => ScalarKind::String,
            "number" | "float" | "double" => ScalarKind::Number,
            "date" | "datetime" => ScalarKind::Date,
            "buffer" | "binary" => ScalarKind::Buffer,
            "boolean" | "bool" => ScalarKind::Boolean,
            "objectid" | "object_id" | "id" => ScalarKind::ObjectId,
            _ => ScalarKind::Other(s.to_string()),
        }
    }
}

impl From<String> for ScalarKind {
    fn from(s: String) -> Self {
        ScalarKind::from(s.as_str())
    }
}

impl From<ScalarKind> for String {
    fn from(kind: ScalarKind) -> Self {
        kind.to_string()
    }
}

/// Whether a reference points at one target record or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Single,
    Plural,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Single => write!(f, "single"),
            Cardinality::Plural => write!(f, "plural"),
        }
    }
}

impl FromStr for Cardinality {
    type Err = TypegraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "one" => Ok(Cardinality::Single),
            "plural" | "many" => Ok(Cardinality::Plural),
            _ => Err(TypegraphError::Parse(format!("Invalid cardinality: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scalar_kind_is_preserved() {
        assert_eq!(ScalarKind::from("Mixed"), ScalarKind::Other("Mixed".to_string()));
        assert_eq!(ScalarKind::from("ObjectId"), ScalarKind::ObjectId);
        assert_eq!(ScalarKind::from("Mixed").to_string(), "Mixed");
    }

    #[test]
    fn test_cardinality_from_str() {
        assert_eq!("many".parse::<Cardinality>().unwrap(), Cardinality::Plural);
        assert!("several".parse::<Cardinality>().is_err());
    }
}
