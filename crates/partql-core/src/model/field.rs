use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// FieldKind
///
/// Declared type of one entity property.
/// Scalars are directly comparable; collections support membership checks;
/// `Embedded` names another entity whose fields are flattened into the
/// owning table.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum FieldKind {
    // Scalar primitives
    Bool,
    Int,
    Float,
    Text,
    Blob,
    Timestamp,

    // Collections
    List(Box<Self>),
    Set(Box<Self>),
    Map { key: Box<Self>, value: Box<Self> },

    /// Nested entity, referenced by entity name.
    Embedded(String),
}

impl FieldKind {
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Int | Self::Float | Self::Text | Self::Blob | Self::Timestamp
        )
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }

    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Text | Self::Timestamp)
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map { .. })
    }

    #[must_use]
    pub fn embedded_entity(&self) -> Option<&str> {
        match self {
            Self::Embedded(entity) => Some(entity.as_str()),
            _ => None,
        }
    }

    /// Element type probed by membership operators.
    /// Maps expose their value type, matching store `CONTAINS` semantics.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::List(inner) | Self::Set(inner) => Some(inner),
            Self::Map { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Return true when `value` may be bound to a property of this kind.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_) | Value::Int(_))
            | (Self::Text, Value::Text(_))
            | (Self::Blob, Value::Blob(_))
            | (Self::Timestamp, Value::Timestamp(_) | Value::Int(_)) => true,
            (Self::List(inner) | Self::Set(inner), Value::List(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Text => f.write_str("text"),
            Self::Blob => f.write_str("blob"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::List(inner) => write!(f, "list<{inner}>"),
            Self::Set(inner) => write!(f, "set<{inner}>"),
            Self::Map { key, value } => write!(f, "map<{key}, {value}>"),
            Self::Embedded(entity) => write!(f, "embedded:{entity}"),
        }
    }
}

///
/// FieldKindParseError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("invalid field kind '{input}': {reason}")]
pub struct FieldKindParseError {
    pub input: String,
    pub reason: &'static str,
}

// Accepts the same spelling `Display` produces: `text`, `list<int>`,
// `map<text, int>`, `embedded:Address`.
impl FromStr for FieldKind {
    type Err = FieldKindParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = |reason| FieldKindParseError {
            input: input.to_string(),
            reason,
        };
        let trimmed = input.trim();

        if let Some(entity) = trimmed.strip_prefix("embedded:") {
            let entity = entity.trim();
            if entity.is_empty() {
                return Err(err("embedded kind requires an entity name"));
            }
            return Ok(Self::Embedded(entity.to_string()));
        }

        if let Some((outer, rest)) = trimmed.split_once('<') {
            let inner = rest
                .strip_suffix('>')
                .ok_or_else(|| err("unterminated type parameter list"))?;

            return match outer.trim() {
                "list" => Ok(Self::List(Box::new(inner.parse()?))),
                "set" => Ok(Self::Set(Box::new(inner.parse()?))),
                "map" => {
                    let (key, value) = split_top_level_comma(inner)
                        .ok_or_else(|| err("map kind requires key and value types"))?;
                    Ok(Self::Map {
                        key: Box::new(key.parse()?),
                        value: Box::new(value.parse()?),
                    })
                }
                _ => Err(err("unknown collection kind")),
            };
        }

        match trimmed {
            "bool" | "boolean" => Ok(Self::Bool),
            "int" | "bigint" => Ok(Self::Int),
            "float" | "double" => Ok(Self::Float),
            "text" | "string" => Ok(Self::Text),
            "blob" => Ok(Self::Blob),
            "timestamp" => Ok(Self::Timestamp),
            _ => Err(err("unknown scalar kind")),
        }
    }
}

// Split `a, b` on the first comma that is not nested inside `<...>`.
fn split_top_level_comma(input: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, ch) in input.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some((&input[..i], &input[i + 1..])),
            _ => {}
        }
    }

    None
}

impl Serialize for FieldKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

///
/// ClusteringOrder
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringOrder {
    #[default]
    Asc,
    Desc,
}

///
/// KeyRole
///
/// Role of a field in the table's primary key.
/// Ordinals are zero-based and unique per role within one entity.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum KeyRole {
    #[default]
    None,
    Partition {
        ordinal: u8,
    },
    Clustering {
        ordinal: u8,
        order: ClusteringOrder,
    },
}

impl KeyRole {
    #[must_use]
    pub const fn is_partition(self) -> bool {
        matches!(self, Self::Partition { .. })
    }
}

///
/// FieldModel
/// Runtime field metadata used by parsing, binding and mapping.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldModel {
    /// Logical property name as used in operation signatures.
    pub name: String,
    /// Declared type.
    pub kind: FieldKind,
    /// Explicit physical column; derived from the naming strategy when absent.
    pub column: Option<String>,
    /// Primary-key role.
    pub key: KeyRole,
    /// Column prefix for embedded fields; defaults to `<column>_`.
    pub prefix: Option<String>,
}

impl FieldModel {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            column: None,
            key: KeyRole::None,
            prefix: None,
        }
    }

    #[must_use]
    pub fn embedded(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Embedded(entity.into()))
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub const fn partition_key(mut self, ordinal: u8) -> Self {
        self.key = KeyRole::Partition { ordinal };
        self
    }

    #[must_use]
    pub const fn clustering_key(mut self, ordinal: u8, order: ClusteringOrder) -> Self {
        self.key = KeyRole::Clustering { ordinal, order };
        self
    }
}
