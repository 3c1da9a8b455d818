use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of logical column types.
///
/// Every type maps to a native SQL type per dialect and carries a canonical
/// null-replacement default applied to nullable columns at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Json,
}

/// Errors from parsing a logical type name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypeError {
    /// The type name is not in the supported set.
    Unknown { name: String },
    /// The type name was supported once; the message names the replacement.
    Deprecated {
        name: String,
        use_instead: &'static str,
    },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { name } => {
                write!(
                    f,
                    "unknown column type '{name}': supported types are string, integer, decimal, boolean, datetime, json"
                )
            }
            Self::Deprecated { name, use_instead } => {
                write!(
                    f,
                    "column type '{name}' is deprecated: use '{use_instead}' instead"
                )
            }
        }
    }
}

impl std::error::Error for TypeError {}

impl ColumnType {
    /// All supported types, in declaration order.
    pub const ALL: &'static [ColumnType] = &[
        ColumnType::String,
        ColumnType::Integer,
        ColumnType::Decimal,
        ColumnType::Boolean,
        ColumnType::DateTime,
        ColumnType::Json,
    ];

    /// The lowercase wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Json => "json",
        }
    }

    /// The canonical null-replacement default for nullable columns of this
    /// type. `None` means the column defaults to SQL NULL (datetime only).
    pub fn null_replacement(&self) -> Option<&'static str> {
        match self {
            Self::String => Some(""),
            Self::Integer => Some("0"),
            Self::Decimal => Some("0.00"),
            Self::Boolean => Some("0"),
            Self::DateTime => None,
            Self::Json => Some("{}"),
        }
    }

    /// Returns true for types stored in text-like SQL columns.
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::String | Self::Json)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "decimal" => Ok(Self::Decimal),
            "boolean" => Ok(Self::Boolean),
            "datetime" => Ok(Self::DateTime),
            "json" => Ok(Self::Json),
            "text" => Err(TypeError::Deprecated {
                name: s.to_string(),
                use_instead: "string",
            }),
            "float" => Err(TypeError::Deprecated {
                name: s.to_string(),
                use_instead: "decimal",
            }),
            other => Err(TypeError::Unknown {
                name: other.to_string(),
            }),
        }
    }
}
