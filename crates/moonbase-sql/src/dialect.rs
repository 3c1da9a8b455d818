use std::fmt;
use std::str::FromStr;

use moonbase_core::types::ColumnType;
use serde::{Deserialize, Serialize};

/// The SQL flavor of the underlying store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// The lowercase wire name of this dialect.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Quotes an identifier with this dialect's quoting characters.
    ///
    /// Callers must only pass identifiers drawn from a validated schema (or
    /// the literal system names); the identifier grammar excludes the quote
    /// characters themselves.
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            Self::Postgres | Self::Sqlite => format!("\"{identifier}\""),
            Self::MySql => format!("`{identifier}`"),
        }
    }

    /// The 1-based bind placeholder for this dialect.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::MySql | Self::Sqlite => "?".to_string(),
        }
    }

    /// Placeholder for a value of a known column type.
    ///
    /// Postgres compares bound text against NUMERIC/TIMESTAMPTZ columns only
    /// through an explicit cast; the other dialects coerce on their own.
    pub fn typed_placeholder(&self, n: usize, column_type: ColumnType) -> String {
        let plain = self.placeholder(n);
        match (self, column_type) {
            (Self::Postgres, ColumnType::Decimal) => format!("CAST({plain} AS NUMERIC)"),
            (Self::Postgres, ColumnType::DateTime) => format!("CAST({plain} AS TIMESTAMPTZ)"),
            _ => plain,
        }
    }

    /// The native SQL type a logical column type maps to.
    pub fn sql_type(&self, column_type: ColumnType) -> &'static str {
        match (self, column_type) {
            (Self::Postgres, ColumnType::String) => "TEXT",
            (Self::Postgres, ColumnType::Integer) => "BIGINT",
            (Self::Postgres, ColumnType::Decimal) => "NUMERIC",
            (Self::Postgres, ColumnType::Boolean) => "BOOLEAN",
            (Self::Postgres, ColumnType::DateTime) => "TIMESTAMPTZ",
            (Self::Postgres, ColumnType::Json) => "TEXT",

            // MySQL unique indexes need a bounded key, so strings are
            // VARCHAR rather than TEXT.
            (Self::MySql, ColumnType::String) => "VARCHAR(255)",
            (Self::MySql, ColumnType::Integer) => "BIGINT",
            (Self::MySql, ColumnType::Decimal) => "DECIMAL(20,8)",
            (Self::MySql, ColumnType::Boolean) => "TINYINT(1)",
            (Self::MySql, ColumnType::DateTime) => "DATETIME",
            (Self::MySql, ColumnType::Json) => "LONGTEXT",

            (Self::Sqlite, ColumnType::String) => "TEXT",
            (Self::Sqlite, ColumnType::Integer) => "INTEGER",
            (Self::Sqlite, ColumnType::Decimal) => "NUMERIC",
            (Self::Sqlite, ColumnType::Boolean) => "INTEGER",
            (Self::Sqlite, ColumnType::DateTime) => "TEXT",
            (Self::Sqlite, ColumnType::Json) => "TEXT",
        }
    }

    /// The surrogate primary key declaration, quoted.
    pub fn pkid_definition(&self) -> String {
        match self {
            Self::Postgres => format!("{} SERIAL PRIMARY KEY", self.quote("pkid")),
            Self::MySql => format!("{} INT AUTO_INCREMENT PRIMARY KEY", self.quote("pkid")),
            Self::Sqlite => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.quote("pkid")),
        }
    }

    /// The external ULID column declaration, quoted.
    pub fn id_definition(&self) -> String {
        format!("{} CHAR(26) NOT NULL UNIQUE", self.quote("id"))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unrecognized dialect names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDialect {
    pub name: String,
}

impl fmt::Display for UnknownDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown dialect '{}': expected postgres, mysql, or sqlite",
            self.name
        )
    }
}

impl std::error::Error for UnknownDialect {}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(UnknownDialect {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_per_dialect() {
        assert_eq!(Dialect::Postgres.quote("email"), "\"email\"");
        assert_eq!(Dialect::Sqlite.quote("email"), "\"email\"");
        assert_eq!(Dialect::MySql.quote("email"), "`email`");
    }

    #[test]
    fn placeholders_per_dialect() {
        assert_eq!(Dialect::Postgres.placeholder(1), "$1");
        assert_eq!(Dialect::Postgres.placeholder(12), "$12");
        assert_eq!(Dialect::MySql.placeholder(3), "?");
        assert_eq!(Dialect::Sqlite.placeholder(3), "?");
    }

    #[test]
    fn postgres_casts_decimal_and_datetime() {
        assert_eq!(
            Dialect::Postgres.typed_placeholder(2, ColumnType::Decimal),
            "CAST($2 AS NUMERIC)"
        );
        assert_eq!(
            Dialect::Postgres.typed_placeholder(1, ColumnType::DateTime),
            "CAST($1 AS TIMESTAMPTZ)"
        );
        assert_eq!(
            Dialect::Postgres.typed_placeholder(1, ColumnType::String),
            "$1"
        );
        assert_eq!(
            Dialect::MySql.typed_placeholder(1, ColumnType::Decimal),
            "?"
        );
    }

    #[test]
    fn pkid_definitions_differ() {
        assert_eq!(
            Dialect::Postgres.pkid_definition(),
            "\"pkid\" SERIAL PRIMARY KEY"
        );
        assert_eq!(
            Dialect::MySql.pkid_definition(),
            "`pkid` INT AUTO_INCREMENT PRIMARY KEY"
        );
        assert_eq!(
            Dialect::Sqlite.pkid_definition(),
            "\"pkid\" INTEGER PRIMARY KEY AUTOINCREMENT"
        );
    }

    #[test]
    fn id_definition_is_char26_unique() {
        assert_eq!(
            Dialect::Postgres.id_definition(),
            "\"id\" CHAR(26) NOT NULL UNIQUE"
        );
        assert_eq!(Dialect::MySql.id_definition(), "`id` CHAR(26) NOT NULL UNIQUE");
    }

    #[test]
    fn parse_dialect_names() {
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn type_mapping_covers_every_type() {
        for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite] {
            for ty in ColumnType::ALL {
                assert!(!dialect.sql_type(*ty).is_empty());
            }
        }
    }
}
