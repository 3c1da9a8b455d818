//! Closed name sets that collection and column identifiers must avoid.

/// Collection names that would collide with a fixed administrative path.
pub const RESERVED_ENDPOINTS: &[&str] = &["collections", "auth", "users", "apikeys", "doc", "health"];

/// Columns present in every physical table and never part of the user schema.
pub const SYSTEM_COLUMNS: &[&str] = &["pkid", "id"];

/// Prefix reserved for system tables (`moon_users`, `moon_apikeys`, ...).
pub const SYSTEM_PREFIX: &str = "moon";

/// SQL keywords that may not be used as collection or column names.
///
/// Closed set covering the common DDL/DML verbs across the supported
/// dialects. Checked case-insensitively.
pub const RESERVED_SQL_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "create", "drop", "alter", "table",
    "index", "view", "trigger", "from", "where", "join", "inner", "outer",
    "left", "right", "cross", "group", "order", "by", "having", "union",
    "distinct", "and", "or", "not", "null", "true", "false", "primary", "key",
    "foreign", "references", "unique", "constraint", "default", "check",
    "into", "values", "set", "as", "on", "in", "is", "like", "between",
    "exists", "case", "when", "then", "else", "end", "limit", "offset",
    "grant", "revoke", "transaction", "begin", "commit", "rollback", "cast",
    "column", "database", "schema", "user", "using", "with",
];

/// Returns true if `name` equals a reserved endpoint name.
pub fn is_reserved_endpoint(name: &str) -> bool {
    RESERVED_ENDPOINTS.contains(&name)
}

/// Returns true if `name` is one of the implicit system columns.
pub fn is_system_column(name: &str) -> bool {
    SYSTEM_COLUMNS.contains(&name)
}

/// Returns true if `name` matches a reserved SQL keyword (case-insensitive).
pub fn is_reserved_keyword(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RESERVED_SQL_KEYWORDS.contains(&lower.as_str())
}

/// Returns true if `name` begins with the system prefix (`moon`, `moon_`, ...).
pub fn has_system_prefix(name: &str) -> bool {
    name.to_ascii_lowercase().starts_with(SYSTEM_PREFIX)
}
