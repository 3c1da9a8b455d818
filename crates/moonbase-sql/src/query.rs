//! The query compiler: a typed query IR compiled to parameterized SQL.
//!
//! Pure functions, no I/O. Identifiers only ever come from the registered
//! schema (or the literal `id`) and are always emitted inside the dialect's
//! quoting characters; every value is bound.

use std::fmt;

use moonbase_core::limits::{DEFAULT_PAGE_SIZE, MAX_PAGINATION_LIMIT, MIN_PAGE_SIZE};
use moonbase_core::types::{Collection, ColumnName, ColumnType, FieldValue, RecordId};

use crate::dialect::Dialect;
use crate::value::{escape_like, SqlParam};

// ---------------------------------------------------------------------------
// Query IR
// ---------------------------------------------------------------------------

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

/// A sortable or projectable column: the external `id` or a user column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Id,
    User(ColumnName),
}

impl ColumnRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Id => "id",
            Self::User(name) => name.as_str(),
        }
    }
}

/// Comparison operators accepted in `col[op]=value` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    In,
}

impl FilterOp {
    /// Parses the bracketed operator name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
        }
    }
}

/// One typed filter predicate. `values` holds exactly one element except for
/// `In`, where it holds the comma-separated set.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: ColumnName,
    pub column_type: ColumnType,
    pub op: FilterOp,
    pub values: Vec<FieldValue>,
}

/// A compiled list request: everything the SELECT and COUNT queries need.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub limit: u32,
    pub after: Option<RecordId>,
    pub sort: Vec<(ColumnRef, SortOrder)>,
    pub search: Option<String>,
    pub filters: Vec<Filter>,
    /// Projected columns. `None` means every user column. `id` is always
    /// selected regardless.
    pub fields: Option<Vec<ColumnName>>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            after: None,
            sort: Vec::new(),
            search: None,
            filters: Vec::new(),
            fields: None,
        }
    }
}

/// A parameterized statement: SQL text plus the bound argument vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

// ---------------------------------------------------------------------------
// Statement builder
// ---------------------------------------------------------------------------

/// Tracks placeholder numbering (`$1..` on Postgres) while text and params
/// are pushed together.
struct StatementBuilder {
    dialect: Dialect,
    sql: String,
    params: Vec<SqlParam>,
}

impl StatementBuilder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    /// Binds a parameter and appends its placeholder.
    fn bind(&mut self, param: SqlParam, column_type: Option<ColumnType>) {
        self.params.push(param);
        let n = self.params.len();
        let placeholder = match column_type {
            Some(ty) => self.dialect.typed_placeholder(n, ty),
            None => self.dialect.placeholder(n),
        };
        self.sql.push_str(&placeholder);
    }

    fn finish(self) -> SqlStatement {
        SqlStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

// ---------------------------------------------------------------------------
// SELECT / COUNT
// ---------------------------------------------------------------------------

/// Compiles the page-fetch query.
///
/// Fetches `limit + 1` rows so the caller can detect a next page; the WHERE
/// clause carries filters, search, and the keyset cursor.
pub fn select_page(dialect: Dialect, collection: &Collection, query: &ListQuery) -> SqlStatement {
    let mut b = StatementBuilder::new(dialect);
    b.push("SELECT ");
    b.push(&projection(dialect, collection, query.fields.as_deref()));
    b.push(" FROM ");
    b.push(&dialect.quote(collection.table_name()));
    push_where(&mut b, collection, query, true);
    push_order_by(&mut b, &query.sort);
    b.push(&format!(" LIMIT {}", u64::from(query.limit) + 1));
    b.finish()
}

/// Compiles the COUNT query: search and filter predicates apply, the cursor
/// does not, so `total` reflects the full matching set.
pub fn count_query(dialect: Dialect, collection: &Collection, query: &ListQuery) -> SqlStatement {
    let mut b = StatementBuilder::new(dialect);
    b.push("SELECT COUNT(*) FROM ");
    b.push(&dialect.quote(collection.table_name()));
    push_where(&mut b, collection, query, false);
    b.finish()
}

/// Compiles `SELECT ... WHERE id = ?` for a single record.
pub fn select_by_id(dialect: Dialect, collection: &Collection, id: &RecordId) -> SqlStatement {
    let mut b = StatementBuilder::new(dialect);
    b.push("SELECT ");
    b.push(&projection(dialect, collection, None));
    b.push(" FROM ");
    b.push(&dialect.quote(collection.table_name()));
    b.push(" WHERE ");
    b.push(&dialect.quote("id"));
    b.push(" = ");
    b.bind(SqlParam::Text(id.as_str().to_string()), None);
    b.finish()
}

/// Compiles an INSERT for a fresh record.
pub fn insert(
    dialect: Dialect,
    collection: &Collection,
    id: &RecordId,
    values: &[(ColumnName, FieldValue)],
) -> SqlStatement {
    let mut b = StatementBuilder::new(dialect);
    b.push("INSERT INTO ");
    b.push(&dialect.quote(collection.table_name()));
    b.push(" (");
    b.push(&dialect.quote("id"));
    for (name, _) in values {
        b.push(", ");
        b.push(&dialect.quote(name.as_str()));
    }
    b.push(") VALUES (");
    b.bind(SqlParam::Text(id.as_str().to_string()), None);
    for (name, value) in values {
        b.push(", ");
        let ty = collection.column(name.as_str()).map(|c| c.column_type);
        b.bind(SqlParam::from(value), ty);
    }
    b.push(")");
    b.finish()
}

/// Compiles `UPDATE ... SET ... WHERE id = ?`.
pub fn update_by_id(
    dialect: Dialect,
    collection: &Collection,
    id: &RecordId,
    values: &[(ColumnName, FieldValue)],
) -> SqlStatement {
    let mut b = StatementBuilder::new(dialect);
    b.push("UPDATE ");
    b.push(&dialect.quote(collection.table_name()));
    b.push(" SET ");
    for (i, (name, value)) in values.iter().enumerate() {
        if i > 0 {
            b.push(", ");
        }
        b.push(&dialect.quote(name.as_str()));
        b.push(" = ");
        let ty = collection.column(name.as_str()).map(|c| c.column_type);
        b.bind(SqlParam::from(value), ty);
    }
    b.push(" WHERE ");
    b.push(&dialect.quote("id"));
    b.push(" = ");
    b.bind(SqlParam::Text(id.as_str().to_string()), None);
    b.finish()
}

/// Compiles `DELETE FROM ... WHERE id = ?`.
pub fn delete_by_id(dialect: Dialect, collection: &Collection, id: &RecordId) -> SqlStatement {
    let mut b = StatementBuilder::new(dialect);
    b.push("DELETE FROM ");
    b.push(&dialect.quote(collection.table_name()));
    b.push(" WHERE ");
    b.push(&dialect.quote("id"));
    b.push(" = ");
    b.bind(SqlParam::Text(id.as_str().to_string()), None);
    b.finish()
}

// ---------------------------------------------------------------------------
// Clause helpers
// ---------------------------------------------------------------------------

fn projection(dialect: Dialect, collection: &Collection, fields: Option<&[ColumnName]>) -> String {
    let mut parts = vec![dialect.quote("id")];
    match fields {
        Some(fields) => {
            parts.extend(fields.iter().map(|f| dialect.quote(f.as_str())));
        }
        None => {
            parts.extend(
                collection
                    .columns
                    .iter()
                    .map(|c| dialect.quote(c.name.as_str())),
            );
        }
    }
    parts.join(", ")
}

fn push_where(
    b: &mut StatementBuilder,
    collection: &Collection,
    query: &ListQuery,
    with_cursor: bool,
) {
    let has_search = query.search.as_deref().is_some_and(|s| !s.is_empty());
    let has_cursor = with_cursor && query.after.is_some();
    if query.filters.is_empty() && !has_search && !has_cursor {
        return;
    }
    b.push(" WHERE ");
    let mut first = true;
    fn sep(b: &mut StatementBuilder, first: &mut bool) {
        if !*first {
            b.push(" AND ");
        }
        *first = false;
    }

    for filter in &query.filters {
        sep(b, &mut first);
        push_filter(b, filter);
    }

    if has_search {
        sep(b, &mut first);
        push_search(b, collection, query.search.as_deref().unwrap_or(""));
    }

    if has_cursor {
        if let Some(after) = &query.after {
            sep(b, &mut first);
            let quoted = b.dialect.quote("id");
            b.push(&quoted);
            b.push(" > ");
            b.bind(SqlParam::Text(after.as_str().to_string()), None);
        }
    }
}

fn push_filter(b: &mut StatementBuilder, filter: &Filter) {
    let quoted = b.dialect.quote(filter.column.as_str());
    b.push(&quoted);
    b.push(" ");
    b.push(filter.op.sql());
    b.push(" ");
    match filter.op {
        FilterOp::In => {
            b.push("(");
            for (i, value) in filter.values.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                b.bind(SqlParam::from(value), Some(filter.column_type));
            }
            b.push(")");
        }
        FilterOp::Like => {
            // The declared-type coercion guarantees a text value here; the
            // caller's own wildcards stay live, only the %-wrap is added.
            let raw = match filter.values.first() {
                Some(FieldValue::Text(s)) => s.clone(),
                Some(other) => other.to_json().to_string(),
                None => String::new(),
            };
            b.bind(SqlParam::Text(format!("%{raw}%")), None);
        }
        _ => {
            let value = filter.values.first().cloned().unwrap_or(FieldValue::Null);
            b.bind(SqlParam::from(&value), Some(filter.column_type));
        }
    }
}

fn push_search(b: &mut StatementBuilder, collection: &Collection, term: &str) {
    let columns = collection.string_columns();
    // An OR over zero disjuncts is false: a search against a collection
    // with no string columns matches nothing.
    if columns.is_empty() {
        b.push("1 = 0");
        return;
    }
    let pattern = format!("%{}%", escape_like(term));
    let escape_suffix = match b.dialect {
        // SQLite has no default LIKE escape character.
        Dialect::Sqlite => " ESCAPE '\\'",
        Dialect::Postgres | Dialect::MySql => "",
    };
    b.push("(");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            b.push(" OR ");
        }
        let quoted = b.dialect.quote(column.as_str());
        b.push(&quoted);
        b.push(" LIKE ");
        b.bind(SqlParam::Text(pattern.clone()), None);
        b.push(escape_suffix);
    }
    b.push(")");
}

fn push_order_by(b: &mut StatementBuilder, sort: &[(ColumnRef, SortOrder)]) {
    b.push(" ORDER BY ");
    if sort.is_empty() {
        let quoted = b.dialect.quote("id");
        b.push(&quoted);
        b.push(" ASC");
        return;
    }
    for (i, (column, order)) in sort.iter().enumerate() {
        if i > 0 {
            b.push(", ");
        }
        let quoted = b.dialect.quote(column.as_str());
        b.push(&quoted);
        b.push(" ");
        b.push(&order.to_string());
    }
}

/// Validates a raw `limit` value against the pagination bounds.
pub fn validate_limit(limit: u32) -> Result<u32, String> {
    if !(MIN_PAGE_SIZE..=MAX_PAGINATION_LIMIT).contains(&limit) {
        return Err(format!(
            "limit must be between {MIN_PAGE_SIZE} and {MAX_PAGINATION_LIMIT}, got {limit}"
        ));
    }
    Ok(limit)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
