//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a resolved entity.
//! Identifiers come from the catalog only; every value goes through a `$n` placeholder.

use crate::config::{ColumnInfo, ColumnKind, ResolvedEntity};
use crate::error::AppError;
use crate::sql::params::{cast_for, PgBindValue};
use serde_json::Value;
use std::collections::HashSet;

/// Substring match on one column: rows whose `column` contains `substring` (case-sensitive).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub substring: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, substring: impl Into<String>) -> Self {
        Filter {
            column: column.into(),
            substring: substring.into(),
        }
    }
}

/// Quote identifier for PostgreSQL (safe: only from the catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }
}

/// Escape LIKE metacharacters so the substring matches literally (backslash is PostgreSQL's default escape).
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Primary key then `columns`; numeric as float8 so rows decode to JSON numbers.
fn output_columns<'a>(entity: &ResolvedEntity, columns: impl IntoIterator<Item = &'a ColumnInfo>) -> String {
    let mut cols = vec![quoted(&entity.pk_column)];
    for c in columns {
        let q = quoted(&c.name);
        if c.kind == ColumnKind::Numeric {
            cols.push(format!("{}::float8 AS {}", q, q));
        } else {
            cols.push(q);
        }
    }
    cols.join(", ")
}

fn select_column_list(entity: &ResolvedEntity) -> String {
    output_columns(entity, &entity.columns)
}

/// Check a positional write against the entity: equal lengths, known non-key columns, no repeats.
/// Returns the column descriptors in the caller's order.
pub fn check_write<'a>(
    entity: &'a ResolvedEntity,
    columns: &[String],
    data: &[Value],
) -> Result<Vec<&'a ColumnInfo>, AppError> {
    if columns.len() != data.len() {
        return Err(AppError::InvalidArgument(format!(
            "{} columns but {} values",
            columns.len(),
            data.len()
        )));
    }
    if columns.is_empty() {
        return Err(AppError::InvalidArgument("no columns to write".into()));
    }
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(columns.len());
    for name in columns {
        if *name == entity.pk_column {
            return Err(AppError::InvalidArgument(format!("{} is not writable", name)));
        }
        let col = entity.column(name).ok_or_else(|| {
            AppError::InvalidArgument(format!("unknown column {} for {}", name, entity.table_name))
        })?;
        if !seen.insert(name.as_str()) {
            return Err(AppError::InvalidArgument(format!("column {} given twice", name)));
        }
        out.push(col);
    }
    Ok(out)
}

fn placeholder(q: &mut QueryBuf, col: &ColumnInfo, v: &Value) -> Result<String, AppError> {
    let n = q.push_param(PgBindValue::for_column(col, v)?);
    Ok(format!("${}::{}", n, cast_for(col.kind)))
}

/// INSERT of `data` into `columns`, returning the generated key and the values as stored.
pub fn insert(entity: &ResolvedEntity, columns: &[String], data: &[Value]) -> Result<QueryBuf, AppError> {
    let cols = check_write(entity, columns, data)?;
    let mut q = QueryBuf::new();
    let mut names = Vec::with_capacity(cols.len());
    let mut placeholders = Vec::with_capacity(cols.len());
    for (col, v) in cols.iter().zip(data) {
        names.push(quoted(&col.name));
        placeholders.push(placeholder(&mut q, col, v)?);
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(&entity.table_name),
        names.join(", "),
        placeholders.join(", "),
        output_columns(entity, cols.iter().copied())
    );
    Ok(q)
}

/// SELECT list with an optional substring filter, ORDER BY pk, optional LIMIT.
pub fn select_list(
    entity: &ResolvedEntity,
    filter: Option<&Filter>,
    limit: Option<u32>,
) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut where_clause = String::new();
    if let Some(f) = filter {
        let col = entity.column(&f.column).ok_or_else(|| {
            AppError::InvalidArgument(format!("unknown filter column {} for {}", f.column, entity.table_name))
        })?;
        let n = q.push_param(PgBindValue::String(format!("%{}%", escape_like(&f.substring))));
        where_clause = format!(" WHERE {}::text LIKE ${}", quoted(&col.name), n);
    }
    let limit_clause = match limit {
        Some(0) => return Err(AppError::InvalidArgument("limit must be a positive integer".into())),
        Some(n) => format!(" LIMIT ${}", q.push_param(PgBindValue::I64(n as i64))),
        None => String::new(),
    };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}{}",
        select_column_list(entity),
        quoted(&entity.table_name),
        where_clause,
        quoted(&entity.pk_column),
        limit_clause
    );
    Ok(q)
}

/// SELECT by primary key.
pub fn select_by_id(entity: &ResolvedEntity, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(PgBindValue::I64(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        select_column_list(entity),
        quoted(&entity.table_name),
        quoted(&entity.pk_column),
        n
    );
    q
}

/// UPDATE by id: SET exactly the given columns. RETURNING the key and the stored values;
/// no row back means no row had the id.
pub fn update(entity: &ResolvedEntity, id: i64, columns: &[String], data: &[Value]) -> Result<QueryBuf, AppError> {
    let cols = check_write(entity, columns, data)?;
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(cols.len());
    for (col, v) in cols.iter().zip(data) {
        let ph = placeholder(&mut q, col, v)?;
        sets.push(format!("{} = {}", quoted(&col.name), ph));
    }
    let id_param = q.push_param(PgBindValue::I64(id));
    let pk = quoted(&entity.pk_column);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(&entity.table_name),
        sets.join(", "),
        pk,
        id_param,
        output_columns(entity, cols.iter().copied())
    );
    Ok(q)
}

/// DELETE by id.
pub fn delete(entity: &ResolvedEntity, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(PgBindValue::I64(id));
    let pk = quoted(&entity.pk_column);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${} RETURNING {}",
        quoted(&entity.table_name),
        pk,
        n,
        pk
    );
    q
}
