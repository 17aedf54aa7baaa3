//! Resolved entity model: catalog validated and flattened for runtime use.
//! Every table and column name the SQL builder emits comes from here.

use crate::config::{ColumnKind, ValidationRule};
use regex::Regex;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub validation: ValidationRule,
    /// Compiled `validation.pattern`.
    pub pattern: Option<Regex>,
    pub description: Option<String>,
}

impl ColumnInfo {
    pub fn required(&self) -> bool {
        self.validation.required == Some(true)
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub table_name: String,
    pub path_segment: String,
    pub pk_column: String,
    /// Writable columns in catalog order (primary key excluded).
    pub columns: Vec<ColumnInfo>,
    pub operations: Vec<String>,
    /// Column names to strip from all API responses (sensitive data).
    pub sensitive_columns: HashSet<String>,
    pub description: Option<String>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn allows(&self, operation: &str) -> bool {
        self.operations.iter().any(|o| o == operation)
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub entities: Vec<ResolvedEntity>,
    pub entity_by_path: HashMap<String, ResolvedEntity>,
}

impl ResolvedModel {
    pub fn entity_by_path(&self, path: &str) -> Option<&ResolvedEntity> {
        self.entity_by_path.get(path)
    }

    pub fn entity_by_table(&self, table: &str) -> Option<&ResolvedEntity> {
        self.entities.iter().find(|e| e.table_name == table)
    }
}
