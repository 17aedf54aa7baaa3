//! Raw catalog types matching the JSON catalog format (see catalog/videogames.json).

use serde::{Deserialize, Serialize};

/// Storage kind of a column. Drives request type checks, bind casts and result shaping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Integer,
    Numeric,
    Boolean,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Boolean => "boolean",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub minimum: Option<f64>,
    /// Value must be strictly greater than this.
    #[serde(default)]
    pub exclusive_minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub validation: ValidationRule,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub table: String,
    pub path_segment: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default = "default_operations")]
    pub operations: Vec<String>,
    /// Writable columns. The primary key is implicit and must not be listed.
    pub columns: Vec<ColumnConfig>,
    /// Column names that must never be exposed in API responses (e.g. password hashes).
    #[serde(default)]
    pub sensitive_columns: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub const OPERATIONS: &[&str] = &["create", "read", "update", "delete"];

fn default_primary_key() -> String {
    "id".into()
}

fn default_operations() -> Vec<String> {
    OPERATIONS.iter().map(|s| s.to_string()).collect()
}

fn default_title() -> String {
    "Video games platform API".into()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

/// The whole catalog: every resource the API may touch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub resources: Vec<ResourceConfig>,
}
