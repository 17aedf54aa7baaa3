//! Catalog validation: identifiers, primary keys, and API consistency.

use crate::config::{CatalogConfig, ResourceConfig, OPERATIONS};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

/// Plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes (PostgreSQL NAMEDATALEN - 1).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(s: &str) -> Result<(), ConfigError> {
    if is_identifier(s) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(s.to_string()))
    }
}

pub fn validate(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.resources.is_empty() {
        return Err(ConfigError::Validation("catalog must declare at least one resource".into()));
    }

    let mut path_segments = HashSet::new();
    let mut tables = HashSet::new();
    for resource in &config.resources {
        if !path_segments.insert(resource.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(resource.path_segment.clone()));
        }
        if !tables.insert(resource.table.as_str()) {
            return Err(ConfigError::Validation(format!(
                "table {} is exposed more than once",
                resource.table
            )));
        }
        validate_resource(resource)?;
    }
    Ok(())
}

fn validate_resource(resource: &ResourceConfig) -> Result<(), ConfigError> {
    check_identifier(&resource.table)?;
    check_identifier(&resource.primary_key)?;
    if resource.path_segment.is_empty()
        || !resource
            .path_segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "invalid path segment: '{}'",
            resource.path_segment
        )));
    }
    if resource.columns.is_empty() {
        return Err(ConfigError::Validation(format!(
            "resource {} has no columns",
            resource.table
        )));
    }

    let mut names = HashSet::new();
    for c in &resource.columns {
        check_identifier(&c.name)?;
        if c.name == resource.primary_key {
            return Err(ConfigError::InvalidPrimaryKey {
                resource: resource.table.clone(),
                column: c.name.clone(),
            });
        }
        if !names.insert(c.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate column {}.{}",
                resource.table, c.name
            )));
        }
        if let Some(pattern) = &c.validation.pattern {
            Regex::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("invalid pattern for {}.{}: {}", resource.table, c.name, e))
            })?;
        }
    }

    for s in &resource.sensitive_columns {
        if !names.contains(s.as_str()) {
            return Err(ConfigError::MissingReference {
                kind: "sensitive column",
                id: format!("{}.{}", resource.table, s),
            });
        }
    }

    for op in &resource.operations {
        if !OPERATIONS.contains(&op.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown operation '{}' on {}",
                op, resource.table
            )));
        }
    }

    Ok(())
}
