//! Load the catalog (embedded default or a JSON file) and resolve it into the runtime model.

use crate::config::resolved::{ColumnInfo, ResolvedEntity, ResolvedModel};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Catalog compiled into the binary; used when no `CATALOG_PATH` is configured.
pub const DEFAULT_CATALOG: &str = include_str!("../../catalog/videogames.json");

pub fn parse_catalog(json: &str) -> Result<CatalogConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub fn default_catalog() -> Result<CatalogConfig, ConfigError> {
    parse_catalog(DEFAULT_CATALOG)
}

pub async fn load_catalog_from_path(path: &Path) -> Result<CatalogConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_catalog(&raw)
}

/// Build resolved model from the catalog. Validates first.
pub fn resolve(config: &CatalogConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let mut entities = Vec::with_capacity(config.resources.len());
    let mut entity_by_path = HashMap::new();

    for resource in &config.resources {
        let mut columns = Vec::with_capacity(resource.columns.len());
        for c in &resource.columns {
            let pattern = c
                .validation
                .pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
            columns.push(ColumnInfo {
                name: c.name.clone(),
                kind: c.kind,
                nullable: c.nullable,
                validation: c.validation.clone(),
                pattern,
                description: c.description.clone(),
            });
        }

        let sensitive_columns: HashSet<String> = resource.sensitive_columns.iter().cloned().collect();
        let entity = ResolvedEntity {
            table_name: resource.table.clone(),
            path_segment: resource.path_segment.clone(),
            pk_column: resource.primary_key.clone(),
            columns,
            operations: resource.operations.clone(),
            sensitive_columns,
            description: resource.description.clone(),
        };
        entity_by_path.insert(resource.path_segment.clone(), entity.clone());
        entities.push(entity);
    }

    Ok(ResolvedModel {
        title: config.title.clone(),
        version: config.version.clone(),
        description: config.description.clone(),
        entities,
        entity_by_path,
    })
}
