//! Tool dispatcher — resolve, validate, bind, execute, shape.
//!
//! One query execution per invocation. No retries: a timed-out or failed call
//! is reported immediately so the data source's own admission control stays
//! visible. No caching and no shared mutable state beyond the adapter's pool,
//! so concurrent invocations are independent.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::db::{BindValue, QueryExecutor, RowMap};
use crate::tools::catalog::{ParamType, ToolCatalog, ToolDefinition};
use crate::types::{Error, Result};

/// One tool invocation as received from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Invocation outcome: an ordered sequence of shaped rows, or a classified
/// failure. Exactly one of the two by construction.
pub type ToolCallResult = Result<Vec<RowMap>>;

/// Dispatches validated tool calls to the data source adapter.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<ToolCatalog>,
    executor: Arc<dyn QueryExecutor>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tools", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(catalog: Arc<ToolCatalog>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { catalog, executor }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Invoke one tool call.
    ///
    /// Validation failures are returned before any connection is touched;
    /// unknown names and bad arguments never reach query execution.
    pub async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResult {
        let def = self
            .catalog
            .lookup(&request.name)
            .ok_or_else(|| Error::unknown_tool(&request.name))?;

        let mut args = normalize_arguments(&request.arguments)?;
        validate_arguments(def, &args)?;
        self.catalog.fill_defaults(&def.name, &mut args)?;

        let params = bind_parameters(def, &args)?;

        tracing::debug!(tool = %def.name, params = params.len(), "executing tool query");
        let rows = self
            .executor
            .execute(&def.template, &params, &def.columns)
            .await?;

        Ok(shape_rows(def, rows))
    }
}

/// Missing arguments object means "no arguments"; anything non-object is a
/// caller error.
fn normalize_arguments(arguments: &Value) -> Result<Value> {
    match arguments {
        Value::Null => Ok(Value::Object(serde_json::Map::new())),
        Value::Object(_) => Ok(arguments.clone()),
        other => Err(Error::invalid_argument(format!(
            "arguments must be a JSON object, got {}",
            match other {
                Value::Array(_) => "array",
                Value::String(_) => "string",
                Value::Number(_) => "number",
                Value::Bool(_) => "boolean",
                _ => "null",
            }
        ))),
    }
}

/// Enforce the parameter contract: every required argument present, every
/// supplied argument known and well-typed.
fn validate_arguments(def: &ToolDefinition, args: &Value) -> Result<()> {
    let map = args
        .as_object()
        .ok_or_else(|| Error::invalid_argument("arguments must be a JSON object"))?;

    for param in &def.parameters {
        match map.get(&param.name) {
            None if param.is_required() => {
                return Err(Error::missing_argument(param.name.clone()));
            }
            Some(value) => {
                param.param_type.validate(value).map_err(|e| {
                    Error::invalid_argument(format!("argument '{}': {e}", param.name))
                })?;
            }
            None => {}
        }
    }

    for key in map.keys() {
        if !def.parameters.iter().any(|p| &p.name == key) {
            return Err(Error::invalid_argument(format!("unknown argument: {key}")));
        }
    }

    Ok(())
}

/// Convert validated arguments into bind values in declared parameter order
/// (the n-th parameter feeds the `$n` placeholder).
fn bind_parameters(def: &ToolDefinition, args: &Value) -> Result<Vec<BindValue>> {
    let map = args
        .as_object()
        .ok_or_else(|| Error::invalid_argument("arguments must be a JSON object"))?;

    let mut params = Vec::with_capacity(def.parameters.len());
    for param in &def.parameters {
        // Defaults were filled, so every parameter has a value here.
        let value = map
            .get(&param.name)
            .ok_or_else(|| Error::missing_argument(param.name.clone()))?;

        let bound = match param.param_type {
            ParamType::Int => value.as_i64().map(BindValue::Int),
            ParamType::Float => value.as_f64().map(BindValue::Float),
            ParamType::Text => value.as_str().map(|s| BindValue::Text(s.to_string())),
            ParamType::Bool => value.as_bool().map(BindValue::Bool),
        };
        let bound = bound.ok_or_else(|| {
            Error::invalid_argument(format!("argument '{}' has the wrong type", param.name))
        })?;
        params.push(bound);
    }
    Ok(params)
}

/// Shape adapter rows into the declared result shape: declared columns only,
/// declared order, missing values as null.
fn shape_rows(def: &ToolDefinition, rows: Vec<RowMap>) -> Vec<RowMap> {
    rows.into_iter()
        .map(|row| {
            let mut shaped = RowMap::new();
            for col in &def.columns {
                shaped.insert(
                    col.name.clone(),
                    row.get(&col.name).cloned().unwrap_or(Value::Null),
                );
            }
            shaped
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
