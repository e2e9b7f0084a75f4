//! Tool catalog — typed tool metadata, parameter validation, read-only
//! template enforcement.
//!
//! The catalog is populated once at startup from a static declaration and is
//! read-only afterwards. Registration rejects any query template that is not
//! a single read-only statement, so a mutating tool can never exist at
//! runtime — a bad declaration fails process startup instead.

use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// =============================================================================
// Parameter types
// =============================================================================

/// Parameter type for tool inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Text,
    Int,
    Float,
    Bool,
}

impl ParamType {
    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            ParamType::Text => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("expected string, got {}", value_type_name(value)))
                }
            }
            ParamType::Int => {
                if value.is_i64() || value.is_u64() {
                    Ok(())
                } else {
                    Err(format!("expected integer, got {}", value_type_name(value)))
                }
            }
            ParamType::Float => {
                if value.is_number() {
                    Ok(())
                } else {
                    Err(format!("expected number, got {}", value_type_name(value)))
                }
            }
            ParamType::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("expected boolean, got {}", value_type_name(value)))
                }
            }
        }
    }

    /// JSON Schema type name, used when advertising the catalog.
    pub fn json_schema_type(&self) -> &'static str {
        match self {
            ParamType::Text => "string",
            ParamType::Int => "integer",
            ParamType::Float => "number",
            ParamType::Bool => "boolean",
        }
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// A single parameter definition for a tool.
///
/// Parameter order matters: the n-th parameter binds to the `$n` placeholder
/// in the query template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

// =============================================================================
// Result shape
// =============================================================================

/// Output column type for decoding result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Int,
    Float,
    Bool,
}

/// A single declared output column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
        }
    }
}

// =============================================================================
// Tool definition
// =============================================================================

/// Complete tool definition: metadata, parameter specs, query template, and
/// declared result shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamDef>,
    /// Read-only SQL with `$n` placeholders, one per parameter, in order.
    pub template: String,
    pub columns: Vec<ColumnDef>,
}

impl ToolDefinition {
    /// JSON Schema for this tool's arguments, advertised via `tools/list`.
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type.json_schema_type(),
                    "description": param.description,
                }),
            );
            if param.is_required() {
                required.push(Value::String(param.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

// =============================================================================
// Read-only template screening
// =============================================================================

/// Statement verbs that must never appear anywhere in a template.
const MUTATING_VERBS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "truncate", "grant", "revoke",
    "merge", "copy", "vacuum", "call", "do",
];

/// Structural check: the template must be a single `SELECT`/`WITH` statement
/// containing no mutating verbs. Word-level scan, so column names like
/// `updated_at` pass while `UPDATE` does not.
fn screen_read_only(template: &str) -> std::result::Result<(), String> {
    let mut words = template
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase());

    match words.next() {
        Some(first) if first == "select" || first == "with" => {}
        Some(first) => return Err(format!("template must start with SELECT, got '{first}'")),
        None => return Err("template is empty".to_string()),
    }

    for word in words {
        if MUTATING_VERBS.contains(&word.as_str()) {
            return Err(format!("template contains mutating verb '{word}'"));
        }
    }
    Ok(())
}

/// Highest `$n` placeholder index in the template (0 if none).
fn max_placeholder(template: &str) -> usize {
    let bytes = template.as_bytes();
    let mut max = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end > start {
                if let Ok(n) = template[start..end].parse::<usize>() {
                    max = max.max(n);
                }
            }
            i = end;
        } else {
            i += 1;
        }
    }
    max
}

// =============================================================================
// Tool catalog
// =============================================================================

/// In-memory tool catalog. Immutable after startup.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    entries: HashMap<String, ToolDefinition>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a tool definition.
    ///
    /// Fails (and with it, process startup) if the name is empty or
    /// duplicated, the template is not read-only, or the placeholder count
    /// disagrees with the parameter list.
    pub fn register(&mut self, def: ToolDefinition) -> Result<()> {
        if def.name.is_empty() {
            return Err(Error::config("tool name cannot be empty"));
        }
        if self.entries.contains_key(&def.name) {
            return Err(Error::config(format!("duplicate tool name: {}", def.name)));
        }
        if let Err(reason) = screen_read_only(&def.template) {
            return Err(Error::config(format!("tool '{}': {}", def.name, reason)));
        }
        let placeholders = max_placeholder(&def.template);
        if placeholders != def.parameters.len() {
            return Err(Error::config(format!(
                "tool '{}': template has {} placeholders but {} parameters declared",
                def.name,
                placeholders,
                def.parameters.len()
            )));
        }
        self.entries.insert(def.name.clone(), def);
        Ok(())
    }

    /// Look up a tool definition by name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.entries.get(name)
    }

    /// Check if a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// List all tool definitions, ordered by name.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        let mut defs: Vec<&ToolDefinition> = self.entries.values().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Fill in default values for omitted optional arguments.
    pub fn fill_defaults(&self, name: &str, args: &mut Value) -> Result<()> {
        let def = self
            .entries
            .get(name)
            .ok_or_else(|| Error::unknown_tool(name))?;

        if let Some(map) = args.as_object_mut() {
            for param in &def.parameters {
                if !map.contains_key(&param.name) {
                    if let Some(default) = &param.default {
                        map.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(())
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_def() -> ToolDefinition {
        ToolDefinition {
            name: "get_ward_by_id".to_string(),
            description: "Fetch one ward row".to_string(),
            parameters: vec![
                ParamDef {
                    name: "ward_id".to_string(),
                    param_type: ParamType::Int,
                    description: "Ward identifier".to_string(),
                    default: None,
                },
                ParamDef {
                    name: "limit".to_string(),
                    param_type: ParamType::Int,
                    description: "Row cap".to_string(),
                    default: Some(serde_json::json!(50)),
                },
            ],
            template: "SELECT ward_id, ward_name FROM ward_directory WHERE ward_id = $1 LIMIT $2"
                .to_string(),
            columns: vec![
                ColumnDef::new("ward_id", ColumnType::Int),
                ColumnDef::new("ward_name", ColumnType::Text),
            ],
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut catalog = ToolCatalog::new();
        catalog.register(sample_def()).unwrap();

        assert!(catalog.has_tool("get_ward_by_id"));
        assert!(!catalog.has_tool("nonexistent"));
        assert_eq!(catalog.len(), 1);

        let def = catalog.lookup("get_ward_by_id").unwrap();
        assert_eq!(def.description, "Fetch one ward row");
        assert_eq!(def.columns.len(), 2);
    }

    #[test]
    fn register_empty_name_fails() {
        let mut catalog = ToolCatalog::new();
        let mut def = sample_def();
        def.name = String::new();
        assert!(catalog.register(def).is_err());
    }

    #[test]
    fn register_duplicate_fails() {
        let mut catalog = ToolCatalog::new();
        catalog.register(sample_def()).unwrap();
        assert!(catalog.register(sample_def()).is_err());
    }

    #[test]
    fn register_mutating_template_fails() {
        let mut catalog = ToolCatalog::new();
        let mut def = sample_def();
        def.template = "DELETE FROM ward_directory WHERE ward_id = $1 AND $2 = $2".to_string();
        let err = catalog.register(def).unwrap_err();
        assert!(err.to_string().contains("must start with SELECT"));
    }

    #[test]
    fn register_embedded_mutating_verb_fails() {
        let mut catalog = ToolCatalog::new();
        let mut def = sample_def();
        def.template =
            "SELECT ward_id FROM ward_directory WHERE ward_id = $1; DROP TABLE x -- $2"
                .to_string();
        let err = catalog.register(def).unwrap_err();
        assert!(err.to_string().contains("mutating verb 'drop'"));
    }

    #[test]
    fn mutating_verb_inside_identifier_is_allowed() {
        let mut catalog = ToolCatalog::new();
        let mut def = sample_def();
        def.template =
            "SELECT ward_id, updated_at FROM ward_directory WHERE ward_id = $1 LIMIT $2"
                .to_string();
        assert!(catalog.register(def).is_ok());
    }

    #[test]
    fn register_placeholder_mismatch_fails() {
        let mut catalog = ToolCatalog::new();
        let mut def = sample_def();
        def.template = "SELECT ward_id FROM ward_directory WHERE ward_id = $1".to_string();
        let err = catalog.register(def).unwrap_err();
        assert!(err.to_string().contains("placeholders"));
    }

    #[test]
    fn fill_defaults_inserts_missing() {
        let mut catalog = ToolCatalog::new();
        catalog.register(sample_def()).unwrap();

        let mut args = serde_json::json!({"ward_id": 3});
        catalog.fill_defaults("get_ward_by_id", &mut args).unwrap();
        assert_eq!(args["limit"], 50);
    }

    #[test]
    fn fill_defaults_no_overwrite() {
        let mut catalog = ToolCatalog::new();
        catalog.register(sample_def()).unwrap();

        let mut args = serde_json::json!({"ward_id": 3, "limit": 5});
        catalog.fill_defaults("get_ward_by_id", &mut args).unwrap();
        assert_eq!(args["limit"], 5);
    }

    #[test]
    fn list_is_ordered_by_name() {
        let mut catalog = ToolCatalog::new();
        let mut b = sample_def();
        b.name = "b_tool".to_string();
        let mut a = sample_def();
        a.name = "a_tool".to_string();
        catalog.register(b).unwrap();
        catalog.register(a).unwrap();

        let names: Vec<&str> = catalog.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a_tool", "b_tool"]);
    }

    #[test]
    fn input_schema_marks_required() {
        let def = sample_def();
        let schema = def.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["ward_id"]["type"], "integer");
        assert_eq!(schema["required"], serde_json::json!(["ward_id"]));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn max_placeholder_counts_highest() {
        assert_eq!(max_placeholder("SELECT 1"), 0);
        assert_eq!(max_placeholder("SELECT $1, $2"), 2);
        assert_eq!(max_placeholder("SELECT $2 WHERE x = $10"), 10);
    }
}
