//! The fixed hospital tool catalog.
//!
//! Five read-only operations against pre-restricted views. The configured
//! database principal holds `SELECT` only on these views, so even a bug here
//! cannot reach raw patient tables. The set is closed: there is no generic
//! query passthrough and no schema discovery.

use crate::tools::catalog::{ColumnDef, ColumnType, ParamDef, ParamType, ToolCatalog, ToolDefinition};
use crate::types::Result;

fn int_param(name: &str, description: &str) -> ParamDef {
    ParamDef {
        name: name.to_string(),
        param_type: ParamType::Int,
        description: description.to_string(),
        default: None,
    }
}

fn limit_param() -> ParamDef {
    ParamDef {
        name: "limit".to_string(),
        param_type: ParamType::Int,
        description: "Maximum rows to return".to_string(),
        default: Some(serde_json::json!(50)),
    }
}

/// Declare the five bridge tools.
fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_doctor_by_id".to_string(),
            description: "Look up a single doctor by identifier".to_string(),
            parameters: vec![int_param("doctor_id", "Doctor identifier")],
            template: "SELECT doctor_id, department_id, specialization \
                       FROM doctor_directory WHERE doctor_id = $1"
                .to_string(),
            columns: vec![
                ColumnDef::new("doctor_id", ColumnType::Int),
                ColumnDef::new("department_id", ColumnType::Int),
                ColumnDef::new("specialization", ColumnType::Text),
            ],
        },
        ToolDefinition {
            name: "list_doctors_by_department".to_string(),
            description: "List doctors assigned to a department".to_string(),
            parameters: vec![
                int_param("department_id", "Department identifier"),
                limit_param(),
            ],
            template: "SELECT doctor_id, department_id, specialization \
                       FROM doctor_directory WHERE department_id = $1 \
                       ORDER BY doctor_id LIMIT $2"
                .to_string(),
            columns: vec![
                ColumnDef::new("doctor_id", ColumnType::Int),
                ColumnDef::new("department_id", ColumnType::Int),
                ColumnDef::new("specialization", ColumnType::Text),
            ],
        },
        ToolDefinition {
            name: "list_patients_by_doctor".to_string(),
            description: "List patients with appointments under a doctor".to_string(),
            parameters: vec![int_param("doctor_id", "Doctor identifier"), limit_param()],
            template: "SELECT DISTINCT p.patient_id, p.full_name \
                       FROM patient_roster p \
                       JOIN appointment_log a ON a.patient_id = p.patient_id \
                       WHERE a.doctor_id = $1 \
                       ORDER BY p.patient_id LIMIT $2"
                .to_string(),
            columns: vec![
                ColumnDef::new("patient_id", ColumnType::Int),
                ColumnDef::new("full_name", ColumnType::Text),
            ],
        },
        ToolDefinition {
            name: "check_appointment_status".to_string(),
            description: "Check the status of an appointment".to_string(),
            parameters: vec![int_param("appointment_id", "Appointment identifier")],
            template: "SELECT appointment_id, status, appointment_date::text AS appointment_date \
                       FROM appointment_log WHERE appointment_id = $1"
                .to_string(),
            columns: vec![
                ColumnDef::new("appointment_id", ColumnType::Int),
                ColumnDef::new("status", ColumnType::Text),
                ColumnDef::new("appointment_date", ColumnType::Text),
            ],
        },
        ToolDefinition {
            name: "total_billing_for_patient".to_string(),
            description: "Total billed amount for a patient".to_string(),
            parameters: vec![int_param("patient_id", "Patient identifier")],
            template: "SELECT COALESCE(SUM(amount), 0)::float8 AS total_amount \
                       FROM billing_ledger WHERE patient_id = $1"
                .to_string(),
            columns: vec![ColumnDef::new("total_amount", ColumnType::Float)],
        },
    ]
}

/// Build the process-wide catalog. Any declaration that fails the registry's
/// structural checks aborts startup.
pub fn build_catalog() -> Result<ToolCatalog> {
    let mut catalog = ToolCatalog::new();
    for def in definitions() {
        catalog.register(def)?;
    }
    Ok(catalog)
}
