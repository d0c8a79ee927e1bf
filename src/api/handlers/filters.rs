use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::capture::manager::MonitorManager;
use crate::filter::rule::{FieldLocation, RuleDraft, RuleError};
use crate::filter::set::CommittedSet;
use crate::filter::validator::FieldKind;
use crate::models::packet::{Field, Protocol};
use crate::utils::error::AppError;

/// Update filter request: raw input text per field
#[derive(Deserialize)]
pub struct UpdateFilterRequest {
    inputs: HashMap<Field, String>,
}

/// Response for listing filters
#[derive(Serialize)]
struct FiltersResponse {
    drafts: Vec<RuleDraft>,
    committed: Arc<CommittedSet>,
    filtering_active: bool,
    validation_errors: Vec<FieldLocation>,
}

/// One filterable field
#[derive(Serialize)]
struct SchemaField {
    field: Field,
    label: &'static str,
    #[serde(flatten)]
    kind: SchemaKind,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SchemaKind {
    Text {
        max_len: usize,
        suggestions: &'static [&'static str],
        restricted: bool,
    },
    Integer {
        radix: u32,
        min: u32,
        max: u32,
    },
}

#[derive(Serialize)]
struct SchemaResponse {
    protocol: Protocol,
    fields: Vec<SchemaField>,
}

fn error_response(e: AppError) -> HttpResponse {
    let body = serde_json::json!({
        "status": "error",
        "message": e.to_string()
    });
    match e {
        AppError::RuleNotFound(_) => HttpResponse::NotFound().json(body),
        AppError::FieldNotInSchema(_) => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Describe the filterable fields of the monitored protocol
pub async fn get_schema(monitor: web::Data<Arc<MonitorManager>>) -> impl Responder {
    let fields = monitor
        .filters()
        .schema()
        .iter()
        .map(|spec| SchemaField {
            field: spec.field,
            label: spec.label,
            kind: match spec.kind {
                FieldKind::Text {
                    max_len,
                    suggestions,
                    membership,
                } => SchemaKind::Text {
                    max_len,
                    suggestions,
                    restricted: membership.is_some(),
                },
                FieldKind::Integer {
                    radix, min, max, ..
                } => SchemaKind::Integer { radix, min, max },
            },
        })
        .collect();

    HttpResponse::Ok().json(SchemaResponse {
        protocol: monitor.config().protocol,
        fields,
    })
}

/// List filter drafts and the committed set
pub async fn list_filters(monitor: web::Data<Arc<MonitorManager>>) -> impl Responder {
    HttpResponse::Ok().json(FiltersResponse {
        drafts: monitor.filters().drafts(),
        committed: monitor.filters().committed(),
        filtering_active: monitor.display().filtering_active(),
        validation_errors: monitor.display().validation_errors(),
    })
}

/// Create a new, empty filter rule
pub async fn create_filter(monitor: web::Data<Arc<MonitorManager>>) -> impl Responder {
    let filter_id = monitor.add_rule();

    HttpResponse::Created().json(serde_json::json!({
        "status": "success",
        "message": "Filter created successfully",
        "filter_id": filter_id
    }))
}

/// Update the inputs of a filter rule
pub async fn update_filter(
    monitor: web::Data<Arc<MonitorManager>>,
    path: web::Path<Uuid>,
    req: web::Json<UpdateFilterRequest>,
) -> impl Responder {
    let filter_id = path.into_inner();
    let inputs = req.inputs.iter().map(|(field, text)| (*field, text.as_str()));

    match monitor.edit_rule(filter_id, inputs) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "message": format!("Filter {} updated successfully", filter_id)
        })),
        Err(e) => {
            warn!("Failed to update filter {}: {}", filter_id, e);
            error_response(e)
        }
    }
}

/// Delete a filter rule
pub async fn delete_filter(
    monitor: web::Data<Arc<MonitorManager>>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let filter_id = path.into_inner();

    match monitor.remove_rule(filter_id) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "message": format!("Filter {} deleted successfully", filter_id),
            "filtering_active": monitor.display().filtering_active()
        })),
        Err(e) => error_response(e),
    }
}

/// Commit all filter rules and rebuild the display
pub async fn apply_filters(monitor: web::Data<Arc<MonitorManager>>) -> impl Responder {
    match monitor.apply_filters() {
        Ok(shown) => {
            info!("Filters applied, {} packets displayed", shown);
            HttpResponse::Ok().json(serde_json::json!({
                "status": "success",
                "displayed": shown,
                "generation": monitor.filters().committed().generation
            }))
        }
        Err(errors) => HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "status": "error",
            "message": "Invalid filter rules",
            "errors": errors.iter().map(|e: &RuleError| serde_json::json!({
                "rule": e.location.rule,
                "field": e.location.field,
                "error": e.error,
                "message": e.error.to_string()
            })).collect::<Vec<_>>()
        })),
    }
}
