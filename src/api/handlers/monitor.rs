use actix_web::{web, HttpResponse, Responder};
use log::info;
use std::sync::Arc;

use crate::capture::manager::MonitorManager;

/// Start forwarding arriving packets to the display
pub async fn start_monitoring(monitor: web::Data<Arc<MonitorManager>>) -> impl Responder {
    monitor.start_monitoring();
    info!("Monitoring started via API");

    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Monitoring started"
    }))
}

/// Stop forwarding arriving packets; they are still recorded
pub async fn stop_monitoring(monitor: web::Data<Arc<MonitorManager>>) -> impl Responder {
    monitor.stop_monitoring();
    info!("Monitoring stopped via API");

    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Monitoring stopped"
    }))
}

/// Get monitor status
pub async fn get_status(monitor: web::Data<Arc<MonitorManager>>) -> impl Responder {
    HttpResponse::Ok().json(monitor.stats())
}
