use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::capture::manager::MonitorManager;
use crate::capture::sink::Arrival;
use crate::display::render::{self, Column, DisplayRow};
use crate::models::packet::BusPacket;

/// Query parameters for listing packets
#[derive(Deserialize)]
pub struct PacketsQuery {
    /// Offset for pagination
    #[serde(default = "default_offset")]
    offset: usize,

    /// Limit for pagination
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_offset() -> usize { 0 }
fn default_limit() -> usize { 100 }

/// Response for listing packets
#[derive(Serialize)]
struct PacketsResponse {
    packets: Vec<Arc<Arrival>>,
    total: usize,
    offset: usize,
    limit: usize,
}

/// Response for listing display rows
#[derive(Serialize)]
struct DisplayResponse {
    columns: &'static [Column],
    rows: Vec<DisplayRow>,
    total: usize,
    offset: usize,
    limit: usize,
}

/// Get a page of the packet history
pub async fn get_packets(
    monitor: web::Data<Arc<MonitorManager>>,
    query: web::Query<PacketsQuery>,
) -> impl Responder {
    let packets = monitor.history(query.offset, query.limit);

    HttpResponse::Ok().json(PacketsResponse {
        packets,
        total: monitor.history_len(),
        offset: query.offset,
        limit: query.limit,
    })
}

/// Receive one decoded packet from an external driver
pub async fn post_packet(
    monitor: web::Data<Arc<MonitorManager>>,
    packet: web::Json<BusPacket>,
) -> impl Responder {
    match monitor.receive(packet.into_inner()) {
        Ok(arrival) => HttpResponse::Accepted().json(serde_json::json!({
            "status": "success",
            "seq": arrival.seq,
            "timestamp": arrival.timestamp
        })),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({
            "status": "error",
            "message": e.to_string()
        })),
    }
}

/// Discard history and display
pub async fn clear_packets(monitor: web::Data<Arc<MonitorManager>>) -> impl Responder {
    monitor.clear();

    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Packets cleared"
    }))
}

/// Get rendered rows of the displayed packets
pub async fn get_display(
    monitor: web::Data<Arc<MonitorManager>>,
    query: web::Query<PacketsQuery>,
) -> impl Responder {
    let display = monitor.display();

    HttpResponse::Ok().json(DisplayResponse {
        columns: render::columns(display.protocol()),
        rows: display.rows(query.offset, query.limit),
        total: display.len(),
        offset: query.offset,
        limit: query.limit,
    })
}

/// Export displayed packets as plain text
pub async fn get_display_text(
    monitor: web::Data<Arc<MonitorManager>>,
    query: web::Query<PacketsQuery>,
) -> impl Responder {
    let text = monitor.display().export_text(query.offset, query.limit);
    info!("Exported {} bytes of display text", text.len());

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text)
}
