use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use crate::api::handlers::{
    filters::{
        apply_filters,
        create_filter,
        delete_filter,
        get_schema,
        list_filters,
        update_filter,
    },
    monitor::{
        get_status,
        start_monitoring,
        stop_monitoring,
    },
    packets::{
        clear_packets,
        get_display,
        get_display_text,
        get_packets,
        post_packet,
    },
};
use crate::api::websocket::ws_index;

/// Root endpoint to provide information about the API
async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "Bus Monitor API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "HDL Buspro / SmartBus packet monitor with rule-based filtering",
        "endpoints": [
            { "path": "/api/schema", "method": "GET", "description": "Filterable fields of the monitored protocol" },
            { "path": "/api/filters", "method": "GET", "description": "List filter rules and the committed set" },
            { "path": "/api/filters", "method": "POST", "description": "Add an empty filter rule" },
            { "path": "/api/filters/{id}", "method": "PUT", "description": "Set the inputs of a filter rule" },
            { "path": "/api/filters/{id}", "method": "DELETE", "description": "Remove a filter rule" },
            { "path": "/api/filters/apply", "method": "POST", "description": "Commit filter rules and rebuild the display" },
            { "path": "/api/packets", "method": "GET", "description": "Get the packet history" },
            { "path": "/api/packets", "method": "POST", "description": "Submit a decoded packet" },
            { "path": "/api/packets", "method": "DELETE", "description": "Clear history and display" },
            { "path": "/api/display", "method": "GET", "description": "Get rendered display rows" },
            { "path": "/api/display/text", "method": "GET", "description": "Export display rows as text" },
            { "path": "/api/monitor/start", "method": "POST", "description": "Start live processing" },
            { "path": "/api/monitor/stop", "method": "POST", "description": "Stop live processing" },
            { "path": "/api/monitor/status", "method": "GET", "description": "Get monitor status" },
            { "path": "/api/ws", "method": "GET", "description": "WebSocket endpoint for display updates" }
        ]
    }))
}

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Root endpoint
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                // WebSocket route for display updates
                .route("/ws", web::get().to(ws_index))
                .route("/schema", web::get().to(get_schema))
                // Filter rules
                .service(
                    web::scope("/filters")
                        .route("", web::get().to(list_filters))
                        .route("", web::post().to(create_filter))
                        .route("/apply", web::post().to(apply_filters))
                        .route("/{id}", web::put().to(update_filter))
                        .route("/{id}", web::delete().to(delete_filter))
                )
                // Packet history and ingestion
                .service(
                    web::scope("/packets")
                        .route("", web::get().to(get_packets))
                        .route("", web::post().to(post_packet))
                        .route("", web::delete().to(clear_packets))
                )
                .service(
                    web::scope("/display")
                        .route("", web::get().to(get_display))
                        .route("/text", web::get().to(get_display_text))
                )
                .service(
                    web::scope("/monitor")
                        .route("/start", web::post().to(start_monitoring))
                        .route("/stop", web::post().to(stop_monitoring))
                        .route("/status", web::get().to(get_status))
                )
        );
}
