use actix_web::{http::StatusCode, test, web, App};
use busmonitor::api::routes;
use busmonitor::capture::manager::MonitorManager;
use busmonitor::models::config::AppConfig;
use serde_json::{json, Value};
use std::sync::Arc;

fn hdl_packet(ip: &str, subnet: u8, opcode: u16) -> Value {
    json!({
        "protocol": "hdl_buspro",
        "ip_address": ip,
        "head": "HDLMIRACLE",
        "source_subnet_id": subnet,
        "source_device_id": 12,
        "source_device_type": 149,
        "operation_code": opcode,
        "target_subnet_id": 255,
        "target_device_id": 255,
        "content": [72, 68, 76]
    })
}

#[actix_web::test]
async fn filter_lifecycle_over_http() {
    let monitor = Arc::new(MonitorManager::new(AppConfig::default()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(monitor.clone()))
            .configure(routes::configure),
    )
    .await;

    for (ip, subnet, opcode) in [("192.168.10.2", 1, 0x0031), ("192.168.10.3", 2, 0x0032)] {
        let req = test::TestRequest::post()
            .uri("/api/packets")
            .set_json(hdl_packet(ip, subnet, opcode))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    let req = test::TestRequest::post().uri("/api/filters").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["filter_id"].as_str().unwrap().to_string();

    // opcode out of range: rejected, display untouched
    let req = test::TestRequest::put()
        .uri(&format!("/api/filters/{}", id))
        .set_json(json!({ "inputs": { "operation_code": "10000" } }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post().uri("/api/filters/apply").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "operation_code");
    assert_eq!(body["errors"][0]["error"]["kind"], "out_of_range");
    assert_eq!(monitor.display().len(), 2);

    let req = test::TestRequest::put()
        .uri(&format!("/api/filters/{}", id))
        .set_json(json!({ "inputs": { "operation_code": "32", "ip_address": " 192.168.10.3 " } }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post().uri("/api/filters/apply").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["displayed"], 1);

    let req = test::TestRequest::get().uri("/api/filters").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let inputs = body["drafts"][0]["inputs"].as_array().unwrap();
    let opcode = inputs
        .iter()
        .find(|i| i["field"] == "operation_code")
        .unwrap();
    assert_eq!(opcode["text"], "0032");
    assert_eq!(body["committed"]["generation"], 1);

    let req = test::TestRequest::get().uri("/api/display").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["rows"][0]["seq"], 2);

    let req = test::TestRequest::get().uri("/api/display/text").to_request();
    let text = test::call_and_read_body(&app, req).await;
    let text = std::str::from_utf8(&text).unwrap();
    assert!(text.contains("192.168.10.3"));
    assert!(text.contains("48 44 4c"));
    assert!(text.ends_with('\n'));

    let req = test::TestRequest::get().uri("/api/packets").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 2);
}

#[actix_web::test]
async fn unknown_rules_and_fields() {
    let monitor = Arc::new(MonitorManager::new(AppConfig::default()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(monitor.clone()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/filters/{}", uuid::Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/packets")
        .set_json(json!({
            "protocol": "smart_bus",
            "source_subnet_id": 1,
            "source_device_id": 1,
            "source_device_type": 1,
            "operation_code": 1,
            "target_subnet_id": 1,
            "target_device_id": 1
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/schema").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["fields"].as_array().unwrap().len(), 8);
    assert_eq!(body["fields"][1]["suggestions"][0], "HDLMIRACLE");
    assert_eq!(body["fields"][0]["restricted"], true);
}

#[actix_web::test]
async fn monitor_start_stop() {
    let monitor = Arc::new(MonitorManager::new(AppConfig::default()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(monitor.clone()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/monitor/stop").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/packets")
        .set_json(hdl_packet("10.0.0.1", 1, 1))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

    let req = test::TestRequest::get().uri("/api/monitor/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["live"], false);
    assert_eq!(body["history_packets"], 1);
    assert_eq!(body["displayed_packets"], 0);

    let req = test::TestRequest::delete().uri("/api/packets").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert_eq!(monitor.history_len(), 0);
}
