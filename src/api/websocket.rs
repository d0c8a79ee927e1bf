use actix_web::{web, Error, HttpRequest, Responder};
use actix_ws::{self, Message};
use futures_util::StreamExt;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::interval;

use crate::capture::manager::MonitorManager;
use crate::models::stats::MonitorStats;

// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

// Clients silent for this long are dropped
const CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

/// WebSocket messages that are not display events
#[derive(Serialize)]
#[serde(tag = "type")]
enum WsOutMessage {
    #[serde(rename = "status")]
    Status { stats: MonitorStats },

    #[serde(rename = "resync")]
    Resync { skipped: u64 },
}

/// Stream display updates to a WebSocket client
pub async fn ws_index(
    req: HttpRequest,
    body: web::Payload,
    monitor: web::Data<Arc<MonitorManager>>,
) -> Result<impl Responder, Error> {
    let addr = req
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    info!("WebSocket connection from: {}", addr);

    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let monitor = monitor.into_inner();
    let mut events = monitor.display().subscribe();

    actix_web::rt::spawn(async move {
        let mut heartbeat = interval(HEARTBEAT_INTERVAL);
        let mut last_seen = Instant::now();

        if send_json(&mut session, &WsOutMessage::Status { stats: monitor.stats() })
            .await
            .is_err()
        {
            warn!("Failed to send initial status");
            return;
        }

        loop {
            tokio::select! {
                msg = msg_stream.next() => {
                    let msg = match msg {
                        Some(Ok(msg)) => msg,
                        _ => break,
                    };
                    last_seen = Instant::now();
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Text(text) => {
                            debug!("Received text message: {}", text);
                            if text.trim() == "status" {
                                let status = WsOutMessage::Status { stats: monitor.stats() };
                                if send_json(&mut session, &status).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Message::Close(_) => {
                            info!("Client requested close");
                            break;
                        }
                        _ => {}
                    }
                }

                event = events.recv() => {
                    let sent = match event {
                        Ok(event) => send_json(&mut session, &event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("WebSocket client lagged, {} display events skipped", skipped);
                            send_json(&mut session, &WsOutMessage::Resync { skipped }).await
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if sent.is_err() {
                        break;
                    }
                }

                _ = heartbeat.tick() => {
                    if last_seen.elapsed() > CLIENT_TIMEOUT {
                        warn!("WebSocket client heartbeat timed out");
                        break;
                    }
                    if session.ping(b"").await.is_err() {
                        break;
                    }
                }
            }
        }

        let _ = session.close(None).await;
        info!("WebSocket connection closed");
    });

    Ok(response)
}

/// Serialize and send one message
async fn send_json<T: Serialize>(
    session: &mut actix_ws::Session,
    msg: &T,
) -> Result<(), actix_ws::Closed> {
    if let Ok(json) = serde_json::to_string(msg) {
        session.text(json).await?;
    }
    Ok(())
}
