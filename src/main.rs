use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;

use busmonitor::api::routes;
use busmonitor::capture::driver::{FeedDriver, FeedSource};
use busmonitor::capture::manager::MonitorManager;
use busmonitor::models::config::AppConfig;
use busmonitor::models::packet::Protocol;
use busmonitor::utils::logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "HDL Buspro / SmartBus packet monitor with REST API")]
struct Args {
    /// Bus protocol to monitor
    #[clap(long, value_enum, default_value = "hdl")]
    protocol: Protocol,

    /// Port for the REST API server
    #[clap(short, long, default_value = "3000")]
    port: u16,

    /// JSON-lines file of decoded packets to read (`-` for stdin)
    #[clap(short, long)]
    feed: Option<PathBuf>,

    /// Start with live processing stopped
    #[clap(long)]
    paused: bool,

    /// Capacity of the driver to sink channel
    #[clap(long, default_value = "1024")]
    channel_capacity: usize,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "info", value_parser = logging::parse_log_level)]
    log_level: LevelFilter,
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger with specified level
    logging::init_logger(args.log_level, args.protocol);

    info!("Starting busmonitor v{}", env!("CARGO_PKG_VERSION"));

    // Create application config
    let config = AppConfig {
        protocol: args.protocol,
        port: args.port,
        feed: args.feed,
        live: !args.paused,
        channel_capacity: args.channel_capacity.max(1),
    };

    let monitor = Arc::new(MonitorManager::new(config.clone()));

    if let Some(path) = &config.feed {
        let driver = FeedDriver::new(FeedSource::from_path(path.clone()), config.protocol);
        let errors = driver.error_counter();
        monitor
            .attach_driver(Box::new(driver), Some(errors))
            .with_context(|| format!("Failed to open packet feed {}", path.display()))?;
    } else {
        info!("No packet feed given, packets are accepted on POST /api/packets");
    }

    let app_state = web::Data::new(monitor.clone());

    info!("Monitoring {} on API port {}", config.protocol, config.port);

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(format!("127.0.0.1:{}", config.port))?
    .run()
    .await?;

    monitor.detach_driver();
    info!("busmonitor stopped");
    Ok(())
}
