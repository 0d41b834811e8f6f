//! WR3223 poller
//!
//! Polls a WR3223 controller and logs every decoded value until Ctrl-C.
//!
//! Usage: wr3223-poll <config.toml>
//! Example: WR3223_HOST=192.168.1.40 WR3223_PORT=8899 wr3223-poll wr3223.toml

use std::sync::Arc;

use tracing::{error, info, warn};
use wr3223::{
    init_logging, Controller, LinkConnector, LinkStatus, Observer, Poller, PointId, Wr3223Config,
};

/// Observer that writes every value to the log.
struct LogObserver;

impl Observer for LogObserver {
    fn publish(&self, point: PointId, value: &str) {
        info!("{} = {}", point.channel(), value);
    }

    fn update_status(&self, status: LinkStatus) {
        match status {
            LinkStatus::Online => info!("Controller {}", status),
            LinkStatus::Offline { .. } => warn!("Controller {}", status),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "wr3223.toml".to_string());

    let config = Wr3223Config::load(&path)?;
    init_logging(&config.log_level)?;
    info!("Loaded configuration from {}", path);

    let target = match config.connection_target() {
        Ok(target) => target,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!("Controller {} at {}", config.controller_addr, target);

    let connector = LinkConnector::new(target, config.controller_addr);
    let controller = Arc::new(Controller::new(connector, LogObserver));
    let poller = Poller::spawn(controller, config.refresh_interval());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    poller.shutdown().await?;
    Ok(())
}
