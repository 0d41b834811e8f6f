//! Periodic polling task
//!
//! Runs [`Controller::run_cycle`] on a fixed interval and on demand. Cycles
//! never overlap: the timer and refresh requests are served by the same task.
//! A refresh that arrives shortly before the next tick is folded into it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::constants::REFRESH_COALESCE_THRESHOLD_SECS;
use crate::controller::{CommandValue, Controller, Dispatch, Observer};
use crate::error::{Wr3223Error, Wr3223Result};
use crate::transport::Connector;

#[derive(Debug)]
enum PollerCommand {
    Refresh,
    Shutdown,
}

/// Spawns the polling loop.
pub struct Poller;

impl Poller {
    /// Start polling. The first cycle runs immediately.
    pub fn spawn<C, O>(controller: Arc<Controller<C, O>>, interval: Duration) -> PollerHandle<C, O>
    where
        C: Connector + 'static,
        O: Observer + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let coalesce = Duration::from_secs(REFRESH_COALESCE_THRESHOLD_SECS);
        let task = tokio::spawn(run(controller.clone(), interval, coalesce, rx));
        info!("Polling every {:?}", interval);
        PollerHandle {
            controller,
            commands: tx,
            task,
        }
    }
}

/// Handle to a running poller.
pub struct PollerHandle<C: Connector, O: Observer> {
    controller: Arc<Controller<C, O>>,
    commands: mpsc::UnboundedSender<PollerCommand>,
    task: JoinHandle<()>,
}

impl<C, O> PollerHandle<C, O>
where
    C: Connector + 'static,
    O: Observer + 'static,
{
    pub fn controller(&self) -> &Arc<Controller<C, O>> {
        &self.controller
    }

    /// Request an on-demand cycle. Returns `false` when the loop has stopped.
    pub fn refresh(&self) -> bool {
        self.commands.send(PollerCommand::Refresh).is_ok()
    }

    /// Dispatch a command and trigger a refresh when it asks for one.
    pub fn handle_command(&self, channel: &str, value: CommandValue) -> Wr3223Result<Dispatch> {
        let dispatch = self.controller.handle_command(channel, value)?;
        if dispatch == Dispatch::RefreshRequested && !self.refresh() {
            warn!("Refresh requested but the poller has stopped");
        }
        Ok(dispatch)
    }

    /// Stop the loop and close the connection.
    pub async fn shutdown(self) -> Wr3223Result<()> {
        let _ = self.commands.send(PollerCommand::Shutdown);
        self.task
            .await
            .map_err(|e| Wr3223Error::connection(format!("Polling task failed: {}", e)))?;
        info!("Poller stopped");
        self.controller.close().await
    }
}

async fn run<C, O>(
    controller: Arc<Controller<C, O>>,
    interval: Duration,
    coalesce: Duration,
    mut commands: mpsc::UnboundedReceiver<PollerCommand>,
) where
    C: Connector,
    O: Observer,
{
    let mut next_tick = Instant::now();
    loop {
        tokio::select! {
            _ = sleep_until(next_tick) => {
                next_tick = Instant::now() + interval;
                cycle(&controller).await;
            }
            command = commands.recv() => match command {
                Some(PollerCommand::Refresh) => {
                    let remaining = next_tick.saturating_duration_since(Instant::now());
                    if remaining < coalesce {
                        debug!("Refresh folded into tick due in {:?}", remaining);
                    } else {
                        cycle(&controller).await;
                    }
                }
                Some(PollerCommand::Shutdown) | None => break,
            }
        }
    }
}

async fn cycle<C: Connector, O: Observer>(controller: &Controller<C, O>) {
    match controller.run_cycle().await {
        Ok(outcome) => debug!("Cycle finished: {:?}", outcome),
        Err(e) => warn!("Cycle failed, retrying next tick: {}", e),
    }
}
