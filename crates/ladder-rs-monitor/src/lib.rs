// crates/ladder-rs-monitor/src/lib.rs

// Module for the wire-level data models
pub mod model;
// Module for the web server and WebSocket logic
#[cfg(feature = "in-process")]
mod server;

#[cfg(feature = "in-process")]
use log::{error, info};
#[cfg(feature = "in-process")]
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

// Imports for 'in-process' mode
#[cfg(feature = "in-process")]
use crate::model::{EngineCommand, MonitorEvent};
#[cfg(feature = "in-process")]
use crossbeam_channel::{Receiver, Sender};
#[cfg(feature = "in-process")]
use tokio::sync::broadcast;

/// The default port for the web monitor.
pub const DEFAULT_MONITOR_PORT: u16 = 3000;
/// The capacity of the broadcast channel for WebSocket clients.
const BROADCAST_CHANNEL_CAPACITY: usize = 32;

/// Starts the web monitor in "in-process" mode.
///
/// This function is intended to be run by the main application thread after
/// spawning the dedicated scan-loop thread. It starts a web server with a
/// WebSocket endpoint that publishes every received [`MonitorEvent`] to all
/// connected clients and feeds their commands back through `commands`.
///
/// * `events`: the `crossbeam-channel` receiving snapshots and program
///   documents from the scan-loop thread.
/// * `commands`: the sender the scan-loop thread drains between scans.
#[cfg(feature = "in-process")]
pub async fn start_in_process_monitor(
    events: Receiver<MonitorEvent>,
    commands: Sender<EngineCommand>,
) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Define the web server address.
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), DEFAULT_MONITOR_PORT);

    // 2. Create the tokio broadcast channel that distributes events from
    // the bridge task to all connected WebSocket clients.
    let (event_tx, _) = broadcast::channel::<MonitorEvent>(BROADCAST_CHANNEL_CAPACITY);

    // 3. Spawn the blocking task that bridges the channels. `spawn_blocking`
    // keeps the blocking `events.recv()` call off the async runtime, so it
    // cannot stall the web server.
    let bridge_tx = event_tx.clone();
    tokio::task::spawn_blocking(move || {
        info!("Starting scan-loop-to-monitor bridge task.");
        // This loop blocks on the crossbeam receiver
        while let Ok(event) = events.recv() {
            if let Err(e) = bridge_tx.send(event) {
                // This typically means all WebSocket clients (and the
                // server) have disconnected.
                error!(
                    "Failed to broadcast event (no receivers?): {}. Shutting down bridge.",
                    e
                );
                break;
            }
        }
        info!("Scan-loop-to-monitor bridge task shut down.");
    });

    // 4. Start the web server. Runs until the process exits.
    server::start_web_server(addr, event_tx, commands).await;

    Ok(())
}
