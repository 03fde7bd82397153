// crates/ladder-rs-monitor/src/bin/softplc.rs
//! A soft PLC: the scan loop on a dedicated thread, the web monitor in
//! front of it.
//!
//! The scan thread owns the complete runtime. Each pass drains the command
//! channel, ticks the runtime on a monotonic millisecond clock, and pushes
//! whatever the tick published to the monitor. Nothing else ever touches
//! the runtime, which is what makes the core's no-lock model sound.

use crossbeam_channel::{bounded, Receiver, Sender};
use ladder_rs::runtime::PlcRuntime;
use ladder_rs_monitor::model::{EngineCommand, MonitorEvent, ProgramRecord, SnapshotDto};
use log::{error, info};
use std::thread;
use std::time::{Duration, Instant};

/// Capacity of the channels between the scan thread and the monitor.
const CHANNEL_CAPACITY: usize = 64;

fn scan_loop(commands: Receiver<EngineCommand>, events: Sender<MonitorEvent>) {
    let mut runtime = PlcRuntime::new(None);
    runtime.boot();
    let started = Instant::now();
    info!("Scan loop up, controller is {}", runtime.state().as_str());

    loop {
        // 1. Service inbound commands between scans.
        while let Ok(command) = commands.try_recv() {
            let now_ms = started.elapsed().as_millis() as u64;
            match command {
                EngineCommand::Run => runtime.run(),
                EngineCommand::Stop => runtime.stop(),
                EngineCommand::Reset => runtime.reset(),
                EngineCommand::Force { addr, value } => runtime.force(&addr, value),
                EngineCommand::Deploy(record) => {
                    if let Err(e) = runtime.load_program(&record.to_doc()) {
                        error!("Deploy rejected: {}", e);
                    }
                }
                EngineCommand::SendProgram => {
                    let record = ProgramRecord::from_doc(&runtime.program_document());
                    let _ = events.send(MonitorEvent::Program(record));
                }
                EngineCommand::Refresh => {
                    let snapshot = runtime.snapshot(now_ms);
                    let _ = events.send(MonitorEvent::Snapshot(SnapshotDto::from(&snapshot)));
                }
            }
        }

        // 2. Run one scan if due, 3. publish if due.
        let now_ms = started.elapsed().as_millis() as u64;
        if let Some(snapshot) = runtime.tick(now_ms) {
            let _ = events.send(MonitorEvent::Snapshot(SnapshotDto::from(&snapshot)));
        }

        thread::sleep(Duration::from_millis(1));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (event_tx, event_rx) = bounded(CHANNEL_CAPACITY);
    let (command_tx, command_rx) = bounded(CHANNEL_CAPACITY);

    thread::spawn(move || scan_loop(command_rx, event_tx));

    ladder_rs_monitor::start_in_process_monitor(event_rx, command_tx).await
}
