// crates/ladder-rs-monitor/src/model.rs
//! Defines the wire-level data structures of the monitor.
//!
//! These structs mirror the core runtime's snapshot and program types to
//! provide a stable serialization API for the web frontend, and carry the
//! textual command protocol clients speak over the WebSocket.

use ladder_rs::program::{LinkDoc, NodeDoc, ProgramDoc};
use ladder_rs::runtime::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A serializable snapshot of the controller, as published to observers.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SnapshotDto {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    pub memory: MemoryDto,
}

/// Sparse memory view: only set bits, non-zero words and live instances.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MemoryDto {
    pub m: BTreeMap<String, bool>,
    pub i: BTreeMap<String, bool>,
    pub q: BTreeMap<String, bool>,
    pub d: BTreeMap<String, u32>,
    pub t: BTreeMap<String, TimerDto>,
    pub c: BTreeMap<String, CounterDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TimerDto {
    pub q: bool,
    pub current: u64,
    pub preset: u64,
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CounterDto {
    pub q: bool,
    pub current: i32,
    pub preset: i32,
}

impl From<&Snapshot> for SnapshotDto {
    fn from(snapshot: &Snapshot) -> Self {
        let flags = |indices: &[usize]| -> BTreeMap<String, bool> {
            indices.iter().map(|i| (i.to_string(), true)).collect()
        };
        SnapshotDto {
            status: snapshot.status.as_str().to_string(),
            error: snapshot.error.clone(),
            memory: MemoryDto {
                m: flags(&snapshot.m),
                i: flags(&snapshot.i),
                q: flags(&snapshot.q),
                d: snapshot
                    .d
                    .iter()
                    .map(|(i, w)| (i.to_string(), *w))
                    .collect(),
                t: snapshot
                    .timers
                    .iter()
                    .map(|t| {
                        (
                            t.name.clone(),
                            TimerDto {
                                q: t.q,
                                current: t.current,
                                preset: t.preset,
                                enabled: t.enabled,
                            },
                        )
                    })
                    .collect(),
                c: snapshot
                    .counters
                    .iter()
                    .map(|c| {
                        (
                            c.name.clone(),
                            CounterDto {
                                q: c.q,
                                current: c.current,
                                preset: c.preset,
                            },
                        )
                    })
                    .collect(),
            },
        }
    }
}

/// One node record of an uploaded or downloaded program document.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NodeRecord {
    pub id: i64,
    #[serde(rename = "networkId", default)]
    pub network_id: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub setpoint: i32,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// One link record of a program document.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LinkRecord {
    pub from: i64,
    pub to: i64,
    #[serde(rename = "fromPort", default)]
    pub from_port: String,
    #[serde(rename = "toPort", default)]
    pub to_port: String,
}

/// The program document as the editor uploads and downloads it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProgramRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(rename = "linkData", default)]
    pub links: Vec<LinkRecord>,
}

impl ProgramRecord {
    /// The core-side document form.
    pub fn to_doc(&self) -> ProgramDoc {
        ProgramDoc {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeDoc {
                    id: n.id,
                    network_id: n.network_id.clone(),
                    node_type: n.node_type.clone(),
                    addr: n.addr.clone(),
                    tag: n.tag.clone(),
                    instruction: n.instruction.clone(),
                    args: n.args.clone(),
                    setpoint: n.setpoint,
                    x: n.x,
                    y: n.y,
                })
                .collect(),
            links: self
                .links
                .iter()
                .map(|l| LinkDoc {
                    from: l.from,
                    to: l.to,
                    from_port: l.from_port.clone(),
                    to_port: l.to_port.clone(),
                })
                .collect(),
        }
    }

    pub fn from_doc(doc: &ProgramDoc) -> Self {
        ProgramRecord {
            nodes: doc
                .nodes
                .iter()
                .map(|n| NodeRecord {
                    id: n.id,
                    network_id: n.network_id.clone(),
                    node_type: n.node_type.clone(),
                    addr: n.addr.clone(),
                    tag: n.tag.clone(),
                    instruction: n.instruction.clone(),
                    args: n.args.clone(),
                    setpoint: n.setpoint,
                    x: n.x,
                    y: n.y,
                })
                .collect(),
            links: doc
                .links
                .iter()
                .map(|l| LinkRecord {
                    from: l.from,
                    to: l.to,
                    from_port: l.from_port.clone(),
                    to_port: l.to_port.clone(),
                })
                .collect(),
        }
    }
}

/// What the monitor pushes to WebSocket clients: periodic snapshots, and the
/// current program when a client asked for it.
#[derive(Serialize, Clone, Debug)]
#[serde(untagged)]
pub enum MonitorEvent {
    Snapshot(SnapshotDto),
    Program(ProgramRecord),
}

/// A command forwarded from a WebSocket client to the scan thread.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Run,
    Stop,
    Reset,
    /// Force one address to a value.
    Force { addr: String, value: u32 },
    /// Replace the program.
    Deploy(ProgramRecord),
    /// Client asked for the current program document.
    SendProgram,
    /// Client asked for an immediate snapshot (new connections).
    Refresh,
}

/// Parses one inbound WebSocket text message.
///
/// `RUN`/`STOP`/`RESET` (case-insensitive), `SET <ADDR> <INT>`, `/load`, or
/// a JSON program document. Anything else is `None`.
pub fn parse_command(text: &str) -> Option<EngineCommand> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<ProgramRecord>(trimmed)
            .ok()
            .map(EngineCommand::Deploy);
    }
    if trimmed == "/load" {
        return Some(EngineCommand::SendProgram);
    }
    if trimmed.eq_ignore_ascii_case("RUN") {
        return Some(EngineCommand::Run);
    }
    if trimmed.eq_ignore_ascii_case("STOP") {
        return Some(EngineCommand::Stop);
    }
    if trimmed.eq_ignore_ascii_case("RESET") {
        return Some(EngineCommand::Reset);
    }

    let mut parts = trimmed.split_whitespace();
    if let (Some(verb), Some(addr), Some(value)) = (parts.next(), parts.next(), parts.next()) {
        if verb.eq_ignore_ascii_case("SET") && parts.next().is_none() {
            return value.parse().ok().map(|value| EngineCommand::Force {
                addr: addr.to_string(),
                value,
            });
        }
    }
    None
}
