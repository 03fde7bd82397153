// crates/ladder-rs/src/program/mod.rs

mod node;
pub mod networks;

pub use node::{Link, Node, NodeKind};

use crate::hal::LadderError;
use crate::log::{my_info, my_warn};
use crate::memory::Address;
use crate::types::{MAX_LINKS, MAX_NODES};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// One node record of a program document. `tag`, `setpoint`, `x` and `y`
/// are opaque editor data carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDoc {
    pub id: i64,
    pub network_id: String,
    pub node_type: String,
    pub addr: String,
    pub tag: String,
    pub instruction: String,
    pub args: String,
    pub setpoint: i32,
    pub x: i32,
    pub y: i32,
}

/// One link record of a program document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkDoc {
    pub from: i64,
    pub to: i64,
    pub from_port: String,
    pub to_port: String,
}

/// The ingestion form of a program: what the transport layer hands over
/// after decoding an upload, and what the engine emits back on request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramDoc {
    pub nodes: Vec<NodeDoc>,
    pub links: Vec<LinkDoc>,
}

/// The loaded node and link tables the scan engine executes.
#[derive(Debug, Default)]
pub struct Program {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl Program {
    /// An empty program; scanning it is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the node and link tables from a document.
    ///
    /// Node and link counts beyond the compile-time capacities are truncated
    /// with a warning. A node id outside `0..MAX_NODES` or appearing twice
    /// makes the document malformed: ids are used as scratch-array indices,
    /// so nothing is committed in that case. Links that name unknown nodes
    /// are dropped with a warning.
    pub fn load(doc: &ProgramDoc) -> Result<Program, LadderError> {
        let mut nodes: Vec<Node> = Vec::new();

        if doc.nodes.len() > MAX_NODES {
            my_warn!(
                "[PRG] document carries {} nodes, truncating to {}",
                doc.nodes.len(),
                MAX_NODES
            );
        }
        for rec in doc.nodes.iter().take(MAX_NODES) {
            if rec.id < 0 || rec.id as usize >= MAX_NODES {
                return Err(LadderError::MalformedProgram("node id out of range"));
            }
            let id = rec.id as usize;
            if nodes.iter().any(|n| n.id == id) {
                return Err(LadderError::MalformedProgram("duplicate node id"));
            }

            let kind = NodeKind::from_type_str(&rec.node_type);
            // A NETWORK node's addr is its network label, not a memory
            // reference; instructions address memory via their args.
            let addr = match kind {
                NodeKind::Network | NodeKind::Instruction => None,
                _ => match Address::parse(&rec.addr) {
                    Ok(addr) => Some(addr),
                    Err(e) => {
                        my_warn!("[PRG] node {}: address {:?} ignored ({})", id, rec.addr, e);
                        None
                    }
                },
            };

            nodes.push(Node {
                id,
                network: networks::canonical_id(&rec.network_id),
                kind,
                addr,
                addr_text: rec.addr.trim().to_string(),
                tag: rec.tag.clone(),
                instruction: rec.instruction.clone(),
                args: rec.args.clone(),
                setpoint: rec.setpoint,
                x: rec.x,
                y: rec.y,
            });
        }

        if doc.links.len() > MAX_LINKS {
            my_warn!(
                "[PRG] document carries {} links, truncating to {}",
                doc.links.len(),
                MAX_LINKS
            );
        }
        let mut links: Vec<Link> = Vec::new();
        for rec in doc.links.iter().take(MAX_LINKS) {
            let known = |id: i64| id >= 0 && nodes.iter().any(|n| n.id == id as usize);
            if !known(rec.from) || !known(rec.to) {
                my_warn!("[PRG] link {} -> {} names an unknown node, dropped", rec.from, rec.to);
                continue;
            }
            links.push(Link {
                from: rec.from as usize,
                to: rec.to as usize,
                from_port: rec.from_port.clone(),
                to_port: rec.to_port.clone(),
            });
        }

        if nodes.iter().any(|n| n.network == networks::UNASSIGNED) {
            networks::assign(&mut nodes, &links);
        }

        my_info!(
            "[PRG] loaded program: {} nodes, {} links, {} networks",
            nodes.len(),
            links.len(),
            count_networks(&nodes)
        );
        Ok(Program { nodes, links })
    }

    /// Reconstructs the document form of the loaded program, serving the
    /// transport's program-download request.
    pub fn document(&self) -> ProgramDoc {
        ProgramDoc {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeDoc {
                    id: n.id as i64,
                    network_id: n.network.clone(),
                    node_type: n.kind.type_str().to_string(),
                    addr: n.addr_text.clone(),
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
                    from: l.from as i64,
                    to: l.to as i64,
                    from_port: l.from_port.clone(),
                    to_port: l.to_port.clone(),
                })
                .collect(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Outgoing links of one node.
    pub fn links_from(&self, id: usize) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.from == id)
    }

    /// Nodes of one network, in document order.
    pub fn nodes_in<'a>(&'a self, network: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes.iter().filter(move |n| n.network == network)
    }

    /// The distinct canonical network ids, in execution order.
    pub fn network_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for node in &self.nodes {
            if !ids.contains(&node.network) {
                ids.push(node.network.clone());
            }
        }
        ids.sort_by(|a, b| networks::compare_ids(a, b));
        ids
    }
}

fn count_networks(nodes: &[Node]) -> usize {
    let mut ids: Vec<&str> = nodes.iter().map(|n| n.network.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}
