// crates/ladder-rs/src/program/node.rs

use crate::memory::Address;
use alloc::string::String;

/// The behavioral class of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Left-rail source. Its rung input is unconditionally true.
    Network,
    /// Normally-open contact: passes the signal while its address is true.
    Open,
    /// Normally-closed contact: passes the signal while its address is false.
    Close,
    /// One-scan pulse on a false-to-true transition of its address.
    Rising,
    /// One-scan pulse on a true-to-false transition of its address.
    Falling,
    /// Signal inverter against its address (equivalent to a closed contact).
    Invert,
    /// Output coil: follows the rung condition.
    Coil,
    /// Latching coil: writes true while the rung condition is true.
    Set,
    /// Unlatching coil: writes false while the rung condition is true.
    Reset,
    /// Boxed instruction (timer, counter, arithmetic, comparison, move).
    Instruction,
}

impl NodeKind {
    /// Resolves a document `type` string by substring match.
    ///
    /// RESET must be probed before SET: the former contains the latter.
    /// Unrecognized strings fall back to an open contact.
    pub fn from_type_str(type_str: &str) -> NodeKind {
        const PROBES: [(&str, NodeKind); 10] = [
            ("NETWORK", NodeKind::Network),
            ("OPEN", NodeKind::Open),
            ("CLOSE", NodeKind::Close),
            ("RISING", NodeKind::Rising),
            ("FALLING", NodeKind::Falling),
            ("INVERT", NodeKind::Invert),
            ("COIL", NodeKind::Coil),
            ("RESET", NodeKind::Reset),
            ("SET", NodeKind::Set),
            ("INSTRUCTION", NodeKind::Instruction),
        ];

        let upper = type_str.to_ascii_uppercase();
        for (probe, kind) in PROBES {
            if upper.contains(probe) {
                return kind;
            }
        }
        NodeKind::Open
    }

    /// The canonical document string for this kind.
    pub fn type_str(&self) -> &'static str {
        match self {
            NodeKind::Network => "NETWORK",
            NodeKind::Open => "OPEN",
            NodeKind::Close => "CLOSE",
            NodeKind::Rising => "RISING",
            NodeKind::Falling => "FALLING",
            NodeKind::Invert => "INVERT",
            NodeKind::Coil => "COIL",
            NodeKind::Set => "SET",
            NodeKind::Reset => "RESET",
            NodeKind::Instruction => "INSTRUCTION",
        }
    }
}

/// One node of the loaded program.
///
/// `id` doubles as the index into the scan scratch arrays, so it is always
/// below `MAX_NODES`. `addr` holds the parsed reference for contact and coil
/// kinds; `addr_text` keeps the raw text so the document round-trips even
/// when the reference did not resolve. `network` is the canonical network id
/// after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: usize,
    pub network: String,
    pub kind: NodeKind,
    pub addr: Option<Address>,
    pub addr_text: String,
    pub tag: String,
    pub instruction: String,
    pub args: String,
    pub setpoint: i32,
    pub x: i32,
    pub y: i32,
}

/// A directional edge between two nodes. Port labels are advisory display
/// data and carry no semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub from: usize,
    pub to: usize,
    pub from_port: String,
    pub to_port: String,
}
