// crates/ladder-rs/src/scan/mod.rs
//! The cyclic evaluator.
//!
//! One scan walks the program's networks in id order. Within a network,
//! NETWORK sources drive their successors first, then signals propagate
//! iteratively to a fixpoint, then coils and instructions commit their
//! effects to the memory, timer and counter banks. A network's commits are
//! finished before the next network starts, so a later network observes the
//! writes of an earlier one within the same scan.

pub(crate) mod instr;

use crate::counters::CounterBank;
use crate::log::{my_trace, my_warn};
use crate::memory::{Address, MemoryBank};
use crate::program::{Node, NodeKind, Program};
use crate::timers::TimerBank;
use crate::types::{MAX_NODES, MAX_PROPAGATION_PASSES};

/// Per-node scan scratch plus the cycle driver.
///
/// All arrays are indexed by node id. `inputs`/`outputs` are rebuilt every
/// cycle; the `prev_*` arrays persist across cycles and feed the edge
/// detectors and the edge-triggered instructions.
pub struct ScanEngine {
    inputs: [bool; MAX_NODES],
    outputs: [bool; MAX_NODES],
    prev_inputs: [bool; MAX_NODES],
    prev_outputs: [bool; MAX_NODES],
    prev_contact: [bool; MAX_NODES],
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanEngine {
    pub fn new() -> Self {
        Self {
            inputs: [false; MAX_NODES],
            outputs: [false; MAX_NODES],
            prev_inputs: [false; MAX_NODES],
            prev_outputs: [false; MAX_NODES],
            prev_contact: [false; MAX_NODES],
        }
    }

    /// Zeroes all scratch state. Called when a program is (re)deployed and
    /// on the RESET transition, so stale edge state cannot fire afterwards.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// A node's rung condition at the end of the last finished evaluation.
    pub fn output(&self, id: usize) -> bool {
        self.outputs.get(id).copied().unwrap_or(false)
    }

    /// A node's accumulated input signal.
    pub fn input(&self, id: usize) -> bool {
        self.inputs.get(id).copied().unwrap_or(false)
    }

    /// Executes one complete scan at time `now_ms`.
    pub fn run_cycle(
        &mut self,
        program: &Program,
        memory: &mut MemoryBank,
        timers: &mut TimerBank,
        counters: &mut CounterBank,
        now_ms: u64,
    ) {
        self.prev_outputs = self.outputs;
        self.prev_inputs = self.inputs;
        self.inputs = [false; MAX_NODES];
        self.outputs = [false; MAX_NODES];

        // The left rail is always live.
        for node in program.nodes() {
            if node.kind == NodeKind::Network {
                self.inputs[node.id] = true;
            }
        }

        for network in program.network_ids() {
            my_trace!("[SCAN] evaluating network {}", network);
            self.drive_sources(program, &network);
            self.propagate(program, memory, timers, counters, &network);
            self.commit(program, memory, timers, counters, &network, now_ms);
        }
    }

    /// NETWORK sources settle first: their output is unconditionally true
    /// and is pushed into every direct successor.
    fn drive_sources(&mut self, program: &Program, network: &str) {
        for node in program.nodes_in(network) {
            if node.kind != NodeKind::Network {
                continue;
            }
            self.outputs[node.id] = true;
            for link in program.links_from(node.id) {
                self.inputs[link.to] = true;
            }
        }
    }

    /// Iterative signal propagation to a fixpoint.
    ///
    /// Inputs accumulate by OR, which is what makes parallel branches work:
    /// a node with several predecessors conducts when any of them does.
    /// Instruction nodes hold their input as a placeholder and do not
    /// propagate; their real output is produced at commit time.
    fn propagate(
        &mut self,
        program: &Program,
        memory: &MemoryBank,
        timers: &TimerBank,
        counters: &CounterBank,
        network: &str,
    ) {
        for _pass in 0..MAX_PROPAGATION_PASSES {
            let mut changed = false;
            for node in program.nodes_in(network) {
                if node.kind == NodeKind::Network {
                    continue;
                }
                let out = if node.kind == NodeKind::Instruction {
                    self.inputs[node.id]
                } else {
                    self.evaluate(node, memory, timers, counters)
                };
                if out != self.outputs[node.id] {
                    changed = true;
                    self.outputs[node.id] = out;
                }
                if node.kind != NodeKind::Instruction {
                    for link in program.links_from(node.id) {
                        self.inputs[link.to] |= out;
                    }
                }
            }
            if !changed {
                return;
            }
        }
        my_warn!(
            "[SCAN] network {} did not settle within {} passes",
            network,
            MAX_PROPAGATION_PASSES
        );
    }

    /// Computes one node's output from its accumulated input and the value
    /// of its address. Edge detectors refresh their reference sample on
    /// every pass, which is harmless while the rung is acyclic.
    fn evaluate(
        &mut self,
        node: &Node,
        memory: &MemoryBank,
        timers: &TimerBank,
        counters: &CounterBank,
    ) -> bool {
        let signal = self.inputs[node.id];
        let value = contact_value(node, memory, timers, counters);
        match node.kind {
            NodeKind::Open => signal && value,
            NodeKind::Close | NodeKind::Invert => signal && !value,
            NodeKind::Rising => {
                let fired = signal && value && !self.prev_contact[node.id];
                self.prev_contact[node.id] = value;
                fired
            }
            NodeKind::Falling => {
                let fired = signal && !value && self.prev_contact[node.id];
                self.prev_contact[node.id] = value;
                fired
            }
            // Coils pass their condition through; effects happen at commit.
            NodeKind::Coil | NodeKind::Set | NodeKind::Reset => signal,
            NodeKind::Network | NodeKind::Instruction => signal,
        }
    }

    /// Applies the network's effects in document order.
    fn commit(
        &mut self,
        program: &Program,
        memory: &mut MemoryBank,
        timers: &mut TimerBank,
        counters: &mut CounterBank,
        network: &str,
        now_ms: u64,
    ) {
        for node in program.nodes_in(network) {
            let signal = self.outputs[node.id];
            match node.kind {
                NodeKind::Coil => write_target(node, signal, memory),
                NodeKind::Set => {
                    if signal {
                        write_target(node, true, memory);
                    }
                }
                NodeKind::Reset => {
                    if signal {
                        reset_target(node, memory, timers, counters);
                    }
                }
                NodeKind::Instruction => {
                    instr::execute(self, node, memory, timers, counters, now_ms);
                }
                _ => {}
            }
        }
    }
}

/// The boolean value of a node's address: memory bit, `word != 0` for plain
/// D words, or the output of the named timer/counter instance. Nodes with
/// no usable address read as false.
fn contact_value(
    node: &Node,
    memory: &MemoryBank,
    timers: &TimerBank,
    counters: &CounterBank,
) -> bool {
    match &node.addr {
        Some(Address::Timer(name)) => timers.get(name).map(|t| t.q).unwrap_or(false),
        Some(Address::Counter(name)) => counters.get(name).map(|c| c.q).unwrap_or(false),
        Some(addr) => memory.read_bit(addr),
        None => false,
    }
}

/// COIL and SET commits: write the signal to the node's address.
fn write_target(node: &Node, value: bool, memory: &mut MemoryBank) {
    match &node.addr {
        Some(addr) if addr.is_writable() => memory.write_bit(addr, value),
        Some(addr) => my_warn!("[SCAN] node {}: cannot write to {}", node.id, addr),
        None => {}
    }
}

/// RESET commits clear memory targets, and additionally return timer and
/// counter instances to their idle state.
fn reset_target(
    node: &Node,
    memory: &mut MemoryBank,
    timers: &mut TimerBank,
    counters: &mut CounterBank,
) {
    match &node.addr {
        Some(Address::Timer(name)) => timers.reset_instance(name),
        Some(Address::Counter(name)) => counters.reset_instance(name),
        Some(addr) => memory.write_bit(addr, false),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{LinkDoc, NodeDoc, ProgramDoc};
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    struct Fixture {
        program: Program,
        memory: MemoryBank,
        timers: TimerBank,
        counters: CounterBank,
        engine: ScanEngine,
    }

    impl Fixture {
        fn new(nodes: Vec<NodeDoc>, links: Vec<(i64, i64)>) -> Self {
            let doc = ProgramDoc {
                nodes,
                links: links
                    .into_iter()
                    .map(|(from, to)| LinkDoc {
                        from,
                        to,
                        ..Default::default()
                    })
                    .collect(),
            };
            Fixture {
                program: Program::load(&doc).unwrap(),
                memory: MemoryBank::new(),
                timers: TimerBank::new(),
                counters: CounterBank::new(),
                engine: ScanEngine::new(),
            }
        }

        fn scan(&mut self, now_ms: u64) {
            self.engine.run_cycle(
                &self.program,
                &mut self.memory,
                &mut self.timers,
                &mut self.counters,
                now_ms,
            );
        }

        fn set(&mut self, addr: &str, value: bool) {
            self.memory.write_bit(&Address::parse(addr).unwrap(), value);
        }

        fn bit(&self, addr: &str) -> bool {
            self.memory.read_bit(&Address::parse(addr).unwrap())
        }
    }

    fn doc_node(id: i64, node_type: &str, addr: &str) -> NodeDoc {
        NodeDoc {
            id,
            node_type: node_type.to_string(),
            addr: addr.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_contact_drives_coil() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "OPEN", "I0"),
                doc_node(2, "COIL", "Q0"),
            ],
            vec![(0, 1), (1, 2)],
        );
        f.scan(0);
        assert!(!f.bit("Q0"));
        f.set("I0", true);
        f.scan(10);
        assert!(f.bit("Q0"));
        f.set("I0", false);
        f.scan(20);
        assert!(!f.bit("Q0"));
    }

    #[test]
    fn test_closed_contact_inverts() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "CLOSE", "I0"),
                doc_node(2, "COIL", "Q0"),
            ],
            vec![(0, 1), (1, 2)],
        );
        f.scan(0);
        assert!(f.bit("Q0"));
        f.set("I0", true);
        f.scan(10);
        assert!(!f.bit("Q0"));
    }

    #[test]
    fn test_network_sources_always_conduct() {
        let mut f = Fixture::new(
            vec![doc_node(0, "NETWORK", "N0"), doc_node(1, "COIL", "Q0")],
            vec![(0, 1)],
        );
        f.scan(0);
        assert!(f.engine.output(0));
        assert!(f.bit("Q0"));
    }

    #[test]
    fn test_rising_edge_fires_once() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "RISING", "I0"),
                doc_node(2, "SET", "M0"),
            ],
            vec![(0, 1), (1, 2)],
        );
        f.set("I0", true);
        f.scan(0);
        assert!(f.bit("M0"));
        // The edge is consumed: clear the latch by hand and re-scan.
        f.set("M0", false);
        f.scan(10);
        assert!(!f.bit("M0"));
        // A new rising edge fires again.
        f.set("I0", false);
        f.scan(20);
        f.set("I0", true);
        f.scan(30);
        assert!(f.bit("M0"));
    }

    #[test]
    fn test_falling_edge_fires_on_drop() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "FALLING", "I0"),
                doc_node(2, "SET", "M0"),
            ],
            vec![(0, 1), (1, 2)],
        );
        f.set("I0", true);
        f.scan(0);
        assert!(!f.bit("M0"));
        f.set("I0", false);
        f.scan(10);
        assert!(f.bit("M0"));
    }

    #[test]
    fn test_parallel_branches_are_ored() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "OPEN", "M0"),
                doc_node(2, "OPEN", "M1"),
                doc_node(3, "COIL", "Q2"),
            ],
            vec![(0, 1), (0, 2), (1, 3), (2, 3)],
        );
        for (m0, m1) in [(false, false), (true, false), (false, true), (true, true)] {
            f.set("M0", m0);
            f.set("M1", m1);
            f.scan(0);
            assert_eq!(f.bit("Q2"), m0 || m1, "M0={} M1={}", m0, m1);
        }
    }

    #[test]
    fn test_set_and_reset_latch() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "OPEN", "I0"),
                doc_node(2, "SET", "M0"),
                doc_node(3, "OPEN", "I1"),
                doc_node(4, "RESET", "M0"),
            ],
            vec![(0, 1), (1, 2), (0, 3), (3, 4)],
        );
        f.set("I0", true);
        f.scan(0);
        assert!(f.bit("M0"));
        // SET does not fall back when its input drops.
        f.set("I0", false);
        f.scan(10);
        assert!(f.bit("M0"));
        // RESET clears, and also holds clear.
        f.set("I1", true);
        f.scan(20);
        assert!(!f.bit("M0"));
        f.set("I1", false);
        f.scan(30);
        assert!(!f.bit("M0"));
    }

    #[test]
    fn test_dotted_coil_sets_word_bit() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "OPEN", "I0"),
                doc_node(2, "COIL", "D5.3"),
            ],
            vec![(0, 1), (1, 2)],
        );
        f.set("I0", true);
        f.scan(0);
        assert_eq!(f.memory.read_word(&Address::parse("D5").unwrap()), 8);
        f.set("I0", false);
        f.scan(10);
        assert_eq!(f.memory.read_word(&Address::parse("D5").unwrap()), 0);
    }

    #[test]
    fn test_networks_commit_in_order() {
        // N0 writes M0; N1 copies M0 into Q0. One scan must suffice.
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "0"),
                doc_node(1, "OPEN", "I0"),
                doc_node(2, "COIL", "M0"),
                doc_node(3, "NETWORK", "1"),
                doc_node(4, "OPEN", "M0"),
                doc_node(5, "COIL", "Q0"),
            ],
            vec![(0, 1), (1, 2), (3, 4), (4, 5)],
        );
        f.set("I0", true);
        f.scan(0);
        assert!(f.bit("M0"));
        assert!(f.bit("Q0"));
    }

    #[test]
    fn test_sourceless_network_stays_dead() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "OPEN", "I0"),
                // Explicitly grouped away from any source.
                NodeDoc {
                    id: 2,
                    network_id: "N9".to_string(),
                    node_type: "COIL".to_string(),
                    addr: "Q0".to_string(),
                    ..Default::default()
                },
            ],
            vec![(0, 1)],
        );
        f.set("I0", true);
        f.scan(0);
        assert!(!f.engine.input(2));
        assert!(!f.bit("Q0"));
    }

    #[test]
    fn test_reset_coil_clears_timer_instance() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "OPEN", "I0"),
                doc_node(2, "RESET", "T0"),
            ],
            vec![(0, 1), (1, 2)],
        );
        {
            let t = f
                .timers
                .get_or_create("T0", crate::timers::TimerMode::OnDelay, 100)
                .unwrap();
            t.enabled = true;
            t.q = true;
            t.start_time = 5;
        }
        f.set("I0", true);
        f.scan(0);
        let t = f.timers.get("T0").unwrap();
        assert!(!t.enabled && !t.q);
        assert_eq!(t.start_time, 0);
    }

    #[test]
    fn test_falling_edge_after_scratch_reset_is_silent() {
        let mut f = Fixture::new(
            vec![
                doc_node(0, "NETWORK", "N0"),
                doc_node(1, "FALLING", "I0"),
                doc_node(2, "SET", "M0"),
            ],
            vec![(0, 1), (1, 2)],
        );
        f.set("I0", true);
        f.scan(0);
        f.engine.reset();
        // Without the stale sample the drop no longer registers as an edge.
        f.set("I0", false);
        f.scan(10);
        assert!(!f.bit("M0"));
    }
}
