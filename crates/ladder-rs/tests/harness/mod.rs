// crates/ladder-rs/tests/harness/mod.rs
//! Shared helpers for the scenario tests: a small program builder and a
//! "plant" that drives the runtime on a simulated millisecond clock.

use ladder_rs::memory::Address;
use ladder_rs::program::{LinkDoc, NodeDoc, ProgramDoc};
use ladder_rs::runtime::PlcRuntime;
use ladder_rs::types::SCAN_INTERVAL_MS;

/// Builds program documents rung by rung.
pub struct ProgramBuilder {
    doc: ProgramDoc,
    next_id: i64,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            doc: ProgramDoc::default(),
            next_id: 0,
        }
    }

    fn push(&mut self, node_type: &str, addr: &str, instruction: &str, args: &str) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.doc.nodes.push(NodeDoc {
            id,
            node_type: node_type.to_string(),
            addr: addr.to_string(),
            instruction: instruction.to_string(),
            args: args.to_string(),
            ..Default::default()
        });
        id
    }

    /// Starts a rung: a NETWORK source labelled `label`.
    pub fn network(&mut self, label: &str) -> i64 {
        self.push("NETWORK", label, "", "")
    }

    /// Appends a contact or coil after `prev` and wires them up.
    pub fn node(&mut self, node_type: &str, addr: &str, prev: i64) -> i64 {
        let id = self.push(node_type, addr, "", "");
        self.link(prev, id);
        id
    }

    /// Appends an instruction box after `prev`.
    pub fn instruction(&mut self, opcode: &str, args: &str, prev: i64) -> i64 {
        let id = self.push("INSTRUCTION", "", opcode, args);
        self.link(prev, id);
        id
    }

    pub fn link(&mut self, from: i64, to: i64) {
        self.doc.links.push(LinkDoc {
            from,
            to,
            ..Default::default()
        });
    }

    pub fn build(&self) -> ProgramDoc {
        self.doc.clone()
    }
}

/// A running controller on simulated time. Every `step` advances one scan
/// interval and ticks the runtime once.
pub struct Plant {
    pub runtime: PlcRuntime<'static>,
    pub now_ms: u64,
}

impl Plant {
    /// Loads the program and switches to RUN, ready to step.
    pub fn start(doc: &ProgramDoc) -> Self {
        init_logging();
        let mut runtime = PlcRuntime::new(None);
        runtime.boot();
        runtime.load_program(doc).expect("program must load");
        runtime.run();
        Self { runtime, now_ms: 0 }
    }

    /// Advances one scan interval.
    pub fn step(&mut self) {
        self.now_ms += SCAN_INTERVAL_MS;
        self.runtime.tick(self.now_ms);
    }

    /// Advances simulated time by `ms`, scanning along the way.
    pub fn run_for(&mut self, ms: u64) {
        for _ in 0..ms.div_ceil(SCAN_INTERVAL_MS) {
            self.step();
        }
    }

    pub fn set(&mut self, addr: &str, on: bool) {
        self.runtime.force(addr, on as u32);
    }

    pub fn bit(&self, addr: &str) -> bool {
        self.runtime.memory().read_bit(&Address::parse(addr).unwrap())
    }

    pub fn word(&self, addr: &str) -> u32 {
        self.runtime.memory().read_word(&Address::parse(addr).unwrap())
    }
}

fn init_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
