// crates/ladder-rs/src/runtime/mod.rs
//! The lifecycle controller and the surface the transport layer talks to.
//!
//! Everything here runs on one cooperative thread: transport handlers push
//! commands between scans, a periodic tick drives the scan while running,
//! and observers receive throttled snapshots. Nothing blocks and nothing
//! locks.

mod snapshot;

pub use snapshot::{CounterStatus, Snapshot, TimerStatus};

use crate::counters::CounterBank;
use crate::hal::{LadderError, RetentiveStorage};
use crate::log::{my_error, my_info, my_warn};
use crate::memory::{Address, MemoryBank};
use crate::program::{Program, ProgramDoc};
use crate::scan::ScanEngine;
use crate::timers::TimerBank;
use crate::types::{DWORD, SCAN_INTERVAL_MS, SNAPSHOT_MIN_INTERVAL_MS};
use alloc::string::{String, ToString};

/// The lifecycle states of the controller. Only Run and Stop survive a
/// reboot; Error and Reset are transient by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlcState {
    #[default]
    Stop,
    Run,
    Error,
    Reset,
}

impl PlcState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlcState::Stop => "STOP",
            PlcState::Run => "RUN",
            PlcState::Error => "ERROR",
            PlcState::Reset => "RESET",
        }
    }

    /// The integer form written to retentive storage.
    pub fn to_persisted(self) -> u8 {
        match self {
            PlcState::Run => 1,
            _ => 0,
        }
    }

    /// Decodes the stored integer; anything unexpected reads as Stop.
    pub fn from_persisted(raw: u8) -> PlcState {
        if raw == 1 { PlcState::Run } else { PlcState::Stop }
    }
}

/// The core runtime: memory, program, timer/counter banks, the scan engine
/// and the lifecycle state machine, with optional retentive storage behind
/// it.
pub struct PlcRuntime<'a> {
    memory: MemoryBank,
    program: Program,
    timers: TimerBank,
    counters: CounterBank,
    engine: ScanEngine,
    state: PlcState,
    error: Option<String>,
    storage: Option<&'a mut dyn RetentiveStorage>,
    last_scan_ms: u64,
    last_snapshot_ms: u64,
    snapshot_forced: bool,
}

impl<'a> PlcRuntime<'a> {
    /// Creates a stopped runtime with an empty program and zeroed memory.
    /// Call [`boot`](Self::boot) afterwards to restore persisted state.
    pub fn new(storage: Option<&'a mut dyn RetentiveStorage>) -> Self {
        Self {
            memory: MemoryBank::new(),
            program: Program::new(),
            timers: TimerBank::new(),
            counters: CounterBank::new(),
            engine: ScanEngine::new(),
            state: PlcState::Stop,
            error: None,
            storage,
            last_scan_ms: 0,
            last_snapshot_ms: 0,
            snapshot_forced: true,
        }
    }

    /// Boot sequence: zero memory, restore the persisted status (default
    /// Stop), reload the stored program if one exists, then apply the
    /// status without writing it back.
    pub fn boot(&mut self) {
        self.memory.clear_all();

        let mut status = PlcState::Stop;
        let mut stored_doc: Option<ProgramDoc> = None;
        let mut storage_fault: Option<&'static str> = None;

        if let Some(storage) = self.storage.as_deref_mut() {
            match storage.load_status() {
                Ok(Some(raw)) => status = PlcState::from_persisted(raw),
                Ok(None) => {}
                Err(e) => {
                    my_error!("[RT] persisted status unreadable: {}", e);
                    storage_fault = Some("persisted status unreadable");
                }
            }
            if storage_fault.is_none() {
                match storage.load_program() {
                    Ok(doc) => stored_doc = doc,
                    Err(e) => {
                        my_error!("[RT] stored program unreadable: {}", e);
                        storage_fault = Some("stored program unreadable");
                    }
                }
            }
        }

        if let Some(message) = storage_fault {
            self.fault(message);
            return;
        }

        if let Some(doc) = stored_doc {
            match Program::load(&doc) {
                Ok(program) => self.install_program(program),
                Err(e) => {
                    my_error!("[RT] stored program rejected: {}", e);
                    status = PlcState::Stop;
                }
            }
        }

        self.state = status;
        self.snapshot_forced = true;
        my_info!("[RT] boot complete, status {}", self.state.as_str());
    }

    pub fn state(&self) -> PlcState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn memory(&self) -> &MemoryBank {
        &self.memory
    }

    pub fn timers(&self) -> &TimerBank {
        &self.timers
    }

    pub fn counters(&self) -> &CounterBank {
        &self.counters
    }

    /// The current program in document form, for the transport's
    /// program-download request.
    pub fn program_document(&self) -> ProgramDoc {
        self.program.document()
    }

    /// Replaces the program. The document is validated and loaded whole
    /// before anything is committed; a rejected document leaves the previous
    /// program untouched and parks the controller in Stop.
    pub fn load_program(&mut self, doc: &ProgramDoc) -> Result<(), LadderError> {
        let program = match Program::load(doc) {
            Ok(program) => program,
            Err(e) => {
                my_error!("[RT] program rejected: {}", e);
                self.state = PlcState::Stop;
                self.snapshot_forced = true;
                return Err(e);
            }
        };
        self.install_program(program);

        if let Some(storage) = self.storage.as_deref_mut() {
            if let Err(e) = storage.save_program(doc) {
                my_error!("[RT] failed to store program: {}", e);
                self.fault("program storage failed");
                return Err(e);
            }
        }
        self.snapshot_forced = true;
        Ok(())
    }

    /// The RUN command. Memory is left as it is; scanning starts on the
    /// next tick. Persisted.
    pub fn run(&mut self) {
        my_info!("[RT] -> RUN");
        self.state = PlcState::Run;
        self.error = None;
        self.persist_status();
        self.snapshot_forced = true;
    }

    /// The STOP command. Outputs and markers are dropped, timers and
    /// counters go idle but keep their presets. Persisted.
    pub fn stop(&mut self) {
        my_info!("[RT] -> STOP");
        self.state = PlcState::Stop;
        self.error = None;
        self.memory.clear_outputs();
        self.timers.stop_all();
        self.counters.stop_all();
        self.persist_status();
        self.snapshot_forced = true;
    }

    /// The RESET command. All memory regions are zeroed and every timer and
    /// counter instance is removed. Not persisted.
    pub fn reset(&mut self) {
        my_info!("[RT] -> RESET");
        self.state = PlcState::Reset;
        self.error = None;
        self.memory.clear_all();
        self.timers.clear();
        self.counters.clear();
        self.engine.reset();
        self.snapshot_forced = true;
    }

    /// Forces one address from the transport layer. Bits take `value != 0`,
    /// plain D words take the value itself. Accepted in every state; while
    /// running, the next scan may overwrite it.
    pub fn force(&mut self, addr: &str, value: DWORD) {
        match Address::parse(addr) {
            Ok(target) if target.is_writable() => match target {
                Address::D(_) => self.memory.write_word(&target, value),
                _ => self.memory.write_bit(&target, value != 0),
            },
            Ok(target) => my_warn!("[RT] cannot force {}", target),
            Err(e) => my_warn!("[RT] force of {:?} ignored: {}", addr, e),
        }
    }

    /// The periodic driver, called from the main loop with a monotonic
    /// millisecond clock. Runs one scan when due; returns a snapshot when
    /// the publish interval elapsed or a state transition forced one. A
    /// late tick runs a single scan; there is no catch-up.
    pub fn tick(&mut self, now_ms: u64) -> Option<Snapshot> {
        if self.state == PlcState::Run
            && now_ms.saturating_sub(self.last_scan_ms) >= SCAN_INTERVAL_MS
        {
            self.engine.run_cycle(
                &self.program,
                &mut self.memory,
                &mut self.timers,
                &mut self.counters,
                now_ms,
            );
            self.last_scan_ms = now_ms;
        }

        if self.snapshot_forced
            || now_ms.saturating_sub(self.last_snapshot_ms) >= SNAPSHOT_MIN_INTERVAL_MS
        {
            return Some(self.snapshot(now_ms));
        }
        None
    }

    /// Produces a snapshot on demand (new observers see the state at once)
    /// and restarts the publish throttle.
    pub fn snapshot(&mut self, now_ms: u64) -> Snapshot {
        self.last_snapshot_ms = now_ms;
        self.snapshot_forced = false;
        Snapshot::capture(
            self.state,
            self.error.clone(),
            &self.memory,
            &self.timers,
            &self.counters,
            now_ms,
        )
    }

    fn install_program(&mut self, program: Program) {
        self.program = program;
        self.engine.reset();
        self.timers.sync(&self.program);
        self.counters.sync(&self.program);
    }

    fn persist_status(&mut self) {
        let raw = self.state.to_persisted();
        if let Some(storage) = self.storage.as_deref_mut() {
            if let Err(e) = storage.save_status(raw) {
                my_error!("[RT] failed to persist status: {}", e);
                self.fault("status persistence failed");
            }
        }
    }

    fn fault(&mut self, message: &str) {
        self.state = PlcState::Error;
        self.error = Some(message.to_string());
        self.snapshot_forced = true;
    }
}
