// crates/ladder-rs/src/timers.rs

use crate::log::{my_debug, my_warn};
use crate::program::{NodeKind, Program};
use crate::scan::instr;
use crate::types::MAX_TIMERS;
use alloc::string::String;
use alloc::vec::Vec;

/// The three timer behaviors of the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// TON: output rises `preset` ms after the input rises.
    OnDelay = 1,
    /// TOFF: output falls `preset` ms after the input falls.
    OffDelay = 2,
    /// TP: fixed-width pulse started by a rising input edge.
    Pulse = 3,
}

/// One live timer instance.
///
/// `start_time` is the millisecond timestamp at which the current timing
/// interval began; zero means not timing. `remaining` is maintained for
/// observers of off-delay and pulse timers.
#[derive(Debug, Clone)]
pub struct Timer {
    pub name: String,
    pub mode: TimerMode,
    pub preset_ms: u64,
    pub start_time: u64,
    pub enabled: bool,
    pub q: bool,
    pub remaining: u64,
}

impl Timer {
    fn new(name: String, mode: TimerMode, preset_ms: u64) -> Self {
        Self {
            name,
            mode,
            preset_ms,
            start_time: 0,
            enabled: false,
            q: false,
            remaining: 0,
        }
    }
}

/// The bank of live timer instances, keyed case-insensitively by name.
///
/// Instances appear lazily when a timer instruction first executes, and are
/// pre-created disabled when a program deploy names them.
#[derive(Debug, Default)]
pub struct TimerBank {
    timers: Vec<Timer>,
}

impl TimerBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timer> {
        self.timers.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Timer> {
        self.timers
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Finds a timer, creating it when the bank has room. The mode and
    /// preset stick at creation; a later lookup under a different mode does
    /// not re-mode the instance. Returns `None` when the bank is full.
    pub fn get_or_create(
        &mut self,
        name: &str,
        mode: TimerMode,
        preset_ms: u64,
    ) -> Option<&mut Timer> {
        if let Some(pos) = self
            .timers
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
        {
            return self.timers.get_mut(pos);
        }
        if self.timers.len() >= MAX_TIMERS {
            my_warn!("[TMR] bank full ({} instances), {} not created", MAX_TIMERS, name);
            return None;
        }
        my_debug!("[TMR] created {} (mode {:?}, preset {} ms)", name, mode, preset_ms);
        self.timers
            .push(Timer::new(name.to_ascii_uppercase(), mode, preset_ms));
        self.timers.last_mut()
    }

    /// Aligns the bank with a freshly deployed program: presets of existing
    /// instances are updated in place (running state preserved), instances
    /// for new names are created disabled.
    pub fn sync(&mut self, program: &Program) {
        for node in program.nodes() {
            if node.kind != NodeKind::Instruction {
                continue;
            }
            let Some(mode) = instr::timer_mode(&node.instruction) else {
                continue;
            };
            let Some((name, preset_ms)) = instr::name_and_preset(&node.args) else {
                continue;
            };
            match self.get_mut(name) {
                Some(timer) => timer.preset_ms = preset_ms,
                None => {
                    self.get_or_create(name, mode, preset_ms);
                }
            }
        }
    }

    /// The STOP transition: stop timing, keep the instances and presets.
    pub fn stop_all(&mut self) {
        for timer in &mut self.timers {
            timer.enabled = false;
            timer.q = false;
            timer.start_time = 0;
            timer.remaining = 0;
        }
    }

    /// The RESET transition: drop every instance.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// A RESET coil addressed to `T<name>`: return the instance to its
    /// created state without removing it.
    pub fn reset_instance(&mut self, name: &str) {
        if let Some(timer) = self.get_mut(name) {
            timer.enabled = false;
            timer.q = false;
            timer.start_time = 0;
            timer.remaining = 0;
        }
    }
}
