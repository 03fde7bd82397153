// crates/ladder-rs/src/counters.rs

use crate::log::{my_debug, my_warn};
use crate::program::{NodeKind, Program};
use crate::scan::instr;
use crate::types::MAX_COUNTERS;
use alloc::string::String;
use alloc::vec::Vec;

/// One live counter instance.
///
/// Up-counters start at zero and latch `q` at `current >= preset`;
/// down-counters start at `preset` and latch `q` at `current <= 0`.
/// `q` stays latched until an explicit RESET.
#[derive(Debug, Clone)]
pub struct Counter {
    pub name: String,
    pub preset: i32,
    pub current: i32,
    pub q: bool,
}

/// The bank of live counter instances.
///
/// Lookup is case-insensitive, matching the timer bank.
#[derive(Debug, Default)]
pub struct CounterBank {
    counters: Vec<Counter>,
}

impl CounterBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Counter> {
        self.counters.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Counter> {
        self.counters
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Counter> {
        self.counters
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Finds a counter, creating it with the given start value when the bank
    /// has room (up-counters pass 0, down-counters pass the preset).
    /// Returns `None` when the bank is full.
    pub fn get_or_create(
        &mut self,
        name: &str,
        preset: i32,
        start_at: i32,
    ) -> Option<&mut Counter> {
        if let Some(pos) = self
            .counters
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
        {
            return self.counters.get_mut(pos);
        }
        if self.counters.len() >= MAX_COUNTERS {
            my_warn!("[CNT] bank full ({} instances), {} not created", MAX_COUNTERS, name);
            return None;
        }
        my_debug!("[CNT] created {} (preset {}, start {})", name, preset, start_at);
        self.counters.push(Counter {
            name: name.to_ascii_uppercase(),
            preset,
            current: start_at,
            q: false,
        });
        self.counters.last_mut()
    }

    /// Aligns the bank with a freshly deployed program, as the timer bank
    /// does: presets updated in place, new names created idle.
    pub fn sync(&mut self, program: &Program) {
        for node in program.nodes() {
            if node.kind != NodeKind::Instruction {
                continue;
            }
            let Some(counts_down) = instr::counter_direction(&node.instruction) else {
                continue;
            };
            let Some((name, preset)) = instr::name_and_count(&node.args) else {
                continue;
            };
            match self.get_mut(name) {
                Some(counter) => counter.preset = preset,
                None => {
                    let start_at = if counts_down { preset } else { 0 };
                    self.get_or_create(name, preset, start_at);
                }
            }
        }
    }

    /// The STOP transition: zero the counts, keep the instances and presets.
    pub fn stop_all(&mut self) {
        for counter in &mut self.counters {
            counter.current = 0;
            counter.q = false;
        }
    }

    /// The RESET transition: drop every instance.
    pub fn clear(&mut self) {
        self.counters.clear();
    }

    /// A RESET coil addressed to `C<name>`: zero the count and output.
    pub fn reset_instance(&mut self, name: &str) {
        if let Some(counter) = self.get_mut(name) {
            counter.current = 0;
            counter.q = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut bank = CounterBank::new();
        bank.get_or_create("c1", 3, 0).unwrap();
        assert!(bank.get("C1").is_some());
        assert_eq!(bank.len(), 1);
        bank.get_or_create("C1", 9, 9).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.get("C1").unwrap().preset, 3);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut bank = CounterBank::new();
        for i in 0..MAX_COUNTERS {
            let name = alloc::format!("C{}", i);
            assert!(bank.get_or_create(&name, 1, 0).is_some());
        }
        assert!(bank.get_or_create("CX", 1, 0).is_none());
    }

    #[test]
    fn test_reset_instance_zeroes_count_and_output() {
        let mut bank = CounterBank::new();
        {
            let c = bank.get_or_create("C0", 3, 0).unwrap();
            c.current = 3;
            c.q = true;
        }
        bank.reset_instance("c0");
        let c = bank.get("C0").unwrap();
        assert_eq!(c.current, 0);
        assert!(!c.q);
        assert_eq!(c.preset, 3);
    }

    #[test]
    fn test_stop_all_zeroes_counts() {
        let mut bank = CounterBank::new();
        {
            // A down-counter parked at its preset.
            let c = bank.get_or_create("C0", 5, 5).unwrap();
            assert_eq!(c.current, 5);
        }
        bank.stop_all();
        assert_eq!(bank.get("C0").unwrap().current, 0);
    }
}
