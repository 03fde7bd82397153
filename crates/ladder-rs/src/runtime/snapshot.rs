// crates/ladder-rs/src/runtime/snapshot.rs

use super::PlcState;
use crate::counters::CounterBank;
use crate::memory::MemoryBank;
use crate::timers::{TimerBank, TimerMode};
use crate::types::DWORD;
use alloc::string::String;
use alloc::vec::Vec;

/// Observer view of one timer instance.
///
/// `current` is what a front panel wants to display: elapsed time (capped at
/// the preset) for an on-delay timer, time left for the off-delay and pulse
/// modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerStatus {
    pub name: String,
    pub q: bool,
    pub current: u64,
    pub preset: u64,
    pub enabled: bool,
}

/// Observer view of one counter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterStatus {
    pub name: String,
    pub q: bool,
    pub current: i32,
    pub preset: i32,
}

/// A point-in-time summary for external observers: lifecycle status, the
/// set bits and non-zero words of every memory region, and every live
/// timer/counter instance. Zero entries are omitted to keep the published
/// form small.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: PlcState,
    pub error: Option<String>,
    pub m: Vec<usize>,
    pub i: Vec<usize>,
    pub q: Vec<usize>,
    pub d: Vec<(usize, DWORD)>,
    pub timers: Vec<TimerStatus>,
    pub counters: Vec<CounterStatus>,
}

impl Snapshot {
    pub(crate) fn capture(
        status: PlcState,
        error: Option<String>,
        memory: &MemoryBank,
        timers: &TimerBank,
        counters: &CounterBank,
        now_ms: u64,
    ) -> Snapshot {
        Snapshot {
            status,
            error,
            m: memory.set_m_bits().collect(),
            i: memory.set_i_bits().collect(),
            q: memory.set_q_bits().collect(),
            d: memory.nonzero_d_words().collect(),
            timers: timers
                .iter()
                .map(|t| TimerStatus {
                    name: t.name.clone(),
                    q: t.q,
                    current: match t.mode {
                        TimerMode::OnDelay => {
                            if t.enabled {
                                now_ms.saturating_sub(t.start_time).min(t.preset_ms)
                            } else {
                                0
                            }
                        }
                        TimerMode::OffDelay | TimerMode::Pulse => t.remaining,
                    },
                    preset: t.preset_ms,
                    enabled: t.enabled,
                })
                .collect(),
            counters: counters
                .iter()
                .map(|c| CounterStatus {
                    name: c.name.clone(),
                    q: c.q,
                    current: c.current,
                    preset: c.preset,
                })
                .collect(),
        }
    }
}
