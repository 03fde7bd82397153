// crates/ladder-rs/src/scan/instr.rs
//! Boxed-instruction execution.
//!
//! Instructions run at commit time with the rung condition the propagation
//! phase left in the node's output slot. Timers and counters fold their `q`
//! back into that slot; comparisons overwrite it with their verdict while
//! the rung conducts; word operations leave it untouched.
//!
//! Arguments are colon-delimited. Word operands may be memory references or
//! plain decimal literals.

use super::ScanEngine;
use crate::counters::CounterBank;
use crate::log::{my_error, my_warn};
use crate::memory::{Address, MemoryBank};
use crate::program::Node;
use crate::timers::{TimerBank, TimerMode};
use crate::types::DWORD;

/// Dispatches one instruction node.
pub(crate) fn execute(
    engine: &mut ScanEngine,
    node: &Node,
    memory: &mut MemoryBank,
    timers: &mut TimerBank,
    counters: &mut CounterBank,
    now_ms: u64,
) {
    let opcode = node.instruction.trim().to_ascii_uppercase();
    match opcode.as_str() {
        "TON" => run_timer(engine, node, timers, now_ms, TimerMode::OnDelay),
        "TOFF" => run_timer(engine, node, timers, now_ms, TimerMode::OffDelay),
        "TP" => run_timer(engine, node, timers, now_ms, TimerMode::Pulse),
        "CTU" => run_counter(engine, node, counters, false),
        "CTD" => run_counter(engine, node, counters, true),
        "ADD" | "SUB" | "MUL" | "DIV" | "MOD" | "AND" | "OR" | "XOR" => {
            binary_word_op(engine, node, memory, &opcode)
        }
        "NOT" | "MOVE" | "SHL" | "SHR" | "ROL" | "ROR" => {
            unary_word_op(engine, node, memory, &opcode)
        }
        "EQ" | "NE" | "GT" | "GE" | "LT" | "LE" => compare(engine, node, memory, &opcode),
        other => my_warn!("[SCAN] node {}: unknown opcode {:?}", node.id, other),
    }
}

/// The timer mode an opcode names, for the deploy-time bank sync.
pub(crate) fn timer_mode(opcode: &str) -> Option<TimerMode> {
    match opcode.trim().to_ascii_uppercase().as_str() {
        "TON" => Some(TimerMode::OnDelay),
        "TOFF" => Some(TimerMode::OffDelay),
        "TP" => Some(TimerMode::Pulse),
        _ => None,
    }
}

/// Whether an opcode names a down-counter, for the deploy-time bank sync.
pub(crate) fn counter_direction(opcode: &str) -> Option<bool> {
    match opcode.trim().to_ascii_uppercase().as_str() {
        "CTU" => Some(false),
        "CTD" => Some(true),
        _ => None,
    }
}

/// Splits `NAME:MILLIS` timer arguments.
pub(crate) fn name_and_preset(args: &str) -> Option<(&str, u64)> {
    let (name, preset) = args.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, preset.trim().parse().ok()?))
}

/// Splits `NAME:PRESET` counter arguments.
pub(crate) fn name_and_count(args: &str) -> Option<(&str, i32)> {
    let (name, preset) = args.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, preset.trim().parse().ok()?))
}

fn run_timer(
    engine: &mut ScanEngine,
    node: &Node,
    timers: &mut TimerBank,
    now_ms: u64,
    mode: TimerMode,
) {
    let Some((name, preset_ms)) = name_and_preset(&node.args) else {
        my_error!("[SCAN] node {}: malformed timer args {:?}", node.id, node.args);
        engine.outputs[node.id] = false;
        return;
    };
    let signal = engine.outputs[node.id];
    let was_on = engine.prev_inputs[node.id];
    let Some(timer) = timers.get_or_create(name, mode, preset_ms) else {
        engine.outputs[node.id] = false;
        return;
    };

    match mode {
        TimerMode::OnDelay => {
            if signal && !timer.enabled {
                timer.start_time = now_ms;
                timer.enabled = true;
                timer.q = false;
            }
            if !signal {
                timer.enabled = false;
                timer.q = false;
                timer.start_time = 0;
            }
            if timer.enabled && now_ms.saturating_sub(timer.start_time) >= timer.preset_ms {
                timer.q = true;
            }
        }
        TimerMode::OffDelay => {
            if signal {
                timer.q = true;
                timer.enabled = false;
                timer.start_time = 0;
                timer.remaining = timer.preset_ms;
            } else if was_on && !timer.enabled {
                // Input just fell: the hold-off interval starts now.
                timer.start_time = now_ms;
                timer.enabled = true;
                timer.q = true;
            } else if timer.enabled {
                let elapsed = now_ms.saturating_sub(timer.start_time);
                if elapsed >= timer.preset_ms {
                    timer.q = false;
                    timer.enabled = false;
                    timer.remaining = 0;
                } else {
                    timer.q = true;
                    timer.remaining = timer.preset_ms - elapsed;
                }
            } else {
                timer.q = false;
                timer.remaining = 0;
            }
        }
        TimerMode::Pulse => {
            if signal && !was_on && !timer.enabled {
                timer.start_time = now_ms;
                timer.enabled = true;
                timer.q = true;
                timer.remaining = timer.preset_ms;
            }
            if timer.enabled {
                // The pulse runs to completion whatever the input does.
                let elapsed = now_ms.saturating_sub(timer.start_time);
                if elapsed >= timer.preset_ms {
                    timer.q = false;
                    timer.enabled = false;
                    timer.remaining = 0;
                } else {
                    timer.q = true;
                    timer.remaining = timer.preset_ms - elapsed;
                }
            } else if !signal {
                timer.q = false;
            }
        }
    }
    engine.outputs[node.id] = timer.q;
}

fn run_counter(engine: &mut ScanEngine, node: &Node, counters: &mut CounterBank, counts_down: bool) {
    let Some((name, preset)) = name_and_count(&node.args) else {
        my_error!("[SCAN] node {}: malformed counter args {:?}", node.id, node.args);
        engine.outputs[node.id] = false;
        return;
    };
    let signal = engine.outputs[node.id];
    let was_on = engine.prev_inputs[node.id];
    let start_at = if counts_down { preset } else { 0 };
    let Some(counter) = counters.get_or_create(name, preset, start_at) else {
        engine.outputs[node.id] = false;
        return;
    };

    if signal && !was_on {
        counter.current = if counts_down {
            counter.current.saturating_sub(1)
        } else {
            counter.current.saturating_add(1)
        };
    }
    // q latches; only an explicit RESET releases it.
    if (counts_down && counter.current <= 0) || (!counts_down && counter.current >= counter.preset)
    {
        counter.q = true;
    }
    engine.outputs[node.id] = counter.q;
}

/// `DEST:OP1:OP2` arithmetic and bitwise operations, 32-bit unsigned with
/// wrap-around. Division and modulo by zero leave the destination alone.
fn binary_word_op(engine: &mut ScanEngine, node: &Node, memory: &mut MemoryBank, opcode: &str) {
    if !engine.outputs[node.id] {
        return;
    }
    let mut parts = node.args.splitn(3, ':');
    let (Some(d_txt), Some(a_txt), Some(b_txt)) = (parts.next(), parts.next(), parts.next()) else {
        my_error!("[SCAN] node {}: {} needs DEST:OP1:OP2, got {:?}", node.id, opcode, node.args);
        engine.outputs[node.id] = false;
        return;
    };
    let (Some(dest), Some(a), Some(b)) = (
        dest_address(d_txt),
        operand_value(a_txt, memory),
        operand_value(b_txt, memory),
    ) else {
        my_error!("[SCAN] node {}: {} has unusable operands {:?}", node.id, opcode, node.args);
        engine.outputs[node.id] = false;
        return;
    };

    let result = match opcode {
        "ADD" => a.wrapping_add(b),
        "SUB" => a.wrapping_sub(b),
        "MUL" => a.wrapping_mul(b),
        "DIV" => {
            if b == 0 {
                return;
            }
            a / b
        }
        "MOD" => {
            if b == 0 {
                return;
            }
            a % b
        }
        "AND" => a & b,
        "OR" => a | b,
        "XOR" => a ^ b,
        _ => return,
    };
    memory.write_word(&dest, result);
}

/// `DEST:SRC` operations. Shifts and rotates take their amount from the
/// destination word, sampled before the destination is overwritten.
fn unary_word_op(engine: &mut ScanEngine, node: &Node, memory: &mut MemoryBank, opcode: &str) {
    if !engine.outputs[node.id] {
        return;
    }
    let Some((d_txt, s_txt)) = node.args.split_once(':') else {
        my_error!("[SCAN] node {}: {} needs DEST:SRC, got {:?}", node.id, opcode, node.args);
        engine.outputs[node.id] = false;
        return;
    };
    let (Some(dest), Some(src)) = (dest_address(d_txt), operand_value(s_txt, memory)) else {
        my_error!("[SCAN] node {}: {} has unusable operands {:?}", node.id, opcode, node.args);
        engine.outputs[node.id] = false;
        return;
    };

    let amount = memory.read_word(&dest);
    let result = match opcode {
        "NOT" => !src,
        "MOVE" => src,
        "SHL" => src.wrapping_shl(amount),
        "SHR" => src.wrapping_shr(amount),
        "ROL" => src.rotate_left(amount),
        "ROR" => src.rotate_right(amount),
        _ => return,
    };
    memory.write_word(&dest, result);
}

/// `OP1:OP2` comparisons on unsigned 32-bit values. The verdict replaces
/// the rung output while the rung conducts; otherwise the placeholder
/// stands.
fn compare(engine: &mut ScanEngine, node: &Node, memory: &MemoryBank, opcode: &str) {
    if !engine.outputs[node.id] {
        return;
    }
    let Some((a_txt, b_txt)) = node.args.split_once(':') else {
        my_error!("[SCAN] node {}: {} needs OP1:OP2, got {:?}", node.id, opcode, node.args);
        engine.outputs[node.id] = false;
        return;
    };
    let (Some(a), Some(b)) = (operand_value(a_txt, memory), operand_value(b_txt, memory)) else {
        my_error!("[SCAN] node {}: {} has unusable operands {:?}", node.id, opcode, node.args);
        engine.outputs[node.id] = false;
        return;
    };

    engine.outputs[node.id] = match opcode {
        "EQ" => a == b,
        "NE" => a != b,
        "GT" => a > b,
        "GE" => a >= b,
        "LT" => a < b,
        "LE" => a <= b,
        _ => return,
    };
}

/// An instruction operand: a decimal literal, or a readable address.
fn operand_value(text: &str, memory: &MemoryBank) -> Option<DWORD> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed.parse().ok();
    }
    match Address::parse(trimmed) {
        Ok(addr) => Some(memory.read_word(&addr)),
        Err(_) => None,
    }
}

/// An instruction destination: a writable memory reference.
fn dest_address(text: &str) -> Option<Address> {
    let addr = Address::parse(text.trim()).ok()?;
    addr.is_writable().then_some(addr)
}
