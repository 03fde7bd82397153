// crates/ladder-rs/src/memory/mod.rs

pub mod address;

pub use address::{Address, AddressError};

use crate::log::my_warn;
use crate::types::{DWORD, MAX_D_WORDS, MAX_I_BITS, MAX_M_BITS, MAX_Q_BITS};

/// The fixed memory bank of the controller.
///
/// Four regions: M (markers), I (inputs) and Q (outputs) as bit arrays, and
/// D as 32-bit words. Out-of-range reads yield `false`/`0`, out-of-range
/// writes are dropped; both log a warning but never fault the runtime.
///
/// No interior locking: the scan engine, the lifecycle controller and the
/// external command handlers all run on one cooperative thread.
pub struct MemoryBank {
    m: [bool; MAX_M_BITS],
    i: [bool; MAX_I_BITS],
    q: [bool; MAX_Q_BITS],
    d: [DWORD; MAX_D_WORDS],
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBank {
    /// Creates a zeroed memory bank.
    pub fn new() -> Self {
        Self {
            m: [false; MAX_M_BITS],
            i: [false; MAX_I_BITS],
            q: [false; MAX_Q_BITS],
            d: [0; MAX_D_WORDS],
        }
    }

    /// Reads an address as a boolean, the "contact value" of plain logic.
    ///
    /// `D<i>` without a dot reads as `word != 0`. Timer and counter
    /// references are resolved by the scan engine against the banks; asked
    /// directly, the memory bank answers `false`.
    pub fn read_bit(&self, addr: &Address) -> bool {
        match addr {
            Address::M(i) => read_flag(&self.m, *i, 'M'),
            Address::I(i) => read_flag(&self.i, *i, 'I'),
            Address::Q(i) => read_flag(&self.q, *i, 'Q'),
            Address::D(i) => self.word(*i) != 0,
            Address::DBit(i, b) => self.word(*i) & (1 << *b) != 0,
            Address::Timer(_) | Address::Counter(_) => {
                my_warn!("[MEM] {} is not a memory region bit", addr);
                false
            }
        }
    }

    /// Writes a boolean to an address. Only memory regions accept writes.
    ///
    /// A boolean written to `D<i>` without a dot stores `1`/`0` into the
    /// whole word; the dotted form is a read-modify-write of one bit.
    pub fn write_bit(&mut self, addr: &Address, value: bool) {
        match addr {
            Address::M(i) => write_flag(&mut self.m, *i, value, 'M'),
            Address::I(i) => write_flag(&mut self.i, *i, value, 'I'),
            Address::Q(i) => write_flag(&mut self.q, *i, value, 'Q'),
            Address::D(i) => self.set_word(*i, value as DWORD),
            Address::DBit(i, b) => {
                let word = self.word(*i);
                let mask = 1 << *b;
                self.set_word(*i, if value { word | mask } else { word & !mask });
            }
            Address::Timer(_) | Address::Counter(_) => {
                my_warn!("[MEM] write to {} ignored: not a memory region", addr);
            }
        }
    }

    /// Reads an address as a 32-bit word. Bit references read as `0`/`1`.
    pub fn read_word(&self, addr: &Address) -> DWORD {
        match addr {
            Address::D(i) => self.word(*i),
            Address::DBit(i, b) => (self.word(*i) >> *b) & 1,
            Address::M(_) | Address::I(_) | Address::Q(_) => self.read_bit(addr) as DWORD,
            Address::Timer(_) | Address::Counter(_) => {
                my_warn!("[MEM] {} is not readable as a word", addr);
                0
            }
        }
    }

    /// Writes a 32-bit word. Writing to a bit reference stores `value != 0`.
    pub fn write_word(&mut self, addr: &Address, value: DWORD) {
        match addr {
            Address::D(i) => self.set_word(*i, value),
            Address::DBit(_, _) | Address::M(_) | Address::I(_) | Address::Q(_) => {
                self.write_bit(addr, value != 0)
            }
            Address::Timer(_) | Address::Counter(_) => {
                my_warn!("[MEM] write to {} ignored: not a memory region", addr);
            }
        }
    }

    /// Zeroes every region (the RESET transition and boot).
    pub fn clear_all(&mut self) {
        self.m = [false; MAX_M_BITS];
        self.i = [false; MAX_I_BITS];
        self.q = [false; MAX_Q_BITS];
        self.d = [0; MAX_D_WORDS];
    }

    /// Zeroes the M and Q regions (the STOP transition). Inputs and data
    /// words keep their values.
    pub fn clear_outputs(&mut self) {
        self.m = [false; MAX_M_BITS];
        self.q = [false; MAX_Q_BITS];
    }

    /// Set M bit indices, for the snapshot producer.
    pub fn set_m_bits(&self) -> impl Iterator<Item = usize> + '_ {
        set_bits(&self.m)
    }

    /// Set I bit indices, for the snapshot producer.
    pub fn set_i_bits(&self) -> impl Iterator<Item = usize> + '_ {
        set_bits(&self.i)
    }

    /// Set Q bit indices, for the snapshot producer.
    pub fn set_q_bits(&self) -> impl Iterator<Item = usize> + '_ {
        set_bits(&self.q)
    }

    /// Non-zero D words with their indices, for the snapshot producer.
    pub fn nonzero_d_words(&self) -> impl Iterator<Item = (usize, DWORD)> + '_ {
        self.d
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0)
            .map(|(i, w)| (i, *w))
    }

    fn word(&self, index: usize) -> DWORD {
        match self.d.get(index) {
            Some(w) => *w,
            None => {
                my_warn!("[MEM] D{} is out of range, reading 0", index);
                0
            }
        }
    }

    fn set_word(&mut self, index: usize, value: DWORD) {
        match self.d.get_mut(index) {
            Some(w) => *w = value,
            None => my_warn!("[MEM] D{} is out of range, write dropped", index),
        }
    }
}

fn read_flag(region: &[bool], index: usize, tag: char) -> bool {
    match region.get(index) {
        Some(bit) => *bit,
        None => {
            my_warn!("[MEM] {}{} is out of range, reading false", tag, index);
            false
        }
    }
}

fn write_flag(region: &mut [bool], index: usize, value: bool, tag: char) {
    match region.get_mut(index) {
        Some(bit) => *bit = value,
        None => my_warn!("[MEM] {}{} is out of range, write dropped", tag, index),
    }
}

fn set_bits(region: &[bool]) -> impl Iterator<Item = usize> + '_ {
    region
        .iter()
        .enumerate()
        .filter(|(_, bit)| **bit)
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    #[test]
    fn test_bit_round_trip() {
        let mut mem = MemoryBank::new();
        let addr = Address::parse("M17").unwrap();
        assert!(!mem.read_bit(&addr));
        mem.write_bit(&addr, true);
        assert!(mem.read_bit(&addr));
    }

    #[test]
    fn test_word_as_bit() {
        let mut mem = MemoryBank::new();
        let word = Address::parse("D5").unwrap();
        assert!(!mem.read_bit(&word));
        mem.write_word(&word, 7);
        assert!(mem.read_bit(&word));
        // A boolean write replaces the whole word with 1/0.
        mem.write_bit(&word, true);
        assert_eq!(mem.read_word(&word), 1);
        mem.write_bit(&word, false);
        assert_eq!(mem.read_word(&word), 0);
    }

    #[test]
    fn test_dotted_bit_is_read_modify_write() {
        let mut mem = MemoryBank::new();
        let word = Address::parse("D5").unwrap();
        let bit3 = Address::parse("D5.3").unwrap();
        mem.write_word(&word, 0b0001);
        mem.write_bit(&bit3, true);
        assert_eq!(mem.read_word(&word), 0b1001);
        assert!(mem.read_bit(&bit3));
        mem.write_bit(&bit3, false);
        assert_eq!(mem.read_word(&word), 0b0001);
    }

    #[test]
    fn test_out_of_range_is_silent() {
        let mut mem = MemoryBank::new();
        let addr = Address::parse("M9999").unwrap();
        mem.write_bit(&addr, true);
        assert!(!mem.read_bit(&addr));
        let word = Address::parse("D9999").unwrap();
        mem.write_word(&word, 42);
        assert_eq!(mem.read_word(&word), 0);
    }

    #[test]
    fn test_clear_outputs_keeps_inputs_and_words() {
        let mut mem = MemoryBank::new();
        mem.write_bit(&Address::parse("M1").unwrap(), true);
        mem.write_bit(&Address::parse("Q1").unwrap(), true);
        mem.write_bit(&Address::parse("I1").unwrap(), true);
        mem.write_word(&Address::parse("D1").unwrap(), 99);

        mem.clear_outputs();

        assert!(!mem.read_bit(&Address::parse("M1").unwrap()));
        assert!(!mem.read_bit(&Address::parse("Q1").unwrap()));
        assert!(mem.read_bit(&Address::parse("I1").unwrap()));
        assert_eq!(mem.read_word(&Address::parse("D1").unwrap()), 99);
    }

    #[test]
    fn test_snapshot_iterators_report_nonzero_only() {
        let mut mem = MemoryBank::new();
        mem.write_bit(&Address::parse("M0").unwrap(), true);
        mem.write_bit(&Address::parse("M7").unwrap(), true);
        mem.write_word(&Address::parse("D2").unwrap(), 5);

        assert_eq!(mem.set_m_bits().collect::<Vec<_>>(), [0, 7]);
        assert_eq!(mem.nonzero_d_words().collect::<Vec<_>>(), [(2, 5)]);
        assert!(mem.set_q_bits().next().is_none());
        // Sanity: the iterators agree with read_bit.
        assert!(mem.read_bit(&Address::parse("M7").unwrap()));
        assert_eq!(Address::parse("M7").unwrap().to_string(), "M7");
    }
}
