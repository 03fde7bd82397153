#![cfg_attr(not(feature = "std"), no_std)]

// 'alloc' is used for dynamic allocation (node tables, instance names).
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod hal;
pub(crate) mod log;

// --- Memory and Program Model ---
pub mod memory;
pub mod program;

// --- Instance Banks ---
pub mod timers;
pub mod counters;

// --- Execution ---
pub mod scan;
pub mod runtime;

// --- Top-level Exports ---
pub use hal::{LadderError, RetentiveStorage};
pub use memory::{Address, AddressError, MemoryBank};
pub use program::{Program, ProgramDoc};
pub use runtime::{PlcRuntime, PlcState, Snapshot};
pub use scan::ScanEngine;
