// crates/ladder-rs/src/types.rs

// --- Primitive Types ---

/// Alias for a 32-bit data word, the storage unit of the D region
/// (IEC 61131-3 DWORD).
pub type DWORD = u32;

// --- Memory Capacities ---

/// Number of marker (internal relay) bits in the M region.
pub const MAX_M_BITS: usize = 200;

/// Number of physical input bits in the I region.
pub const MAX_I_BITS: usize = 100;

/// Number of physical output bits in the Q region.
pub const MAX_Q_BITS: usize = 100;

/// Number of 32-bit data words in the D region.
pub const MAX_D_WORDS: usize = 100;

// --- Program Capacities ---

/// Maximum number of nodes a program may carry. Node ids double as array
/// indices into the per-node scan scratch, so every id must stay below this.
pub const MAX_NODES: usize = 100;

/// Maximum number of links a program may carry.
pub const MAX_LINKS: usize = 200;

/// Maximum number of live timer instances.
pub const MAX_TIMERS: usize = 10;

/// Maximum number of live counter instances.
pub const MAX_COUNTERS: usize = 10;

// --- Timing Parameters ---

/// Nominal interval between two scan cycles while running, in milliseconds.
pub const SCAN_INTERVAL_MS: u64 = 10;

/// Minimum interval between two published snapshots, in milliseconds.
/// State transitions bypass the throttle.
pub const SNAPSHOT_MIN_INTERVAL_MS: u64 = 200;

/// Upper bound on signal-propagation passes over one network within a scan.
/// Sufficient for any acyclic rung; cyclic rungs are a user-program error.
pub const MAX_PROPAGATION_PASSES: usize = 10;
