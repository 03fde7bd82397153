// crates/ladder-rs/src/hal.rs
use crate::memory::address::AddressError;
use crate::program::ProgramDoc;
use core::fmt;

/// Defines a portable, descriptive Error type for the ladder runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderError {
    /// A textual address could not be parsed into a memory reference.
    InvalidAddress(AddressError),
    /// A program document violates a structural rule and was rejected whole.
    MalformedProgram(&'static str),
    /// An error occurred in the retentive storage backend.
    StorageError(&'static str),
    /// Internal logic error.
    InternalError(&'static str),
}

impl fmt::Display for LadderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(e) => write!(f, "Invalid address: {}", e),
            Self::MalformedProgram(s) => write!(f, "Malformed program: {}", s),
            Self::StorageError(s) => write!(f, "Storage error: {}", s),
            Self::InternalError(s) => write!(f, "Internal error: {}", s),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LadderError {}

impl From<AddressError> for LadderError {
    fn from(err: AddressError) -> Self {
        LadderError::InvalidAddress(err)
    }
}

impl From<&'static str> for LadderError {
    fn from(s: &'static str) -> Self {
        LadderError::InternalError(s)
    }
}

/// A trait for abstracting the non-volatile storage of the runtime.
///
/// Only two things survive a reboot: the last RUN/STOP status (a single
/// integer) and the deployed program document. Everything else (memory
/// regions, timers, counters) is rebuilt from zero at boot.
pub trait RetentiveStorage {
    /// Loads the persisted status integer, or `None` when nothing was stored.
    fn load_status(&mut self) -> Result<Option<u8>, LadderError>;

    /// Persists the status integer.
    fn save_status(&mut self, status: u8) -> Result<(), LadderError>;

    /// Loads the stored program document, or `None` when nothing was stored.
    fn load_program(&mut self) -> Result<Option<ProgramDoc>, LadderError>;

    /// Persists the program document.
    fn save_program(&mut self, doc: &ProgramDoc) -> Result<(), LadderError>;
}
