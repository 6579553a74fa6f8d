//! Error conditions reported by histories and tables.
//!
//! Every condition here is local to the call that produced it and leaves the
//! receiver unchanged, so callers are free to recover and continue.

/// The error type for all fallible operations of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// A bit index points past the retained history of an exact buffer.
    #[error("bit index {index} is out of range for a history of {len} bits")]
    IndexOutOfRange {
        /// The requested offset from the most recent observation.
        index: usize,
        /// The number of retained observations.
        len: usize,
    },

    /// A dense entry index points past the end of a table.
    #[error("entry {entry} is out of range for a table of {len} entries")]
    EntryOutOfRange {
        /// The requested entry.
        entry: usize,
        /// The number of entries in the table.
        len: usize,
    },

    /// A construction or batch parameter is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A ratio was requested over zero observations.
    #[error("ratio is undefined over zero updates")]
    UndefinedRatio,

    /// A keyed lookup named a key that was never written.
    #[error("unknown key")]
    UnknownKey,

    /// A new key was written to a keyed table with every slot assigned.
    #[error("keyed table is full ({capacity} entries)")]
    CapacityExceeded {
        /// The fixed number of slots of the table.
        capacity: usize,
    },
}

/// A specialized [`Result`](std::result::Result) for this crate.
pub type Result<T> = std::result::Result<T, Error>;
