//! Error types for the `m1-core` crate.

use crate::private::*;

/// A specialized `Result` type with `Error`.
pub type Result<T> = StdResult<T, Error>;

/// Errors raised by the routing, reliability, and orchestration layers.
///
/// Maps directly onto the externally visible error names of the
/// original design; `OK` has no variant here since it is represented
/// by `Result::Ok(())`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Missing or contradictory input; caller bug.
    Inval,
    /// A bounded arena (route table, link table, payload pool, tracking
    /// list) is exhausted.
    NoSpace,
    /// No route for the target id, or no handler for the data type.
    NotExist,
    /// The link driver refused the frame.
    Io,
    /// A reliable packet exhausted its retry budget.
    Timeout,
    /// Called before initialization, or a feature not built.
    NotImplemented,
    /// Destination id is not addressable (reserved for link drivers).
    Addr,
    /// The target resource is currently busy (reserved for link drivers).
    Busy,
    /// Payload exceeds the configured maximum.
    ArgTooBig,
    /// A handler is already registered for this `data_type`.
    Repeated,
    /// Unclassified internal error.
    Error,
}

impl StdError for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let msg = match self {
            Self::Inval => "invalid argument",
            Self::NoSpace => "arena exhausted",
            Self::NotExist => "no route or handler",
            Self::Io => "link I/O failure",
            Self::Timeout => "retry budget exhausted",
            Self::NotImplemented => "stack not initialized",
            Self::Addr => "address not reachable",
            Self::Busy => "resource busy",
            Self::ArgTooBig => "payload too large",
            Self::Repeated => "handler already registered",
            Self::Error => "internal error",
        };
        f.write_str(msg)
    }
}
