use thiserror::Error;

/// Legacy poke-style status codes. These values are contract: they must
/// not be renumbered, since callers porting poke scripts rely on them.
pub const IOS_OK: i32 = 0;
pub const IOS_ERROR: i32 = -1;
pub const IOS_EIOFF: i32 = -2;
pub const IOS_EIOBJ: i32 = -3;
pub const IOS_EFLAGS: i32 = -4;
pub const IOS_ENOMEM: i32 = -5;

#[derive(Error, Debug)]
pub enum IosError {
    /// The provided offset translates into a byte offset the device cannot
    /// service (short read/write from the backend).
    #[error("invalid offset for this device")]
    Eoff,

    /// No valid object could be found at the requested offset. Reserved:
    /// nothing in this crate constructs this variant today, it exists for
    /// upper layers built on top of this one.
    #[error("no valid object at offset")]
    Eiobj,

    /// Flags supplied to `open` were rejected by the chosen backend.
    #[error("invalid open flags")]
    Eflags,

    /// Allocation failure while growing a string read buffer.
    #[error("allocation failure")]
    Enomem,

    /// An I/O failure reported by the underlying backend (file, socket).
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend-reported failure that doesn't fit the above.
    #[error("{0}")]
    Error(&'static str),
}

impl IosError {
    /// The legacy poke integer code for this error.
    pub fn code(&self) -> i32 {
        match self {
            IosError::Eoff => IOS_EIOFF,
            IosError::Eiobj => IOS_EIOBJ,
            IosError::Eflags => IOS_EFLAGS,
            IosError::Enomem => IOS_ENOMEM,
            IosError::Io(_) => IOS_ERROR,
            IosError::Error(_) => IOS_ERROR,
        }
    }
}

pub type IosResult<T> = Result<T, IosError>;
