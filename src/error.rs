use std::fmt::{self, Debug};

/// Driver error, generic over the bus error type `E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// The bus transaction failed, e.g. the tag did not acknowledge.
    Bus(E),
    /// A strict request asked for more than one block.
    Truncated { requested: usize, limit: usize },
    /// A region write would run past the last block address.
    AddressOverflow { base: u8, blocks: usize },
    /// The text sink refused output.
    Format,
}

impl<E> Error<E> {
    /// Returns the bus error, if this is one.
    pub fn bus(&self) -> Option<&E> {
        match self {
            Error::Bus(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<fmt::Error> for Error<E> {
    fn from(_: fmt::Error) -> Self {
        Self::Format
    }
}

impl<E: Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "I2C transaction failed: {e:?}"),
            Error::Truncated { requested, limit } => {
                write!(f, "request of {requested} bytes exceeds the {limit}-byte block")
            }
            Error::AddressOverflow { base, blocks } => {
                write!(f, "{blocks} blocks from {base:#04X} run past block 0xFF")
            }
            Error::Format => f.write_str("failed to write formatted output"),
        }
    }
}

impl<E: Debug> std::error::Error for Error<E> {}
