use thiserror::Error;

pub type WireResult<T> = Result<T, WireError>;

/// Reasons a datagram could not be turned into a [`Packet`](crate::Packet).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("datagram is empty")]
    Empty,

    #[error("truncated {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },

    #[error("{what} at offset {offset} is not 4-byte aligned")]
    Misaligned { what: &'static str, offset: usize },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("address {0:?} does not start with '/'")]
    InvalidAddress(String),

    #[error("type tag string does not start with ','")]
    MissingTypeTags,

    #[error("unknown type tag {tag:?} in message to {address}")]
    UnknownTypeTag { tag: char, address: String },

    #[error("unterminated array in type tags of message to {address}")]
    UnterminatedArray { address: String },

    #[error("nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    #[error("invalid bundle element size {size} at offset {offset}")]
    InvalidElementSize { size: i32, offset: usize },
}
