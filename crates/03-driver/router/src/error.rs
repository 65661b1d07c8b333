use thiserror::Error;

/// Rejected transform parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TransformError {
    #[error("input range is degenerate: in_min == in_max == {0}")]
    DegenerateInputRange(f32),

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },
}

/// Per-argument failure raised while distributing a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistributeError {
    #[error("argument {index} of {address} has unsupported type {type_name} ('{tag}')")]
    UnsupportedArgument {
        address: String,
        index: usize,
        type_name: &'static str,
        tag: char,
    },

    #[error("handling {address} failed: {reason}")]
    Handler { address: String, reason: String },
}
