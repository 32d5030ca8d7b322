use thiserror::Error;

/// Reasons a serialized table cannot be rebuilt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(
        "[Dict] type conflict: expected key/value widths {expected_key}/{expected_value}, \
         found {found_key}/{found_value}"
    )]
    TypeConflict {
        expected_key: usize,
        expected_value: usize,
        found_key: u32,
        found_value: u32,
    },

    #[error("[Dict] truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("[Dict] text key {index} is not valid NUL-free UTF-8")]
    InvalidText { index: usize },
}
