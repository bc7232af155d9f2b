//! Wire-level error taxonomy
//!
//! Every decode or dispatch failure maps 1:1 to an `ErrorMessage`
//! record sent back to the caller; processing continues afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable numeric error codes carried in ErrorMessage records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    FormatInvalid = 1,
    VersionUnsupported = 2,
    SizeInvalid = 3,
    MessageTooBig = 4,
    MessageNotSupported = 5,
    OrderAlreadyExists = 6,
    OrderNotFound = 7,
    InternalError = 8,
}

impl ErrorCode {
    pub fn wire_id(&self) -> u32 {
        *self as u32
    }

    pub fn from_wire_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(ErrorCode::FormatInvalid),
            2 => Some(ErrorCode::VersionUnsupported),
            3 => Some(ErrorCode::SizeInvalid),
            4 => Some(ErrorCode::MessageTooBig),
            5 => Some(ErrorCode::MessageNotSupported),
            6 => Some(ErrorCode::OrderAlreadyExists),
            7 => Some(ErrorCode::OrderNotFound),
            8 => Some(ErrorCode::InternalError),
            _ => None,
        }
    }
}

/// Error record echoed to the caller on any non-fatal failure
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct ErrorMessage {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
