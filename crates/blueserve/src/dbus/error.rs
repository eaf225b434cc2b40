//! Per-request dispatch errors
use super::constants::*;
use super::path::ObjectPath;
use thiserror::Error;

/// Failure of a single inbound request
///
/// None of these are fatal; the transport turns each into a bus error reply
/// named by [`DispatchError::error_name`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("No object at path {0}")]
    UnknownObject(ObjectPath),

    #[error("Object {path} has no interface {interface}")]
    UnknownInterface { path: ObjectPath, interface: String },

    #[error("Interface {interface} has no method {method}")]
    UnknownMethod { interface: String, method: String },

    #[error("Interface {interface} has no property {property}")]
    UnknownProperty { interface: String, property: String },

    #[error("Read not permitted: {0}")]
    ReadNotPermitted(String),

    #[error("Write not permitted: {0}")]
    WriteNotPermitted(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(usize),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Operation failed: {0}")]
    Failed(String),
}

impl DispatchError {
    /// Bus error name reported to the remote caller
    pub fn error_name(&self) -> &'static str {
        match self {
            DispatchError::UnknownObject(_) => ERROR_UNKNOWN_OBJECT,
            DispatchError::UnknownInterface { .. } => ERROR_UNKNOWN_INTERFACE,
            DispatchError::UnknownMethod { .. } => ERROR_UNKNOWN_METHOD,
            DispatchError::UnknownProperty { .. } => ERROR_UNKNOWN_PROPERTY,
            DispatchError::ReadNotPermitted(_) => ERROR_NOT_PERMITTED,
            DispatchError::WriteNotPermitted(_) => ERROR_PROPERTY_READ_ONLY,
            DispatchError::InvalidArgs(_) => ERROR_INVALID_ARGS,
            DispatchError::InvalidOffset(_) => ERROR_INVALID_OFFSET,
            DispatchError::DataUnavailable(_) => ERROR_NOT_AVAILABLE,
            DispatchError::Failed(_) => ERROR_FAILED,
        }
    }

    /// True for resolution misses (path, interface or member not found)
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownObject(_)
                | DispatchError::UnknownInterface { .. }
                | DispatchError::UnknownMethod { .. }
                | DispatchError::UnknownProperty { .. }
        )
    }
}

/// Dispatch result type
pub type DispatchResult<T> = Result<T, DispatchError>;
