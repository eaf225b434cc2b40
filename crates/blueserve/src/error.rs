//! Error types for the blueserve library
//!
//! `ServerError` covers everything detected while a server is being built.
//! Any of these prevents the server from starting. Per-request failures live
//! in [`crate::dbus::DispatchError`].

use crate::dbus::{ObjectPath, PathError};
use thiserror::Error;

/// Configuration violations found at construction time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServerError {
    #[error("Service name must not be empty")]
    EmptyServiceName,

    #[error("Invalid service name: {0:?}")]
    InvalidServiceName(String),

    #[error("Advertising data is {len} bytes, the frame holds at most {max}")]
    AdvertisingDataTooLong { len: usize, max: usize },

    #[error("Malformed advertising data at offset {0}")]
    MalformedAdvertisingData(usize),

    #[error("Invalid object path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Invalid interface name: {0:?}")]
    InvalidInterfaceName(String),

    #[error("Invalid member name: {0:?}")]
    InvalidMemberName(String),

    #[error("Duplicate object path: {0}")]
    DuplicatePath(ObjectPath),

    #[error("Duplicate interface {interface} on {path}")]
    DuplicateInterface { path: ObjectPath, interface: String },

    #[error("Property {property} in {interface} on {path} is neither readable nor writable")]
    InaccessibleProperty {
        path: ObjectPath,
        interface: String,
        property: String,
    },

    #[error("Duplicate member {member} in {interface} on {path}")]
    DuplicateMember {
        path: ObjectPath,
        interface: String,
        member: String,
    },

    #[error("Child {child} does not extend its parent path {parent}")]
    ChildOutsideParent { parent: ObjectPath, child: ObjectPath },

    #[error("Readable or writable attribute {0} has no value source")]
    MissingValueSource(ObjectPath),

    #[error("Object {path} lies outside the server namespace {root}")]
    OutsideNamespace { path: ObjectPath, root: ObjectPath },

    #[error("A server is already installed for this process")]
    AlreadyInstalled,
}

/// Result type for server construction
pub type ServerResult<T> = Result<T, ServerError>;
