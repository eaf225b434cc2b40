//! Server composition and request surface
//!
//! A [`Server`] ties the validated object tree to its configuration and
//! data bridge. The transport calls into it for method calls, property
//! access, `GetManagedObjects` and introspection.

pub mod config;
pub mod handle;
#[allow(clippy::module_inception)]
pub mod server;


pub use config::{
    parse_advertising_data, AdStructure, Capabilities, ServerConfig, DEFAULT_SERVICE_NAME,
    MAX_ADVERTISING_DATA_LEN,
};
pub use server::{InterfaceMap, PropertyMap, Server, ADVERTISEMENT_SEGMENT};
