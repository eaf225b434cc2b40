//! Blueserve - BLE peripheral object tree and request routing
//!
//! This library describes a Bluetooth LE peripheral as a tree of bus objects
//! (GATT services, characteristics, descriptors and an LE advertisement) in
//! the shape BlueZ expects, and routes inbound method calls and property
//! requests to the right handler. Attribute values are brokered through a
//! [`DataBridge`] supplied by the application.
//!
//! The tree is validated once when a [`Server`] is built and is immutable
//! afterwards, so a server can be shared freely between threads.

pub mod bridge;
pub mod dbus;
pub mod error;
pub mod gatt;
pub mod server;
pub mod uuid;

// Re-export common types for convenience
pub use bridge::{DataBridge, FnBridge, MemoryBridge};
pub use dbus::{
    Connection, DispatchError, DispatchResult, Interface, Invocation, Method, ObjectNode,
    ObjectPath, ObjectTree, Property, PropertyAccess, Value, ValueKind,
};
pub use error::{ServerError, ServerResult};
pub use gatt::{
    AdvertisementBuilder, AdvertisementType, CharacteristicBuilder, CharacteristicFlags,
    DescriptorBuilder, DescriptorFlags, ServiceBuilder,
};
pub use server::{handle, Capabilities, Server, ServerConfig};
pub use uuid::Uuid;
