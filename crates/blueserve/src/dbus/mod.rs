//! Object bus model
//!
//! This module describes the objects a peripheral exposes on the bus: paths,
//! interfaces with their properties and methods, and the tree that resolves
//! inbound requests to exactly one handler.

pub mod constants;
pub mod error;
pub mod interface;
pub mod method;
pub mod object;
pub mod path;
pub mod property;
pub mod tree;
pub mod value;

#[cfg(test)]
mod tests;

pub use error::{DispatchError, DispatchResult};
pub use interface::Interface;
pub use method::{Arg, Connection, Invocation, Method, MethodContext, MethodHandler};
pub use object::ObjectNode;
pub use path::{ObjectPath, PathError};
pub use property::{Property, PropertyAccess, PropertyGetter, PropertySource};
pub use tree::{Nodes, ObjectTree};
pub use value::{Value, ValueKind};
