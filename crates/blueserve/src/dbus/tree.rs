//! Object tree registry and request resolution
//!
//! The tree is validated once when it is built and never changes afterwards,
//! so every lookup is a plain read and the tree can be shared between
//! threads without locking. Lookups scan the nodes depth-first and compare
//! full paths; a prefix match never counts. Trees hold tens of objects, so
//! the scan is cheap.

use super::error::{DispatchError, DispatchResult};
use super::interface::Interface;
use super::method::{Connection, Invocation, Method, MethodContext};
use super::object::{introspection_xml, ObjectNode};
use super::path::ObjectPath;
use super::property::Property;
use super::value::Value;
use crate::bridge::DataBridge;
use crate::error::{ServerError, ServerResult};
use log::{debug, trace};
use std::collections::HashSet;

/// Depth-first, pre-order iterator over a forest of nodes
pub struct Nodes<'a> {
    stack: Vec<&'a ObjectNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a ObjectNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// The ordered collection of root nodes describing the whole peripheral
#[derive(Debug, Clone, Default)]
pub struct ObjectTree {
    roots: Vec<ObjectNode>,
}

impl ObjectTree {
    /// Build a tree, rejecting duplicate paths, duplicate interfaces on a
    /// node, duplicate members in an interface, invalid names and children
    /// that do not extend their parent's path
    pub fn new(roots: Vec<ObjectNode>) -> ServerResult<Self> {
        let tree = Self { roots };
        tree.validate()?;
        Ok(tree)
    }

    fn validate(&self) -> ServerResult<()> {
        let mut paths: HashSet<&ObjectPath> = HashSet::new();

        for node in self.nodes() {
            if !paths.insert(node.path()) {
                return Err(ServerError::DuplicatePath(node.path().clone()));
            }

            let mut names: HashSet<&str> = HashSet::new();
            for interface in node.interfaces() {
                if !names.insert(interface.name()) {
                    return Err(ServerError::DuplicateInterface {
                        path: node.path().clone(),
                        interface: interface.name().to_string(),
                    });
                }
                interface.validate(node.path())?;
            }

            for child in node.children() {
                if !child.path().is_descendant_of(node.path()) {
                    return Err(ServerError::ChildOutsideParent {
                        parent: node.path().clone(),
                        child: child.path().clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn roots(&self) -> &[ObjectNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<ObjectNode> {
        self.roots
    }

    /// Every node, depth-first in declaration order
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn find_node(&self, path: &ObjectPath) -> Option<&ObjectNode> {
        self.nodes().find(|node| node.path() == path)
    }

    pub fn find_interface(&self, path: &ObjectPath, interface: &str) -> Option<&Interface> {
        self.find_node(path)?.find_interface(interface)
    }

    pub fn find_property(
        &self,
        path: &ObjectPath,
        interface: &str,
        property: &str,
    ) -> Option<&Property> {
        self.find_interface(path, interface)?.find_property(property)
    }

    pub fn find_method(&self, path: &ObjectPath, interface: &str, method: &str) -> Option<&Method> {
        self.find_interface(path, interface)?.find_method(method)
    }

    /// Like [`find_interface`](Self::find_interface), naming what was missing
    pub fn resolve_interface(&self, path: &ObjectPath, interface: &str) -> DispatchResult<&Interface> {
        let node = self
            .find_node(path)
            .ok_or_else(|| DispatchError::UnknownObject(path.clone()))?;
        node.find_interface(interface)
            .ok_or_else(|| DispatchError::UnknownInterface {
                path: path.clone(),
                interface: interface.to_string(),
            })
    }

    /// Like [`find_property`](Self::find_property), naming what was missing
    pub fn resolve_property(
        &self,
        path: &ObjectPath,
        interface: &str,
        property: &str,
    ) -> DispatchResult<&Property> {
        self.resolve_interface(path, interface)?
            .find_property(property)
            .ok_or_else(|| DispatchError::UnknownProperty {
                interface: interface.to_string(),
                property: property.to_string(),
            })
    }

    /// Like [`find_method`](Self::find_method), naming what was missing
    pub fn resolve_method(
        &self,
        path: &ObjectPath,
        interface: &str,
        method: &str,
    ) -> DispatchResult<&Method> {
        self.resolve_call(path, interface, method).map(|(_, target)| target)
    }

    fn resolve_call(
        &self,
        path: &ObjectPath,
        interface: &str,
        method: &str,
    ) -> DispatchResult<(&Interface, &Method)> {
        let iface = self.resolve_interface(path, interface)?;
        let target = iface
            .find_method(method)
            .ok_or_else(|| DispatchError::UnknownMethod {
                interface: interface.to_string(),
                method: method.to_string(),
            })?;
        Ok((iface, target))
    }

    /// Resolve and invoke a method
    ///
    /// Returns true iff the method was found and its handler run. The
    /// handler's reply or error is recorded in `invocation`. On a miss
    /// nothing is invoked and `invocation` is left untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn call_method(
        &self,
        path: &ObjectPath,
        interface: &str,
        method: &str,
        connection: &dyn Connection,
        args: &[Value],
        bridge: Option<&dyn DataBridge>,
        invocation: &mut Invocation,
    ) -> bool {
        let (iface, target) = match self.resolve_call(path, interface, method) {
            Ok(found) => found,
            Err(err) => {
                debug!("Not calling {}.{} on {}: {}", interface, method, path, err);
                return false;
            }
        };

        trace!("Calling {}.{} on {}", interface, method, path);
        let ctx = MethodContext {
            path,
            interface: iface,
            connection,
            bridge,
        };
        match target.invoke(&ctx, args) {
            Ok(values) => invocation.return_value(values),
            Err(err) => {
                debug!("{}.{} on {} failed: {}", interface, method, path, err);
                invocation.return_error(err);
            }
        }
        true
    }

    /// Introspection XML for any path in the tree's path space
    ///
    /// Child names cover every node below `path`, whichever root declared
    /// it. A path with no node of its own but with nodes below it is an
    /// empty intermediate node.
    pub fn introspect(&self, path: &ObjectPath) -> DispatchResult<String> {
        let mut children: Vec<&str> = Vec::new();
        for node in self.nodes() {
            if let Some(name) = node.path().first_segment_below(path) {
                if !children.contains(&name) {
                    children.push(name);
                }
            }
        }

        match self.find_node(path) {
            Some(node) => Ok(introspection_xml(path, node.interfaces(), &children)),
            None if !children.is_empty() => Ok(introspection_xml(path, &[], &children)),
            None => Err(DispatchError::UnknownObject(path.clone())),
        }
    }
}
