//! Object nodes: addressable entities in the exposed path space
use super::interface::Interface;
use super::method::Arg;
use super::path::ObjectPath;
use std::fmt::{self, Write};

const INTROSPECTION_DOCTYPE: &str = "<!DOCTYPE node PUBLIC \"-//freedesktop//DTD D-BUS Object Introspection 1.0//EN\"\n \"http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd\">\n";

/// One node of the object tree
#[derive(Debug, Clone)]
pub struct ObjectNode {
    path: ObjectPath,
    publish: bool,
    interfaces: Vec<Interface>,
    children: Vec<ObjectNode>,
}

impl ObjectNode {
    /// A published node with no interfaces or children
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            publish: true,
            interfaces: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Whether the node is reported by `GetManagedObjects`
    pub fn publish(mut self, publish: bool) -> Self {
        self.publish = publish;
        self
    }

    pub fn interface(mut self, interface: Interface) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn child(mut self, child: ObjectNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn is_published(&self) -> bool {
        self.publish
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn children(&self) -> &[ObjectNode] {
        &self.children
    }

    pub fn find_interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name() == name)
    }

    /// Introspection XML describing this node and naming its own children
    ///
    /// [`ObjectTree::introspect`](super::ObjectTree::introspect) also names
    /// nodes declared as separate roots below this one.
    pub fn introspect(&self) -> String {
        let mut children: Vec<&str> = Vec::new();
        for child in &self.children {
            if let Some(name) = child.path.first_segment_below(&self.path) {
                if !children.contains(&name) {
                    children.push(name);
                }
            }
        }
        introspection_xml(&self.path, &self.interfaces, &children)
    }
}

/// Introspection XML for `path` with the given interfaces and child names
pub(crate) fn introspection_xml(path: &ObjectPath, interfaces: &[Interface], children: &[&str]) -> String {
    let mut xml = String::from(INTROSPECTION_DOCTYPE);
    // Writing into a String cannot fail
    match write_node(&mut xml, path, interfaces, children) {
        Ok(()) => xml,
        Err(fmt::Error) => String::new(),
    }
}

fn write_node(
    xml: &mut String,
    path: &ObjectPath,
    interfaces: &[Interface],
    children: &[&str],
) -> fmt::Result {
    writeln!(xml, "<node name=\"{}\">", path)?;

    for interface in interfaces {
        writeln!(xml, "  <interface name=\"{}\">", interface.name())?;
        for method in interface.methods() {
            if method.inputs().is_empty() && method.outputs().is_empty() {
                writeln!(xml, "    <method name=\"{}\"/>", method.name())?;
                continue;
            }
            writeln!(xml, "    <method name=\"{}\">", method.name())?;
            write_args(xml, method.inputs(), "in")?;
            write_args(xml, method.outputs(), "out")?;
            writeln!(xml, "    </method>")?;
        }
        for property in interface.properties() {
            writeln!(
                xml,
                "    <property name=\"{}\" type=\"{}\" access=\"{}\"/>",
                property.name(),
                property.kind().signature(),
                property.access().as_introspection_str()
            )?;
        }
        writeln!(xml, "  </interface>")?;
    }

    for child in children {
        writeln!(xml, "  <node name=\"{}\"/>", child)?;
    }

    writeln!(xml, "</node>")
}

fn write_args(xml: &mut String, args: &[Arg], direction: &str) -> fmt::Result {
    for arg in args {
        writeln!(
            xml,
            "      <arg name=\"{}\" type=\"{}\" direction=\"{}\"/>",
            arg.name, arg.signature, direction
        )?;
    }
    Ok(())
}
