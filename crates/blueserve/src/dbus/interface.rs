//! Interfaces: named groups of methods and properties on an object
use super::method::Method;
use super::path::ObjectPath;
use super::property::Property;
use crate::error::{ServerError, ServerResult};

/// Maximum length of bus interface and member names
pub const MAX_NAME_LEN: usize = 255;

fn is_valid_element(element: &str) -> bool {
    let mut chars = element.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reverse-domain interface name, e.g. `org.bluez.GattService1`
pub fn is_valid_interface_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && name.split('.').count() >= 2 && name.split('.').all(is_valid_element)
}

/// Method or property name, e.g. `ReadValue`
pub fn is_valid_member_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && is_valid_element(name)
}

/// A named group of properties and methods
///
/// Properties keep their insertion order, which is also the order they are
/// enumerated in for `GetAll` and `GetManagedObjects`.
#[derive(Debug, Clone)]
pub struct Interface {
    name: String,
    properties: Vec<Property>,
    methods: Vec<Method>,
}

impl Interface {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name() == name)
    }

    /// Check names, member uniqueness and property access; `path` is for
    /// error reporting
    pub(crate) fn validate(&self, path: &ObjectPath) -> ServerResult<()> {
        if !is_valid_interface_name(&self.name) {
            return Err(ServerError::InvalidInterfaceName(self.name.clone()));
        }

        if let Some(property) = self.properties.iter().find(|p| p.access().is_empty()) {
            return Err(ServerError::InaccessibleProperty {
                path: path.clone(),
                interface: self.name.clone(),
                property: property.name().to_string(),
            });
        }

        let members = self
            .properties
            .iter()
            .map(Property::name)
            .chain(self.methods.iter().map(Method::name));

        let mut seen: Vec<&str> = Vec::new();
        for member in members {
            if !is_valid_member_name(member) {
                return Err(ServerError::InvalidMemberName(member.to_string()));
            }
            if seen.contains(&member) {
                return Err(ServerError::DuplicateMember {
                    path: path.clone(),
                    interface: self.name.clone(),
                    member: member.to_string(),
                });
            }
            seen.push(member);
        }

        Ok(())
    }
}
