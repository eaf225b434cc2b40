//! Interface methods and the per-call context handed to them
use super::error::{DispatchError, DispatchResult};
use super::interface::Interface;
use super::path::ObjectPath;
use super::value::Value;
use crate::bridge::DataBridge;
use std::fmt;
use std::sync::Arc;

/// The bus connection a request arrived on
///
/// Handlers use it to emit signals back to the host stack. The transport
/// layer owns the actual connection and message encoding.
pub trait Connection {
    /// Emit `org.freedesktop.DBus.Properties.PropertiesChanged`
    fn emit_properties_changed(
        &self,
        path: &ObjectPath,
        interface: &str,
        changed: &[(String, Value)],
    ) -> DispatchResult<()>;
}

/// Everything a method handler may touch while serving one call
pub struct MethodContext<'a> {
    pub path: &'a ObjectPath,
    pub interface: &'a Interface,
    pub connection: &'a dyn Connection,
    pub bridge: Option<&'a dyn DataBridge>,
}

impl<'a> MethodContext<'a> {
    /// The data bridge, or `DataUnavailable` if none is configured
    pub fn bridge(&self) -> DispatchResult<&'a dyn DataBridge> {
        self.bridge
            .ok_or_else(|| DispatchError::DataUnavailable("no data bridge configured".into()))
    }
}

/// Produces a method's reply values from its decoded arguments
pub type MethodHandler =
    Arc<dyn Fn(&MethodContext<'_>, &[Value]) -> DispatchResult<Vec<Value>> + Send + Sync>;

/// A named, typed method argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: String,
    pub signature: String,
}

/// A named method bound to its handler
#[derive(Clone)]
pub struct Method {
    name: String,
    inputs: Vec<Arg>,
    outputs: Vec<Arg>,
    handler: MethodHandler,
}

impl Method {
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&MethodContext<'_>, &[Value]) -> DispatchResult<Vec<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Declare the next input argument
    pub fn input(mut self, name: &str, signature: &str) -> Self {
        self.inputs.push(Arg {
            name: name.to_string(),
            signature: signature.to_string(),
        });
        self
    }

    /// Declare the next output argument
    pub fn output(mut self, name: &str, signature: &str) -> Self {
        self.outputs.push(Arg {
            name: name.to_string(),
            signature: signature.to_string(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Arg] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Arg] {
        &self.outputs
    }

    /// Check the arguments against the declared inputs, then run the handler
    pub fn invoke(&self, ctx: &MethodContext<'_>, args: &[Value]) -> DispatchResult<Vec<Value>> {
        if args.len() != self.inputs.len() {
            return Err(DispatchError::InvalidArgs(format!(
                "{} expects {} arguments, got {}",
                self.name,
                self.inputs.len(),
                args.len()
            )));
        }
        for (arg, decl) in args.iter().zip(&self.inputs) {
            if arg.signature() != decl.signature {
                return Err(DispatchError::InvalidArgs(format!(
                    "{}: argument {} expects {}, got {}",
                    self.name,
                    decl.name,
                    decl.signature,
                    arg.signature()
                )));
            }
        }
        (self.handler)(ctx, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Reply slot of one method call
///
/// The router records the handler's outcome here; the transport encodes it
/// as a method return or an error reply.
#[derive(Debug, Default)]
pub struct Invocation {
    reply: Option<DispatchResult<Vec<Value>>>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn return_value(&mut self, values: Vec<Value>) {
        self.reply = Some(Ok(values));
    }

    pub fn return_error(&mut self, error: DispatchError) {
        self.reply = Some(Err(error));
    }

    pub fn is_answered(&self) -> bool {
        self.reply.is_some()
    }

    pub fn reply(&self) -> Option<&DispatchResult<Vec<Value>>> {
        self.reply.as_ref()
    }

    pub fn take_reply(&mut self) -> Option<DispatchResult<Vec<Value>>> {
        self.reply.take()
    }
}
