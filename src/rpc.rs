//! Remote procedure call abstraction used by every manager.
//!
//! Managers never touch transport details. They describe a call as an
//! [`RpcCall`] and hand it to an [`RpcClient`], receiving the decoded JSON
//! result or a typed [`RpcError`].

use serde_json::Value;
use thiserror::Error;

/// A single named remote procedure invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcCall {
    /// Service name, for example `SoftLayer_Hardware_Server`.
    pub service: String,
    /// Method name on the service, for example `getObject`.
    pub method: String,
    /// Positional arguments passed to the method.
    pub args: Vec<Value>,
    /// Object identifier the method is invoked on, when it is an instance
    /// method.
    pub identifier: Option<u64>,
    /// Object mask limiting or extending the returned properties.
    pub mask: Option<String>,
    /// Object filter expression applied server side.
    pub filter: Option<Value>,
}

impl RpcCall {
    /// Starts a builder for a call to `service::method`.
    #[must_use]
    pub fn builder(service: impl Into<String>, method: impl Into<String>) -> RpcCallBuilder {
        RpcCallBuilder::new(service, method)
    }

    /// Validates the call, returning a descriptive error when the service or
    /// method name is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when either name is empty.
    pub fn validate(&self) -> Result<(), RpcError> {
        if self.service.is_empty() {
            return Err(RpcError::new("missing or empty field: service"));
        }
        if self.method.is_empty() {
            return Err(RpcError::new("missing or empty field: method"));
        }
        Ok(())
    }

    /// Returns `true` when this call targets `service::method`.
    #[must_use]
    pub fn targets(&self, service: &str, method: &str) -> bool {
        self.service == service && self.method == method
    }
}

/// Builder for [`RpcCall`] that trims names and validates on construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RpcCallBuilder {
    service: String,
    method: String,
    args: Vec<Value>,
    identifier: Option<u64>,
    mask: Option<String>,
    filter: Option<Value>,
}

impl RpcCallBuilder {
    /// Creates a builder for `service::method` with no arguments.
    #[must_use]
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Replaces the positional arguments.
    #[must_use]
    pub fn args(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Sets the object identifier.
    #[must_use]
    pub const fn identifier(mut self, value: u64) -> Self {
        self.identifier = Some(value);
        self
    }

    /// Sets the object mask.
    #[must_use]
    pub fn mask(mut self, value: impl Into<String>) -> Self {
        self.mask = Some(value.into());
        self
    }

    /// Sets an optional object mask, leaving the mask unset for `None`.
    #[must_use]
    pub fn maybe_mask(mut self, value: Option<&str>) -> Self {
        self.mask = value.map(str::to_owned);
        self
    }

    /// Sets the object filter.
    #[must_use]
    pub fn filter(mut self, value: Value) -> Self {
        self.filter = Some(value);
        self
    }

    /// Builds and validates the [`RpcCall`].
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when the service or method name is empty.
    pub fn build(self) -> Result<RpcCall, RpcError> {
        let call = RpcCall {
            service: self.service.trim().to_owned(),
            method: self.method.trim().to_owned(),
            args: self.args,
            identifier: self.identifier,
            mask: self.mask.map(|mask| mask.trim().to_owned()),
            filter: self.filter,
        };
        call.validate()?;
        Ok(call)
    }
}

/// Error raised when a remote call fails.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{}", render(.fault_code.as_deref(), .message))]
pub struct RpcError {
    /// Fault code reported by the remote API, when one was returned.
    pub fault_code: Option<String>,
    /// Human readable failure description.
    pub message: String,
}

fn render(fault_code: Option<&str>, message: &str) -> String {
    fault_code.map_or_else(
        || message.to_owned(),
        |code| format!("{code}: {message}"),
    )
}

impl RpcError {
    /// Creates an error without a fault code.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            fault_code: None,
            message: message.into(),
        }
    }

    /// Creates an error carrying the remote fault code.
    #[must_use]
    pub fn with_fault_code(fault_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fault_code: Some(fault_code.into()),
            message: message.into(),
        }
    }
}

/// Minimal interface implemented by RPC transports and test doubles.
pub trait RpcClient {
    /// Invokes the remote procedure described by `call` and returns the
    /// decoded result.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] when the transport fails or the remote API
    /// reports a fault.
    fn call(&self, call: &RpcCall) -> Result<Value, RpcError>;
}

impl<T: RpcClient + ?Sized> RpcClient for &T {
    fn call(&self, call: &RpcCall) -> Result<Value, RpcError> {
        (**self).call(call)
    }
}
