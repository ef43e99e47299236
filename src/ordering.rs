//! Ordering helper shared by managers that provision through the product
//! catalog.
//!
//! The helper looks packages up by key name and submits generated order
//! payloads for verification or placement.

use serde::Serialize;
use serde_json::{Value, json};

use crate::hardware::HardwareError;
use crate::rpc::{RpcCall, RpcClient};

/// Service exposing the product catalog.
pub const PACKAGE_SERVICE: &str = "SoftLayer_Product_Package";
/// Service accepting orders.
pub const ORDER_SERVICE: &str = "SoftLayer_Product_Order";

/// Thin wrapper over the catalog and order services.
#[derive(Clone, Debug)]
pub struct OrderingManager<C: RpcClient> {
    client: C,
}

impl<C: RpcClient> OrderingManager<C> {
    /// Creates an ordering helper issuing calls through `client`.
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Returns the raw package whose key name equals `key_name`.
    ///
    /// The catalog is fetched fresh on every call.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::PackageNotFound`] when no package carries the
    /// key name, or [`HardwareError::Rpc`] when the lookup fails.
    pub fn get_package_by_key(&self, key_name: &str, mask: Option<&str>) -> Result<Value, HardwareError> {
        let call = RpcCall::builder(PACKAGE_SERVICE, "getAllObjects")
            .maybe_mask(mask)
            .filter(json!({ "keyName": { "operation": key_name } }))
            .build()?;
        let first = match self.client.call(&call)? {
            Value::Array(packages) => packages.into_iter().next(),
            Value::Null => None,
            single @ Value::Object(_) => Some(single),
            other => {
                return Err(HardwareError::decode(
                    "package list",
                    &format!("expected an array, found {other}"),
                ));
            }
        };
        first.ok_or_else(|| HardwareError::PackageNotFound {
            key_name: key_name.to_owned(),
        })
    }

    /// Asks the API to validate `order` without charging the account.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when verification is rejected.
    pub fn verify_order<O: Serialize>(&self, order: &O) -> Result<Value, HardwareError> {
        self.submit("verifyOrder", order)
    }

    /// Places `order`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the order is rejected.
    pub fn place_order<O: Serialize>(&self, order: &O) -> Result<Value, HardwareError> {
        self.submit("placeOrder", order)
    }

    fn submit<O: Serialize>(&self, method: &str, order: &O) -> Result<Value, HardwareError> {
        let payload = serde_json::to_value(order).map_err(|err| HardwareError::decode("order", &err))?;
        let call = RpcCall::builder(ORDER_SERVICE, method).arg(payload).build()?;
        Ok(self.client.call(&call)?)
    }
}
