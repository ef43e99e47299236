//! Bare-metal hardware manager.
//!
//! [`HardwareManager`] orchestrates remote calls for provisioning and
//! managing dedicated servers. Order generation is delegated to the pure
//! catalog resolvers; every other operation is a short, sequential exchange
//! with the [`RpcClient`] it was built with.

mod error;
mod inventory;
mod lifecycle;
mod order;
mod telemetry;

use serde_json::Value;

use crate::ordering::OrderingManager;
use crate::rpc::{RpcCall, RpcCallBuilder, RpcClient};

pub use error::HardwareError;
pub use inventory::HardwareFilter;
pub use lifecycle::{
    CANCEL_TICKET_MESSAGE, DEFAULT_CANCEL_REASON, FirmwareReflash, FirmwareUpdate, HardwareEdit,
    cancellation_reasons,
};
pub use order::{
    CreateOptions, CreateRequest, CreateRequestBuilder, DEFAULT_PRICE_CATEGORIES, EXTRA_CATEGORIES,
    HardwareSpec, OptionEntry, OrderDict, PriceRef, SshKeyGroup, build_order,
};
pub use telemetry::BandwidthAllocation;

/// Catalog key name of the bare-metal package.
pub const BARE_METAL_SERVER: &str = "BARE_METAL_SERVER";
/// Service owning server instances.
pub const HARDWARE_SERVICE: &str = "SoftLayer_Hardware_Server";
/// Service listing account-scoped resources.
pub const ACCOUNT_SERVICE: &str = "SoftLayer_Account";

/// Manages bare-metal servers through an [`RpcClient`].
#[derive(Clone, Debug)]
pub struct HardwareManager<C: RpcClient> {
    client: C,
    ordering: OrderingManager<C>,
}

impl<C: RpcClient + Clone> HardwareManager<C> {
    /// Creates a manager and an ordering helper sharing `client`.
    #[must_use]
    pub fn new(client: C) -> Self {
        let ordering = OrderingManager::new(client.clone());
        Self { client, ordering }
    }
}

impl<C: RpcClient> HardwareManager<C> {
    /// Creates a manager using an existing ordering helper.
    #[must_use]
    pub const fn with_ordering_manager(client: C, ordering: OrderingManager<C>) -> Self {
        Self { client, ordering }
    }

    /// Returns the ordering helper used for package lookup and submission.
    #[must_use]
    pub const fn ordering_manager(&self) -> &OrderingManager<C> {
        &self.ordering
    }

    fn server_call(method: &str, hardware_id: u64) -> RpcCallBuilder {
        RpcCall::builder(HARDWARE_SERVICE, method).identifier(hardware_id)
    }

    fn invoke(&self, builder: RpcCallBuilder) -> Result<Value, HardwareError> {
        let call = builder.build()?;
        Ok(self.client.call(&call)?)
    }
}

#[cfg(test)]
mod tests;
