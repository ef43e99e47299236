//! Bare-metal server management for the SoftLayer API.
//!
//! The crate resolves human selections (size, operating system, location,
//! port speed, extras) against the product catalog into purchase orders, and
//! exposes inventory, cancellation and telemetry operations for provisioned
//! servers. Every remote exchange goes through the [`RpcClient`] trait;
//! [`RestTransport`] implements it over the REST endpoint.

pub mod catalog;
pub mod config;
pub mod filter;
pub mod hardware;
pub mod ordering;
pub mod rest;
pub mod rpc;
pub mod test_support;

pub use catalog::{BillingMode, CatalogItem, CandidatePrice, LocationDescriptor, Package, PriceOption};
pub use config::{ConfigError, SoftLayerConfig};
pub use hardware::{
    BandwidthAllocation, CreateOptions, CreateRequest, CreateRequestBuilder, FirmwareReflash,
    FirmwareUpdate, HardwareEdit, HardwareError, HardwareFilter, HardwareManager, OrderDict,
};
pub use ordering::OrderingManager;
pub use rest::RestTransport;
pub use rpc::{RpcCall, RpcCallBuilder, RpcClient, RpcError};
