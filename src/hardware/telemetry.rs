//! Bandwidth, storage and component reads.

use serde::Serialize;
use serde_json::Value;

use super::{HardwareError, HardwareManager};
use crate::rpc::{RpcCall, RpcClient};

const METRIC_SERVICE: &str = "SoftLayer_Metric_Tracking_Object";

/// Bandwidth allotment and usage for the current billing cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BandwidthAllocation {
    /// Allotment `allocation` record, or `None` when the server has none.
    pub allotment: Option<Value>,
    /// Usage records for the current billing cycle.
    pub usage: Value,
}

impl<C: RpcClient> HardwareManager<C> {
    /// Returns the metric tracking object id of `hardware_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the lookup fails or
    /// [`HardwareError::Decode`] when the id is not numeric.
    pub fn get_tracking_id(&self, hardware_id: u64) -> Result<u64, HardwareError> {
        let value = self.invoke(Self::server_call("getMetricTrackingObjectId", hardware_id))?;
        value.as_u64().ok_or_else(|| {
            HardwareError::decode("tracking id", &format!("expected an integer, found {value}"))
        })
    }

    /// Returns bandwidth samples between `start` and `end`.
    ///
    /// `direction` is `public`, `private` or `both`; `rollup` is the sample
    /// period in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when the tracking id or the samples cannot be
    /// read.
    pub fn get_bandwidth_data(
        &self,
        hardware_id: u64,
        start: &str,
        end: &str,
        direction: &str,
        rollup: u32,
    ) -> Result<Value, HardwareError> {
        let tracking_id = self.get_tracking_id(hardware_id)?;
        self.invoke(
            RpcCall::builder(METRIC_SERVICE, "getBandwidthData")
                .identifier(tracking_id)
                .arg(start)
                .arg(end)
                .arg(direction)
                .arg(rollup),
        )
    }

    /// Returns the bandwidth allotment and billing cycle usage.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when either read fails.
    pub fn get_bandwidth_allocation(&self, hardware_id: u64) -> Result<BandwidthAllocation, HardwareError> {
        let detail = self.invoke(
            Self::server_call("getBandwidthAllotmentDetail", hardware_id)
                .mask("mask[allocation[amount]]"),
        )?;
        let usage = self.invoke(
            Self::server_call("getBillingCycleBandwidthUsage", hardware_id)
                .mask("mask[amountIn, amountOut, type]"),
        )?;
        let allotment = detail
            .get("allocation")
            .filter(|allocation| !allocation.is_null())
            .cloned();
        Ok(BandwidthAllocation { allotment, usage })
    }

    /// Returns network storage of `nas_type` (for example `ISCSI` or `NAS`)
    /// attached to `hardware_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the read fails.
    pub fn get_storage_details(&self, hardware_id: u64, nas_type: &str) -> Result<Value, HardwareError> {
        self.invoke(Self::server_call("getAttachedNetworkStorages", hardware_id).arg(nas_type))
    }

    /// Returns the host entry and credential allowed to reach attached
    /// storage, or `None` when none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the read fails.
    pub fn get_storage_credentials(&self, hardware_id: u64) -> Result<Option<Value>, HardwareError> {
        let host = self.invoke(
            Self::server_call("getAllowedHost", hardware_id)
                .mask("mask[name, credential[username, password]]"),
        )?;
        Ok((!host.is_null()).then_some(host))
    }

    /// Returns the hard drives installed in `hardware_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the read fails.
    pub fn get_hard_drives(&self, hardware_id: u64) -> Result<Value, HardwareError> {
        self.invoke(Self::server_call("getHardDrives", hardware_id))
    }
}
