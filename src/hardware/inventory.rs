//! Inventory listing and identifier resolution.

use std::net::Ipv4Addr;

use serde_json::Value;

use super::{ACCOUNT_SERVICE, HardwareError, HardwareManager};
use crate::filter::{FilterBuilder, in_filter, numeric_filter, query_filter};
use crate::rpc::{RpcCall, RpcClient};

const LIST_MASK: &str = "mask[id, hostname, domain, hardwareStatusId, globalIdentifier, \
    fullyQualifiedDomainName, processorPhysicalCoreAmount, memoryCapacity, \
    primaryBackendIpAddress, primaryIpAddress, datacenter]";

const OBJECT_MASK: &str = "mask[id, globalIdentifier, fullyQualifiedDomainName, hostname, \
    domain, provisionDate, hardwareStatus, processorPhysicalCoreAmount, memoryCapacity, notes, \
    privateNetworkOnlyFlag, primaryBackendIpAddress, primaryIpAddress, networkManagementIpAddress, \
    userData, datacenter, networkComponents[id, status, speed, maxSpeed, name, ipmiMacAddress, \
    ipmiIpAddress, macAddress, primaryIpAddress, port, primarySubnet], \
    activeTransaction[id, transactionStatus[friendlyName, name]], \
    operatingSystem[softwareLicense[softwareDescription[manufacturer, name, version, \
    referenceCode]], passwords[username, password]], billingItem[id, nextInvoiceTotalRecurringAmount, \
    children[nextInvoiceTotalRecurringAmount], orderItem.order.userRecord[username]], \
    hourlyBillingFlag, tagReferences[id, tag[name, id]], networkVlans[id, vlanNumber, networkSpace], \
    remoteManagementAccounts[username, password]]";

/// Optional criteria narrowing [`HardwareManager::list_hardware`].
///
/// Unset fields do not constrain the listing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HardwareFilter {
    /// Servers tagged with any of these tags.
    pub tags: Vec<String>,
    /// Physical core count.
    pub cpus: Option<u32>,
    /// Memory capacity in GB.
    pub memory: Option<u64>,
    /// Hostname query, wildcards allowed.
    pub hostname: Option<String>,
    /// Domain query, wildcards allowed.
    pub domain: Option<String>,
    /// Datacenter short name, for example `dal05`.
    pub datacenter: Option<String>,
    /// Maximum NIC speed in Mbps.
    pub nic_speed: Option<u32>,
    /// Primary public IP address.
    pub public_ip: Option<String>,
    /// Primary private IP address.
    pub private_ip: Option<String>,
    /// Object mask overriding the default listing mask.
    pub mask: Option<String>,
}

impl HardwareFilter {
    /// Translates the criteria into an object filter rooted at `hardware`.
    #[must_use]
    pub fn to_object_filter(&self) -> Value {
        let query = |value: Option<&String>| value.map(String::as_str).map(query_filter);
        let tags = (!self.tags.is_empty()).then(|| in_filter(self.tags.iter().cloned()));
        FilterBuilder::new()
            .set_some(&["hardware", "tagReferences", "tag", "name"], tags)
            .set_some(
                &["hardware", "processorPhysicalCoreAmount"],
                self.cpus.map(|cpus| numeric_filter(u64::from(cpus))),
            )
            .set_some(&["hardware", "memoryCapacity"], self.memory.map(numeric_filter))
            .set_some(&["hardware", "hostname"], query(self.hostname.as_ref()))
            .set_some(&["hardware", "domain"], query(self.domain.as_ref()))
            .set_some(&["hardware", "datacenter", "name"], query(self.datacenter.as_ref()))
            .set_some(
                &["hardware", "networkComponents", "maxSpeed"],
                self.nic_speed.map(|speed| numeric_filter(u64::from(speed))),
            )
            .set_some(&["hardware", "primaryIpAddress"], query(self.public_ip.as_ref()))
            .set_some(
                &["hardware", "primaryBackendIpAddress"],
                query(self.private_ip.as_ref()),
            )
            .build()
    }
}

impl<C: RpcClient> HardwareManager<C> {
    /// Lists the account's servers matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the listing fails or
    /// [`HardwareError::Decode`] when it is not a list.
    pub fn list_hardware(&self, filter: &HardwareFilter) -> Result<Vec<Value>, HardwareError> {
        let object_filter = filter.to_object_filter();
        let mut builder = RpcCall::builder(ACCOUNT_SERVICE, "getHardware")
            .mask(filter.mask.as_deref().unwrap_or(LIST_MASK));
        if object_filter.as_object().is_some_and(|root| !root.is_empty()) {
            builder = builder.filter(object_filter);
        }
        match self.invoke(builder)? {
            Value::Array(servers) => Ok(servers),
            Value::Null => Ok(Vec::new()),
            other => Err(HardwareError::decode(
                "hardware list",
                &format!("expected an array, found {other}"),
            )),
        }
    }

    /// Returns the server record for `hardware_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Rpc`] when the lookup fails.
    pub fn get_hardware(&self, hardware_id: u64, mask: Option<&str>) -> Result<Value, HardwareError> {
        self.invoke(Self::server_call("getObject", hardware_id).mask(mask.unwrap_or(OBJECT_MASK)))
    }

    /// Resolves a numeric identifier, hostname or IP address to server ids.
    ///
    /// Hostname lookup runs before IP lookup; the first non-empty result
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when a lookup fails.
    pub fn resolve_ids(&self, identifier: &str) -> Result<Vec<u64>, HardwareError> {
        let trimmed = identifier.trim();
        if let Ok(id) = trimmed.parse::<u64>() {
            return Ok(vec![id]);
        }
        let by_hostname = self.ids_from_hostname(trimmed)?;
        if !by_hostname.is_empty() {
            return Ok(by_hostname);
        }
        self.ids_from_ip(trimmed)
    }

    /// Returns the ids of servers whose hostname matches `hostname`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when the listing fails.
    pub fn ids_from_hostname(&self, hostname: &str) -> Result<Vec<u64>, HardwareError> {
        let filter = HardwareFilter {
            hostname: Some(hostname.to_owned()),
            mask: Some(String::from("id")),
            ..HardwareFilter::default()
        };
        self.list_hardware(&filter).map(|servers| ids_of(&servers))
    }

    /// Returns the ids of servers owning `ip`, checking public addresses
    /// before private ones. Strings that are not IPv4 addresses match
    /// nothing and make no remote call.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when a listing fails.
    pub fn ids_from_ip(&self, ip: &str) -> Result<Vec<u64>, HardwareError> {
        if ip.parse::<Ipv4Addr>().is_err() {
            return Ok(Vec::new());
        }
        let public = HardwareFilter {
            public_ip: Some(ip.to_owned()),
            mask: Some(String::from("id")),
            ..HardwareFilter::default()
        };
        let by_public = ids_of(&self.list_hardware(&public)?);
        if !by_public.is_empty() {
            return Ok(by_public);
        }
        let private = HardwareFilter {
            private_ip: Some(ip.to_owned()),
            mask: Some(String::from("id")),
            ..HardwareFilter::default()
        };
        self.list_hardware(&private).map(|servers| ids_of(&servers))
    }
}

fn ids_of(servers: &[Value]) -> Vec<u64> {
    servers
        .iter()
        .filter_map(|server| server.get("id").and_then(Value::as_u64))
        .collect()
}
