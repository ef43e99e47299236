//! Order dictionary generation for bare-metal servers.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{BARE_METAL_SERVER, HardwareError, HardwareManager};
use crate::catalog::{
    BillingMode, CatalogItem, Package, PriceOption, resolve_location, resolve_option,
    resolve_preset,
};
use crate::rpc::RpcClient;

/// Zero-fee categories every bare-metal order carries.
pub const DEFAULT_PRICE_CATEGORIES: [&str; 3] =
    ["pri_ip_addresses", "vpn_management", "remote_management"];

/// Categories offered as optional extras.
pub const EXTRA_CATEGORIES: [&str; 3] = [
    "pri_ipv6_addresses",
    "static_ipv6_addresses",
    "sec_ip_addresses",
];

const PACKAGE_MASK: &str = "mask[id, keyName, \
    items[keyName, capacity, description, attributes[attributeTypeKeyName], \
    itemCategory[categoryCode], softwareDescription[longDescription, referenceCode], \
    prices[id, locationGroupId, recurringFee, hourlyRecurringFee]], \
    regions[keyname, description, location[location[id, name, longName, priceGroups[id]]]], \
    activePresets[id, keyName, description], accountRestrictedActivePresets[id, keyName, description]]";

/// Human selections describing one server to provision.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateRequest {
    /// Server hostname.
    pub hostname: String,
    /// Server domain.
    pub domain: String,
    /// Preset key name or numeric preset identifier.
    pub size: String,
    /// Operating system item key name.
    pub os: String,
    /// Datacenter key, for example `wdc01`.
    pub location: String,
    /// Uplink speed in Mbps.
    pub port_speed: u32,
    /// Whether hourly billing is requested.
    pub hourly: bool,
    /// Whether the server should only reach the private network.
    pub no_public: bool,
    /// Extra item key names.
    pub extras: Vec<String>,
    /// SSH key identifiers installed on the server.
    pub ssh_keys: Vec<u64>,
    /// Provisioning script URI run after the OS install.
    pub post_uri: Option<String>,
}

impl CreateRequest {
    /// Returns a builder for the request.
    #[must_use]
    pub fn builder() -> CreateRequestBuilder {
        CreateRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Validation`] when a string field is empty or
    /// the port speed is zero.
    pub fn validate(&self) -> Result<(), HardwareError> {
        let required = [
            ("hostname", &self.hostname),
            ("domain", &self.domain),
            ("size", &self.size),
            ("os", &self.os),
            ("location", &self.location),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(HardwareError::Validation((*field).to_owned()));
        }
        if self.port_speed == 0 {
            return Err(HardwareError::Validation(String::from("port_speed")));
        }
        Ok(())
    }
}

/// Builder for [`CreateRequest`] that trims inputs and validates on build.
///
/// Hourly billing is on unless disabled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateRequestBuilder {
    hostname: String,
    domain: String,
    size: String,
    os: String,
    location: String,
    port_speed: u32,
    hourly: bool,
    no_public: bool,
    extras: Vec<String>,
    ssh_keys: Vec<u64>,
    post_uri: Option<String>,
}

impl Default for CreateRequestBuilder {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            domain: String::new(),
            size: String::new(),
            os: String::new(),
            location: String::new(),
            port_speed: 0,
            hourly: true,
            no_public: false,
            extras: Vec::new(),
            ssh_keys: Vec::new(),
            post_uri: None,
        }
    }
}

impl CreateRequestBuilder {
    /// Creates an empty builder with hourly billing enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hostname.
    #[must_use]
    pub fn hostname(mut self, value: impl Into<String>) -> Self {
        self.hostname = value.into();
        self
    }

    /// Sets the domain.
    #[must_use]
    pub fn domain(mut self, value: impl Into<String>) -> Self {
        self.domain = value.into();
        self
    }

    /// Sets the preset key name.
    #[must_use]
    pub fn size(mut self, value: impl Into<String>) -> Self {
        self.size = value.into();
        self
    }

    /// Sets the operating system key name.
    #[must_use]
    pub fn os(mut self, value: impl Into<String>) -> Self {
        self.os = value.into();
        self
    }

    /// Sets the datacenter key.
    #[must_use]
    pub fn location(mut self, value: impl Into<String>) -> Self {
        self.location = value.into();
        self
    }

    /// Sets the port speed in Mbps.
    #[must_use]
    pub const fn port_speed(mut self, value: u32) -> Self {
        self.port_speed = value;
        self
    }

    /// Chooses hourly (`true`) or monthly (`false`) billing.
    #[must_use]
    pub const fn hourly(mut self, value: bool) -> Self {
        self.hourly = value;
        self
    }

    /// Restricts the server to the private network.
    #[must_use]
    pub const fn no_public(mut self, value: bool) -> Self {
        self.no_public = value;
        self
    }

    /// Adds an extra item key name.
    #[must_use]
    pub fn extra(mut self, value: impl Into<String>) -> Self {
        self.extras.push(value.into());
        self
    }

    /// Adds an SSH key identifier.
    #[must_use]
    pub fn ssh_key(mut self, value: u64) -> Self {
        self.ssh_keys.push(value);
        self
    }

    /// Sets the provisioning script URI.
    #[must_use]
    pub fn post_uri(mut self, value: Option<String>) -> Self {
        self.post_uri = value;
        self
    }

    /// Builds and validates the [`CreateRequest`], trimming string inputs.
    /// Blank extras and a blank provisioning URI are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Validation`] when a required field is empty.
    pub fn build(self) -> Result<CreateRequest, HardwareError> {
        let request = CreateRequest {
            hostname: self.hostname.trim().to_owned(),
            domain: self.domain.trim().to_owned(),
            size: self.size.trim().to_owned(),
            os: self.os.trim().to_owned(),
            location: self.location.trim().to_owned(),
            port_speed: self.port_speed,
            hourly: self.hourly,
            no_public: self.no_public,
            extras: self
                .extras
                .iter()
                .map(|extra| extra.trim())
                .filter(|extra| !extra.is_empty())
                .map(str::to_owned)
                .collect(),
            ssh_keys: self.ssh_keys,
            post_uri: self
                .post_uri
                .map(|uri| uri.trim().to_owned())
                .filter(|uri| !uri.is_empty()),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Purchase order payload accepted by `verifyOrder` and `placeOrder`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDict {
    /// Exactly one server description.
    pub hardware: Vec<HardwareSpec>,
    /// Region code, for example `WASHINGTON_DC`.
    pub location: String,
    /// Catalog package identifier.
    pub package_id: u64,
    /// Preset identifier.
    pub preset_id: u64,
    /// Resolved prices in submission order.
    pub prices: Vec<PriceRef>,
    /// Whether hourly billing is used.
    pub use_hourly_pricing: bool,
    /// Provisioning scripts, present only when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provision_scripts: Option<Vec<String>>,
    /// SSH key groups, present only when keys were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_keys: Option<Vec<SshKeyGroup>>,
}

/// Hostname and domain of the ordered server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HardwareSpec {
    /// Server hostname.
    pub hostname: String,
    /// Server domain.
    pub domain: String,
}

/// Reference to a resolved price.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct PriceRef {
    /// Price identifier.
    pub id: u64,
}

/// SSH keys applied to one server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshKeyGroup {
    /// SSH key identifiers.
    pub ssh_key_ids: Vec<u64>,
}

/// Choices offered when ordering bare-metal servers.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CreateOptions {
    /// Datacenters the package can be ordered in.
    pub locations: Vec<OptionEntry>,
    /// Presets, public ones first.
    pub sizes: Vec<OptionEntry>,
    /// Operating systems.
    pub operating_systems: Vec<OptionEntry>,
    /// Port speeds keyed by capacity.
    pub port_speeds: Vec<OptionEntry>,
    /// Optional extras.
    pub extras: Vec<OptionEntry>,
}

/// A selectable key and its display name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct OptionEntry {
    /// Value to pass back in a [`CreateRequest`].
    pub key: String,
    /// Human readable name.
    pub name: String,
}

impl OptionEntry {
    fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// Resolves `request` against `package` into an order payload.
///
/// Steps run in a fixed order and the first failure aborts the build:
/// location, catalog emptiness, size, then prices for the default
/// categories, the operating system, bandwidth (only when the package sells
/// it), port speed and each extra.
///
/// # Errors
///
/// Returns the [`HardwareError`] of the first selection that cannot be
/// resolved, naming the offending key.
pub fn build_order(package: &Package, request: &CreateRequest) -> Result<OrderDict, HardwareError> {
    let (region, location) = resolve_location(package, &request.location)?;
    if package.items.is_empty() {
        return Err(HardwareError::EmptyCatalog {
            key_name: package
                .key_name
                .clone()
                .unwrap_or_else(|| package.id.to_string()),
        });
    }
    let preset_id = resolve_preset(package, &request.size)?;
    let billing = BillingMode::from_hourly(request.hourly);

    let prices = price_options(package, request)
        .iter()
        .map(|option| resolve_option(&package.items, option, billing, location))
        .map(|resolved| resolved.map(|id| PriceRef { id }))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OrderDict {
        hardware: vec![HardwareSpec {
            hostname: request.hostname.clone(),
            domain: request.domain.clone(),
        }],
        location: region.to_owned(),
        package_id: package.id,
        preset_id,
        prices,
        use_hourly_pricing: billing.is_hourly(),
        provision_scripts: request.post_uri.clone().map(|uri| vec![uri]),
        ssh_keys: (!request.ssh_keys.is_empty()).then(|| {
            vec![SshKeyGroup {
                ssh_key_ids: request.ssh_keys.clone(),
            }]
        }),
    })
}

fn price_options(package: &Package, request: &CreateRequest) -> Vec<PriceOption> {
    let mut options: Vec<PriceOption> = DEFAULT_PRICE_CATEGORIES
        .iter()
        .map(|category| PriceOption::Default((*category).to_owned()))
        .collect();
    options.push(PriceOption::Os(request.os.clone()));
    if package.has_category("bandwidth") {
        options.push(PriceOption::Bandwidth {
            metered: request.hourly || request.no_public,
        });
    }
    options.push(PriceOption::PortSpeed {
        speed: request.port_speed,
        private_only: request.no_public,
    });
    options.extend(request.extras.iter().cloned().map(PriceOption::Extra));
    options
}

fn create_options(package: &Package) -> CreateOptions {
    let locations = package
        .regions
        .iter()
        .map(|region| {
            let datacenter = &region.location.location;
            OptionEntry::new(
                datacenter.name.as_str(),
                datacenter.long_name.as_deref().unwrap_or(&datacenter.name),
            )
        })
        .collect();
    let sizes = package
        .presets()
        .map(|preset| {
            OptionEntry::new(
                preset.key_name.as_str(),
                preset.description.as_deref().unwrap_or(&preset.key_name),
            )
        })
        .collect();
    let items_in = |category: &str| {
        package
            .items
            .iter()
            .filter(|item| item.category() == category)
            .collect::<Vec<_>>()
    };
    let operating_systems = items_in("os")
        .into_iter()
        .map(|item| {
            let name = item
                .software_description
                .as_ref()
                .and_then(|software| software.long_description.as_deref());
            OptionEntry::new(item.key_name.as_str(), name.unwrap_or(&item.key_name))
        })
        .collect();
    let port_speeds = items_in("port_speed")
        .into_iter()
        .map(|item| OptionEntry::new(item.capacity_or_zero().to_string(), display_name(item)))
        .collect();
    let extras = EXTRA_CATEGORIES
        .iter()
        .copied()
        .flat_map(items_in)
        .map(|item| OptionEntry::new(item.key_name.as_str(), display_name(item)))
        .collect();

    CreateOptions {
        locations,
        sizes,
        operating_systems,
        port_speeds,
        extras,
    }
}

fn display_name(item: &CatalogItem) -> &str {
    item.description.as_deref().unwrap_or(&item.key_name)
}

impl<C: RpcClient> HardwareManager<C> {
    /// Fetches and decodes the bare-metal catalog package.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::PackageNotFound`] when the package does not
    /// exist, or [`HardwareError::Decode`] when it is malformed.
    pub fn get_package(&self) -> Result<Package, HardwareError> {
        let raw = self
            .ordering
            .get_package_by_key(BARE_METAL_SERVER, Some(PACKAGE_MASK))?;
        Package::from_value(raw)
    }

    /// Lists the locations, sizes, operating systems, port speeds and extras
    /// available for ordering.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when the package cannot be fetched.
    pub fn get_create_options(&self) -> Result<CreateOptions, HardwareError> {
        self.get_package().map(|package| create_options(&package))
    }

    /// Translates `request` into an order payload using a freshly fetched
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when the catalog cannot be fetched or a
    /// selection cannot be resolved.
    pub fn generate_create_dict(&self, request: &CreateRequest) -> Result<OrderDict, HardwareError> {
        let package = self.get_package()?;
        let order = build_order(&package, request)?;
        debug!(
            package_id = order.package_id,
            preset_id = order.preset_id,
            location = %order.location,
            prices = order.prices.len(),
            "generated bare metal order"
        );
        Ok(order)
    }

    /// Generates the order for `request` and asks the API to verify it.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when generation or verification fails.
    pub fn verify_order(&self, request: &CreateRequest) -> Result<Value, HardwareError> {
        let order = self.generate_create_dict(request)?;
        self.ordering.verify_order(&order)
    }

    /// Generates the order for `request` and places it.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when generation or placement fails.
    pub fn place_order(&self, request: &CreateRequest) -> Result<Value, HardwareError> {
        let order = self.generate_create_dict(request)?;
        self.ordering.place_order(&order)
    }
}
