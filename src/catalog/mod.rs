//! Typed snapshot of a product catalog package and the pure resolution
//! logic that turns human selections into price identifiers.
//!
//! The remote API returns loosely shaped JSON. Decoding it into the records
//! below fails fast when a required field is missing; optional data (fee
//! fields, location groups, attributes) is kept as explicit `Option`s or
//! empty collections so every predicate over it stays total.

mod lenient;
mod location;
mod matcher;
mod preset;
mod price;

use serde::Deserialize;
use serde_json::Value;

use crate::hardware::HardwareError;

pub use location::resolve_location;
pub use matcher::{Selector, match_items};
pub use preset::resolve_preset;
pub use price::{BillingMode, FeeRule, PriceOption, resolve_option, resolve_price};

/// Attribute marking a port speed item as private-network only.
pub const PRIVATE_NETWORK_ONLY: &str = "IS_PRIVATE_NETWORK_ONLY";
/// Attribute marking a port speed item as not link-aggregation capable.
pub const NON_LACP: &str = "NON_LACP";

/// Top-level catalog root for one orderable product.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Package identifier sent as `packageId` in orders.
    pub id: u64,
    /// Catalog key name, for example `BARE_METAL_SERVER`.
    #[serde(default)]
    pub key_name: Option<String>,
    /// Purchasable items.
    #[serde(default)]
    pub items: Vec<CatalogItem>,
    /// Regions the package can be ordered in.
    #[serde(default)]
    pub regions: Vec<Region>,
    /// Presets available to every account.
    #[serde(default)]
    pub active_presets: Vec<Preset>,
    /// Presets restricted to the calling account.
    #[serde(default)]
    pub account_restricted_active_presets: Vec<Preset>,
}

impl Package {
    /// Decodes a package from a raw API response.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Decode`] when a required field is missing or
    /// has the wrong type.
    pub fn from_value(value: Value) -> Result<Self, HardwareError> {
        Self::deserialize(value).map_err(|err| HardwareError::decode("package", &err))
    }

    /// Iterates over all presets, public ones first.
    pub fn presets(&self) -> impl Iterator<Item = &Preset> {
        self.active_presets
            .iter()
            .chain(&self.account_restricted_active_presets)
    }

    /// Returns `true` when at least one item belongs to `category`.
    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.items.iter().any(|item| item.category() == category)
    }
}

/// One purchasable catalog entry and its candidate prices.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Key name, unique within its category.
    pub key_name: String,
    /// Category the item belongs to.
    pub item_category: ItemCategory,
    /// Category dependent capacity (Mbps for port speeds, GB for bandwidth).
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub capacity: Option<f64>,
    /// Human readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Attribute markers such as [`PRIVATE_NETWORK_ONLY`].
    #[serde(default)]
    pub attributes: Vec<ItemAttribute>,
    /// Software details for operating system items.
    #[serde(default)]
    pub software_description: Option<SoftwareDescription>,
    /// Candidate prices in the order the API returned them.
    pub prices: Vec<CandidatePrice>,
}

impl CatalogItem {
    /// Returns the category code.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.item_category.category_code
    }

    /// Returns the capacity, treating an absent capacity as zero.
    #[must_use]
    pub fn capacity_or_zero(&self) -> f64 {
        self.capacity.unwrap_or_default()
    }

    /// Returns `true` when the item carries the attribute `key_name`.
    #[must_use]
    pub fn has_attribute(&self, key_name: &str) -> bool {
        self.attributes
            .iter()
            .any(|attribute| attribute.attribute_type_key_name == key_name)
    }

    /// Returns `true` for private-network-only items.
    #[must_use]
    pub fn is_private_network_only(&self) -> bool {
        self.has_attribute(PRIVATE_NETWORK_ONLY)
    }

    /// Returns `true` unless the item is marked [`NON_LACP`].
    #[must_use]
    pub fn is_bonded(&self) -> bool {
        !self.has_attribute(NON_LACP)
    }
}

/// Category reference of a catalog item.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemCategory {
    /// Category code, for example `port_speed` or `os`.
    pub category_code: String,
}

/// Attribute marker attached to a catalog item.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemAttribute {
    /// Attribute type key, for example `NON_LACP`.
    pub attribute_type_key_name: String,
}

/// Software details of an operating system item.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareDescription {
    /// Long human readable name.
    #[serde(default)]
    pub long_description: Option<String>,
    /// Provider reference code.
    #[serde(default)]
    pub reference_code: Option<String>,
}

/// One candidate price of a catalog item.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePrice {
    /// Price identifier sent to the order API.
    pub id: u64,
    /// Location group the price applies to; `None` applies everywhere.
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub location_group_id: Option<u64>,
    /// Monthly fee, present on prices usable for monthly billing.
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub recurring_fee: Option<f64>,
    /// Hourly fee, present on prices usable for hourly billing.
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub hourly_recurring_fee: Option<f64>,
}

impl CandidatePrice {
    /// Returns `true` when every fee present on the price is zero.
    #[must_use]
    pub fn is_free(&self) -> bool {
        [self.recurring_fee, self.hourly_recurring_fee]
            .into_iter()
            .flatten()
            .all(|fee| fee.abs() < f64::EPSILON)
    }
}

/// Region entry mapping a location key to its pricing descriptor.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Region {
    /// Region code sent as `location` in orders, for example `WASHINGTON_DC`.
    pub keyname: String,
    /// Human readable region description.
    #[serde(default)]
    pub description: Option<String>,
    /// Location descriptor holding the datacenter and its price groups.
    pub location: LocationDescriptor,
}

/// Pricing view of a location.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct LocationDescriptor {
    /// Datacenter backing the region.
    pub location: Datacenter,
}

impl LocationDescriptor {
    /// Returns `true` when `group_id` is one of the location's price groups.
    #[must_use]
    pub fn has_price_group(&self, group_id: u64) -> bool {
        self.location
            .price_groups
            .iter()
            .any(|group| group.id == group_id)
    }
}

/// Datacenter details of a region.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Datacenter {
    /// Datacenter identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Short location key, for example `wdc01`.
    pub name: String,
    /// Long display name, for example `Washington 1`.
    #[serde(default)]
    pub long_name: Option<String>,
    /// Price groups the datacenter belongs to.
    #[serde(default)]
    pub price_groups: Vec<PriceGroup>,
}

/// Location group sharing identical pricing.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PriceGroup {
    /// Location group identifier.
    pub id: u64,
}

/// Preconfigured bundle of components within a package.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Preset identifier sent as `presetId` in orders.
    pub id: u64,
    /// Preset key name, for example `S1270_8GB_2X1TBSATA_NORAID`.
    pub key_name: String,
    /// Human readable description.
    #[serde(default)]
    pub description: Option<String>,
}
