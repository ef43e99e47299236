//! Price selection with billing mode, fee and location tie-break rules.

use std::fmt;

use super::matcher::{Selector, match_items};
use super::{CandidatePrice, CatalogItem, LocationDescriptor};
use crate::hardware::HardwareError;

/// Fee structure requested by the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingMode {
    /// Prices must carry an `hourlyRecurringFee`.
    Hourly,
    /// Prices must carry a `recurringFee`.
    Monthly,
}

impl BillingMode {
    /// Maps the `useHourlyPricing` flag to a billing mode.
    #[must_use]
    pub const fn from_hourly(hourly: bool) -> Self {
        if hourly { Self::Hourly } else { Self::Monthly }
    }

    /// Returns `true` for hourly billing.
    #[must_use]
    pub const fn is_hourly(self) -> bool {
        matches!(self, Self::Hourly)
    }

    /// Returns `true` when `price` carries the fee field of this mode.
    #[must_use]
    pub const fn matches(self, price: &CandidatePrice) -> bool {
        match self {
            Self::Hourly => price.hourly_recurring_fee.is_some(),
            Self::Monthly => price.recurring_fee.is_some(),
        }
    }
}

/// Additional fee constraint applied before location matching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeeRule {
    /// Any fee is acceptable.
    #[default]
    Any,
    /// Only prices whose fees are all zero qualify.
    ZeroOnly,
}

impl FeeRule {
    fn accepts(self, price: &CandidatePrice) -> bool {
        match self {
            Self::Any => true,
            Self::ZeroOnly => price.is_free(),
        }
    }
}

/// Order concern being priced. Its display form names the selection in
/// resolution errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PriceOption {
    /// Zero-fee item of a mandatory category such as `pri_ip_addresses`.
    Default(String),
    /// Operating system by key name.
    Os(String),
    /// Port speed in Mbps with the requested network visibility.
    PortSpeed {
        /// Link speed in Mbps.
        speed: u32,
        /// Whether only the private network is requested.
        private_only: bool,
    },
    /// Bandwidth allotment.
    Bandwidth {
        /// Whether metered bandwidth is required.
        metered: bool,
    },
    /// Optional extra by key name.
    Extra(String),
}

impl PriceOption {
    /// Returns the catalog selector for this concern.
    #[must_use]
    pub fn selector(&self) -> Selector<'_> {
        match self {
            Self::Default(category) => Selector::Category(category),
            Self::Os(key_name) => Selector::CategoryKeyName {
                category: "os",
                key_name,
            },
            Self::PortSpeed {
                speed,
                private_only,
            } => Selector::PortSpeed {
                capacity: *speed,
                private_only: *private_only,
            },
            Self::Bandwidth { metered } => Selector::Bandwidth { metered: *metered },
            Self::Extra(key_name) => Selector::KeyName(key_name),
        }
    }

    /// Returns the fee constraint for this concern.
    #[must_use]
    pub const fn fee_rule(&self) -> FeeRule {
        match self {
            Self::Default(_) => FeeRule::ZeroOnly,
            _ => FeeRule::Any,
        }
    }
}

impl fmt::Display for PriceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default(category) => write!(f, "'{category}' option"),
            Self::Os(key_name) => write!(f, "os: '{key_name}'"),
            Self::PortSpeed { speed, .. } => write!(f, "port speed: '{speed}'"),
            Self::Bandwidth { .. } => f.write_str("bandwidth option"),
            Self::Extra(key_name) => write!(f, "extra option, '{key_name}'"),
        }
    }
}

/// Picks one price identifier from `candidates`.
///
/// Prices lacking the fee field of `billing`, or rejected by `fees`, are
/// dropped. Among the survivors the first price whose location group belongs
/// to `location` wins; failing that, the first price without a location group
/// is used. Returns `None` when neither exists.
#[must_use]
pub fn resolve_price<'a, I>(
    candidates: I,
    billing: BillingMode,
    fees: FeeRule,
    location: &LocationDescriptor,
) -> Option<u64>
where
    I: IntoIterator<Item = &'a CandidatePrice>,
{
    let mut fallback = None;
    for price in candidates {
        if !billing.matches(price) || !fees.accepts(price) {
            continue;
        }
        match price.location_group_id {
            Some(group) if location.has_price_group(group) => return Some(price.id),
            Some(_) => {}
            None => {
                fallback.get_or_insert(price.id);
            }
        }
    }
    fallback
}

/// Matches the items relevant to `option` and resolves their price.
///
/// # Errors
///
/// Returns [`HardwareError::NoValidPrice`] naming `option` when no item
/// matches or no price survives filtering.
pub fn resolve_option(
    items: &[CatalogItem],
    option: &PriceOption,
    billing: BillingMode,
    location: &LocationDescriptor,
) -> Result<u64, HardwareError> {
    let matched = match_items(items, &option.selector());
    let prices = matched.iter().flat_map(|item| item.prices.iter());
    resolve_price(prices, billing, option.fee_rule(), location)
        .ok_or_else(|| HardwareError::NoValidPrice(option.clone()))
}
