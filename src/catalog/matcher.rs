//! Selection of catalog items relevant to one order concern.

use super::CatalogItem;

/// Criterion used to pick catalog items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector<'a> {
    /// Exact key name equality, across categories.
    KeyName(&'a str),
    /// Category code equality.
    Category(&'a str),
    /// Category code and key name equality.
    CategoryKeyName {
        /// Required category code.
        category: &'a str,
        /// Required key name.
        key_name: &'a str,
    },
    /// Port speed items with the given capacity and network visibility.
    /// Non-bonded (`NON_LACP`) variants never match.
    PortSpeed {
        /// Link speed in Mbps.
        capacity: u32,
        /// Whether the uplink is private-network only.
        private_only: bool,
    },
    /// Bandwidth items. Metered selection takes zero-capacity items
    /// (pay-as-you-go or private-only); otherwise a fixed allotment.
    Bandwidth {
        /// Whether metered bandwidth is required.
        metered: bool,
    },
}

impl Selector<'_> {
    /// Returns `true` when `item` satisfies the selector.
    #[must_use]
    pub fn matches(&self, item: &CatalogItem) -> bool {
        match *self {
            Self::KeyName(key_name) => item.key_name == key_name,
            Self::Category(category) => item.category() == category,
            Self::CategoryKeyName { category, key_name } => {
                item.category() == category && item.key_name == key_name
            }
            Self::PortSpeed {
                capacity,
                private_only,
            } => {
                item.category() == "port_speed"
                    && item
                        .capacity_or_zero()
                        .total_cmp(&f64::from(capacity))
                        .is_eq()
                    && item.is_private_network_only() == private_only
                    && item.is_bonded()
            }
            Self::Bandwidth { metered } => {
                let unlimited = item.capacity_or_zero().abs() < f64::EPSILON;
                item.category() == "bandwidth" && unlimited == metered
            }
        }
    }
}

/// Returns the items matching `selector`, preserving catalog order.
///
/// An empty result means the selection cannot be priced; callers report it
/// as a resolution failure.
#[must_use]
pub fn match_items<'a>(items: &'a [CatalogItem], selector: &Selector<'_>) -> Vec<&'a CatalogItem> {
    items.iter().filter(|item| selector.matches(item)).collect()
}
