//! Resolution of human location keys to catalog regions.

use super::{LocationDescriptor, Package};
use crate::hardware::HardwareError;

/// Finds the region whose datacenter name equals `location_key` and returns
/// its region code together with its pricing descriptor.
///
/// Matching is exact and case-sensitive.
///
/// # Errors
///
/// Returns [`HardwareError::LocationNotFound`] naming `location_key` when no
/// region matches, including when the package has no regions.
pub fn resolve_location<'a>(
    package: &'a Package,
    location_key: &str,
) -> Result<(&'a str, &'a LocationDescriptor), HardwareError> {
    package
        .regions
        .iter()
        .find(|region| region.location.location.name == location_key)
        .map(|region| (region.keyname.as_str(), &region.location))
        .ok_or_else(|| HardwareError::LocationNotFound {
            location: location_key.to_owned(),
        })
}
