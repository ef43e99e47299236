//! Resolution of size keys to package presets.

use super::Package;
use crate::hardware::HardwareError;

/// Returns the identifier of the preset matching `size`, either by key name
/// or by numeric identifier. Public presets are searched before
/// account-restricted ones.
///
/// # Errors
///
/// Returns [`HardwareError::SizeNotFound`] naming `size` when no preset
/// matches.
pub fn resolve_preset(package: &Package, size: &str) -> Result<u64, HardwareError> {
    let numeric = size.parse::<u64>().ok();
    package
        .presets()
        .find(|preset| preset.key_name == size || Some(preset.id) == numeric)
        .map(|preset| preset.id)
        .ok_or_else(|| HardwareError::SizeNotFound {
            size: size.to_owned(),
        })
}
