//! Deserializers for numeric fields the API encodes as strings or numbers.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Integer(u64),
    Float(f64),
    Text(String),
}

/// Accepts `10`, `10.5`, `"10"`, `null` or `""`.
pub(super) fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        #[expect(
            clippy::cast_precision_loss,
            reason = "catalog capacities and fees are far below 2^52"
        )]
        Some(NumberOrText::Integer(value)) => Ok(Some(value as f64)),
        Some(NumberOrText::Float(value)) => Ok(Some(value)),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|err| D::Error::custom(format!("invalid number {text:?}: {err}"))),
    }
}

/// Accepts `55`, `"55"`, `null` or `""`.
pub(super) fn optional_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Integer(value)) => Ok(Some(value)),
        Some(NumberOrText::Float(value)) => Err(D::Error::custom(format!(
            "expected integer identifier, found {value}"
        ))),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(text)) => text
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|err| D::Error::custom(format!("invalid identifier {text:?}: {err}"))),
    }
}
