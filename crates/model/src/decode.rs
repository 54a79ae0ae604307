//! Bag decoding from the storage service JSON representation.

use serde_json::Value;

use crate::bag::Bag;
use crate::error::ModelError;

/// Decode a bag from JSON, checking the fields the browser depends on.
pub fn decode_bag(json: &str) -> Result<Bag, ModelError> {
    let data: Value = serde_json::from_str(json)?;

    // Report the missing section by name rather than as a generic serde error.
    for field in ["manifest", "location"] {
        if data.get(field).map_or(true, Value::is_null) {
            return Err(ModelError::MissingField(field));
        }
    }

    let bag: Bag = serde_json::from_value(data)?;
    Ok(bag)
}
