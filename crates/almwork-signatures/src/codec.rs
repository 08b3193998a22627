use almwork_domain::Signature;
use serde_json::{Map, Value};

use crate::error::SignatureError;

pub const LABEL: &str = "Signature";

/// Converts a [`Signature`] to graph node properties. Unlike the work-item
/// store, a signature's own `id` doubles as its node id — there is no
/// version chain to disambiguate, so no renaming is needed.
pub fn to_node_props(signature: &Signature) -> Result<Map<String, Value>, SignatureError> {
    let value = serde_json::to_value(signature)
        .map_err(|e| SignatureError::Codec(format!("failed to serialize signature: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => unreachable!("Signature always serializes to an object"),
    }
}

pub fn from_node_props(props: Map<String, Value>) -> Result<Signature, SignatureError> {
    serde_json::from_value(Value::Object(props))
        .map_err(|e| SignatureError::Codec(format!("failed to decode signature: {e}")))
}
