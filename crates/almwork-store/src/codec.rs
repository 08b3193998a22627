use almwork_domain::WorkItem;
use serde_json::{Map, Value};

use crate::error::StoreError;

pub const LABEL: &str = "WorkItem";

/// Converts a [`WorkItem`] snapshot to graph node properties.
///
/// The work-item's logical `id` (stable across every version) is renamed to
/// `item_id` so it never collides with the node's own identity, which the
/// graph executor assigns fresh per version. `is_current` is a bookkeeping
/// flag the store flips as the `NEXT_VERSION` chain grows; it is stripped
/// back out in [`from_node_props`].
pub fn to_node_props(item: &WorkItem, is_current: bool) -> Result<Map<String, Value>, StoreError> {
    let value = serde_json::to_value(item).map_err(|e| {
        StoreError::Validation(vec![format!("failed to serialize work item: {e}")])
    })?;
    let mut props = match value {
        Value::Object(map) => map,
        _ => unreachable!("WorkItem always serializes to an object"),
    };
    let id = props
        .remove("id")
        .expect("WorkItem::id is always present after serialization");
    props.insert("item_id".into(), id);
    props.insert("is_current".into(), Value::Bool(is_current));
    Ok(props)
}

/// Reconstructs a [`WorkItem`] from node properties produced by
/// [`to_node_props`], discarding the graph-assigned node `id` and the
/// `is_current` bookkeeping flag.
pub fn from_node_props(mut props: Map<String, Value>) -> Result<WorkItem, StoreError> {
    props.remove("id");
    props.remove("is_current");
    let item_id = props
        .remove("item_id")
        .ok_or_else(|| StoreError::Validation(vec!["node missing item_id".into()]))?;
    props.insert("id".into(), item_id);
    serde_json::from_value(Value::Object(props))
        .map_err(|e| StoreError::Validation(vec![format!("failed to decode work item: {e}")]))
}
