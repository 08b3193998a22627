use almwork_domain::Milestone;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::allocation::AllocationRoster;
use crate::error::MatcherError;

pub const MILESTONE_LABEL: &str = "Milestone";
pub const ALLOCATION_ROSTER_LABEL: &str = "AllocationRoster";

/// A row whose graph node id carries no meaning of its own (mirrors
/// `almwork_sprint::codec::KeyedRow`): `AllocationRoster` keys off
/// `resource_id`, not an `id` field of its own.
pub struct KeyedRow<T> {
    pub node_id: Uuid,
    pub value: T,
}

fn to_props<T: Serialize>(value: &T, what: &str) -> Result<Map<String, Value>, MatcherError> {
    match serde_json::to_value(value).map_err(|e| MatcherError::Codec(format!("{what}: {e}")))? {
        Value::Object(map) => Ok(map),
        _ => unreachable!("{what} always serializes to an object"),
    }
}

fn take_node_id(props: &mut Map<String, Value>) -> Result<Uuid, MatcherError> {
    props
        .remove("id")
        .and_then(|v| v.as_str().map(str::to_string))
        .and_then(|s| Uuid::parse_str(&s).ok())
        .ok_or_else(|| MatcherError::Codec("row missing graph node id".into()))
}

/// A milestone's own `id` doubles as its node id, so no remapping is
/// needed on the way in or out.
pub fn milestone_to_props(milestone: &Milestone) -> Result<Map<String, Value>, MatcherError> {
    to_props(milestone, "milestone")
}

pub fn milestone_from_props(props: Map<String, Value>) -> Result<Milestone, MatcherError> {
    serde_json::from_value(Value::Object(props)).map_err(|e| MatcherError::Codec(e.to_string()))
}

pub fn roster_to_props(roster: &AllocationRoster) -> Result<Map<String, Value>, MatcherError> {
    to_props(roster, "allocation roster")
}

pub fn roster_from_row(mut props: Map<String, Value>) -> Result<KeyedRow<AllocationRoster>, MatcherError> {
    let node_id = take_node_id(&mut props)?;
    let value =
        serde_json::from_value(Value::Object(props)).map_err(|e| MatcherError::Codec(e.to_string()))?;
    Ok(KeyedRow { node_id, value })
}
