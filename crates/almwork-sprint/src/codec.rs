use almwork_domain::{Backlog, Sprint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::SprintError;

pub const SPRINT_LABEL: &str = "Sprint";
pub const BACKLOG_LABEL: &str = "Backlog";
pub const ROSTER_LABEL: &str = "SprintRoster";

/// A row whose graph node id carries no meaning of its own (`Backlog` and
/// `SprintRoster` key off `project_id`/`sprint_id` properties, not an `id`
/// field), so the graph-assigned node id has to travel alongside the
/// decoded value instead of living inside it.
pub struct KeyedRow<T> {
    pub node_id: Uuid,
    pub value: T,
}

/// Membership list for one sprint's `ASSIGNED_TO_SPRINT` set. Kept as its
/// own labelled row (mirroring how `Backlog` carries `work_item_ids`
/// inline) rather than as graph edges onto work-item nodes, because a
/// work-item's node id changes on every version bump (`almwork_store`'s
/// `NEXT_VERSION` chain) and an edge pinned to one version would go stale
/// the moment the item is next updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintRoster {
    pub sprint_id: Uuid,
    #[serde(default)]
    pub work_item_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}

fn to_props<T: Serialize>(value: &T, what: &str) -> Result<Map<String, Value>, SprintError> {
    match serde_json::to_value(value).map_err(|e| SprintError::Codec(format!("{what}: {e}")))? {
        Value::Object(map) => Ok(map),
        _ => unreachable!("{what} always serializes to an object"),
    }
}

fn take_node_id(props: &mut Map<String, Value>) -> Result<Uuid, SprintError> {
    props
        .remove("id")
        .and_then(|v| v.as_str().map(str::to_string))
        .and_then(|s| Uuid::parse_str(&s).ok())
        .ok_or_else(|| SprintError::Codec("row missing graph node id".into()))
}

/// A sprint's own `id` doubles as its node id (like `Signature`), so no
/// remapping is needed on the way in or out.
pub fn sprint_to_props(sprint: &Sprint) -> Result<Map<String, Value>, SprintError> {
    to_props(sprint, "sprint")
}

pub fn sprint_from_props(props: Map<String, Value>) -> Result<Sprint, SprintError> {
    serde_json::from_value(Value::Object(props)).map_err(|e| SprintError::Codec(e.to_string()))
}

pub fn backlog_to_props(backlog: &Backlog) -> Result<Map<String, Value>, SprintError> {
    to_props(backlog, "backlog")
}

pub fn backlog_from_row(mut props: Map<String, Value>) -> Result<KeyedRow<Backlog>, SprintError> {
    let node_id = take_node_id(&mut props)?;
    let value =
        serde_json::from_value(Value::Object(props)).map_err(|e| SprintError::Codec(e.to_string()))?;
    Ok(KeyedRow { node_id, value })
}

pub fn roster_to_props(roster: &SprintRoster) -> Result<Map<String, Value>, SprintError> {
    to_props(roster, "sprint roster")
}

pub fn roster_from_row(mut props: Map<String, Value>) -> Result<KeyedRow<SprintRoster>, SprintError> {
    let node_id = take_node_id(&mut props)?;
    let value =
        serde_json::from_value(Value::Object(props)).map_err(|e| SprintError::Codec(e.to_string()))?;
    Ok(KeyedRow { node_id, value })
}
