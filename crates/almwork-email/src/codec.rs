use almwork_domain::{EmailMessage, EmailThread};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::EmailError;

pub const THREAD_LABEL: &str = "EmailThread";
pub const MESSAGE_LABEL: &str = "EmailMessage";

fn to_props<T: Serialize>(value: &T, what: &str) -> Result<Map<String, Value>, EmailError> {
    match serde_json::to_value(value).map_err(|e| EmailError::Codec(format!("{what}: {e}")))? {
        Value::Object(map) => Ok(map),
        _ => unreachable!("{what} always serializes to an object"),
    }
}

pub fn thread_to_props(thread: &EmailThread) -> Result<Map<String, Value>, EmailError> {
    to_props(thread, "email thread")
}

pub fn thread_from_props(props: Map<String, Value>) -> Result<EmailThread, EmailError> {
    serde_json::from_value(Value::Object(props)).map_err(|e| EmailError::Codec(e.to_string()))
}

pub fn message_to_props(message: &EmailMessage) -> Result<Map<String, Value>, EmailError> {
    to_props(message, "email message")
}

pub fn message_from_props(props: Map<String, Value>) -> Result<EmailMessage, EmailError> {
    serde_json::from_value(Value::Object(props)).map_err(|e| EmailError::Codec(e.to_string()))
}
