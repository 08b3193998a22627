use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The three status values the LLM extraction prompt is restricted to —
/// a narrower set than `almwork_domain::WorkItemStatus`, matching the
/// original extraction prompt's allowed values exactly.
pub const ALLOWED_STATUSES: [&str; 3] = ["draft", "active", "completed"];

/// Structured fields pulled out of a free-form email body by the LLM
/// fallback. Every field is independently optional: a response that only
/// mentions `time_spent` still yields a useful partial extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkInstructionExtraction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
}

impl WorkInstructionExtraction {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.comment.is_none()
            && self.time_spent.is_none()
            && self.next_steps.is_none()
    }

    /// Validates a raw JSON object the way the original
    /// `extract_work_instruction` validates the model's response: `status`
    /// is kept only if it's exactly one of [`ALLOWED_STATUSES`]; `comment`/
    /// `next_steps` are trimmed and kept only if non-empty; `time_spent` is
    /// parsed as a number (accepting a numeric string) and kept only if
    /// non-negative. Returns `None` if nothing survives validation, mirroring
    /// the original's "give up rather than return a mostly-empty record"
    /// behavior.
    #[must_use]
    pub fn from_raw_json(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;

        let status = obj
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase)
            .filter(|s| ALLOWED_STATUSES.contains(&s.as_str()));

        let comment = obj
            .get("comment")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let next_steps = obj
            .get("next_steps")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let time_spent = obj.get("time_spent").and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        });
        let time_spent = time_spent.filter(|v| *v >= 0.0);

        let extraction = Self {
            status,
            comment,
            time_spent,
            next_steps,
        };
        if extraction.is_empty() {
            None
        } else {
            Some(extraction)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_status_outside_allowed_set() {
        let raw = json!({ "status": "blocked" });
        assert!(WorkInstructionExtraction::from_raw_json(&raw).is_none());
    }

    #[test]
    fn accepts_case_insensitive_status() {
        let raw = json!({ "status": "Active" });
        let extraction = WorkInstructionExtraction::from_raw_json(&raw).unwrap();
        assert_eq!(extraction.status.as_deref(), Some("active"));
    }

    #[test]
    fn strips_whitespace_and_drops_empty_comment() {
        let raw = json!({ "comment": "   " });
        assert!(WorkInstructionExtraction::from_raw_json(&raw).is_none());

        let raw = json!({ "comment": "  done early  " });
        let extraction = WorkInstructionExtraction::from_raw_json(&raw).unwrap();
        assert_eq!(extraction.comment.as_deref(), Some("done early"));
    }

    #[test]
    fn rejects_negative_time_spent() {
        let raw = json!({ "time_spent": -1.5 });
        assert!(WorkInstructionExtraction::from_raw_json(&raw).is_none());
    }

    #[test]
    fn accepts_numeric_string_time_spent() {
        let raw = json!({ "time_spent": "3.5" });
        let extraction = WorkInstructionExtraction::from_raw_json(&raw).unwrap();
        assert_eq!(extraction.time_spent, Some(3.5));
    }

    #[test]
    fn all_fields_invalid_yields_none() {
        let raw = json!({ "status": "bogus", "time_spent": -1, "comment": "" });
        assert!(WorkInstructionExtraction::from_raw_json(&raw).is_none());
    }
}
