//! Structured-reply regex grammar and the parsed result it produces,
//! ported field-for-field from `email_service.py`'s `WORKITEM_ID_PATTERN`/
//! `STATUS_PATTERN`/`COMMENT_PATTERN`/`TIME_PATTERN` and
//! `parse_structured_reply`.

use almwork_domain::WorkItemStatus;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static WORKITEM_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[WorkItem-([a-f0-9-]{36})\]").expect("static workitem-id pattern is valid")
});

static STATUS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)STATUS:\s*(\w+)").expect("static status pattern is valid"));

static COMMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)COMMENT:\s*(.+?)(?:STATUS:|TIME:|$)").expect("static comment pattern is valid")
});

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TIME:\s*(\d+(?:\.\d+)?)").expect("static time pattern is valid"));

/// Extracts the work-item id embedded in a subject line like
/// `[WorkItem-<uuid>] Title`.
#[must_use]
pub fn extract_workitem_id(subject: &str) -> Option<Uuid> {
    let captures = WORKITEM_ID_PATTERN.captures(subject)?;
    Uuid::parse_str(&captures[1]).ok()
}

/// A structured reply's extracted fields. At least one field is always
/// present when this is returned at all (mirrors the original's
/// "return the dict if non-empty, else None").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredReply {
    pub status: Option<WorkItemStatus>,
    pub comment: Option<String>,
    pub time_spent: Option<f64>,
}

impl StructuredReply {
    fn is_empty(&self) -> bool {
        self.status.is_none() && self.comment.is_none() && self.time_spent.is_none()
    }
}

/// Parses `STATUS: <status> | COMMENT: <comment> | TIME: <hours>`-style
/// replies. Fields may appear in any order; unrecognized statuses are
/// dropped rather than rejecting the whole reply; a trailing `|` left over
/// from the comment's pipe-separated format is stripped.
#[must_use]
pub fn parse_structured_reply(body: &str) -> Option<StructuredReply> {
    if body.trim().is_empty() {
        return None;
    }

    let status = STATUS_PATTERN
        .captures(body)
        .and_then(|c| WorkItemStatus::parse_with_aliases(c[1].trim()));

    let comment = COMMENT_PATTERN.captures(body).and_then(|c| {
        let trimmed = c[1].trim();
        let stripped = trimmed.trim_end_matches(|ch: char| ch == '|' || ch.is_whitespace());
        if stripped.is_empty() {
            None
        } else {
            Some(stripped.to_string())
        }
    });

    let time_spent = TIME_PATTERN
        .captures(body)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|v| *v >= 0.0);

    let reply = StructuredReply {
        status,
        comment,
        time_spent,
    };
    if reply.is_empty() {
        None
    } else {
        Some(reply)
    }
}

/// A minimal, dependency-free address check: one `@`, a non-empty local
/// part, and a domain part containing at least one `.`. Not a full RFC
/// 5322 validator — just enough to reject obviously malformed recipients
/// before a send attempt.
#[must_use]
pub fn is_plausible_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_workitem_id_case_insensitively() {
        let id = Uuid::new_v4();
        let subject = format!("[workitem-{id}] Please update status");
        assert_eq!(extract_workitem_id(&subject), Some(id));
    }

    #[test]
    fn parses_all_three_fields_in_any_order() {
        let body = "TIME: 2.5 | STATUS: done | COMMENT: wrapped up the edge cases";
        let reply = parse_structured_reply(body).unwrap();
        assert_eq!(reply.status, Some(WorkItemStatus::Completed));
        assert_eq!(reply.time_spent, Some(2.5));
        assert_eq!(reply.comment.as_deref(), Some("wrapped up the edge cases"));
    }

    #[test]
    fn comment_is_dot_all_and_stops_before_next_field() {
        let body = "COMMENT: line one\nstill the comment\nSTATUS: active";
        let reply = parse_structured_reply(body).unwrap();
        assert_eq!(reply.comment.as_deref(), Some("line one\nstill the comment"));
        assert_eq!(reply.status, Some(WorkItemStatus::Active));
    }

    #[test]
    fn unknown_status_alias_is_dropped_not_rejected() {
        let body = "STATUS: onhold | COMMENT: waiting on a dependency";
        let reply = parse_structured_reply(body).unwrap();
        assert!(reply.status.is_none());
        assert_eq!(reply.comment.as_deref(), Some("waiting on a dependency"));
    }

    #[test]
    fn negative_time_is_dropped() {
        let body = "TIME: -3 | COMMENT: should not count";
        let reply = parse_structured_reply(body).unwrap();
        assert!(reply.time_spent.is_none());
    }

    #[test]
    fn body_with_no_recognized_fields_returns_none() {
        assert!(parse_structured_reply("just a regular email, no markers here").is_none());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(is_plausible_email("user@example.com"));
        assert!(!is_plausible_email("not-an-email"));
        assert!(!is_plausible_email("user@localhost"));
    }
}
