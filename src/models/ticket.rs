//! Improvement tickets - the feedback board.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{RecordId, Timestamp};

/// A ticket as sent by a writer.
///
/// `completed` accepts any JSON value and is coerced by truthiness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub completed: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl TicketDraft {
    pub fn new(id: impl Into<RecordId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A stored ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementTicket {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub completed: bool,
    /// Always serialized; `null` while open.
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

impl ImprovementTicket {
    /// Flip completion. Closing an open ticket stamps `now`; closing an
    /// already closed one keeps its stamp. Reopening clears it.
    pub fn set_completed(&mut self, completed: bool, now: Timestamp) {
        self.completed_at = match (completed, self.completed, self.completed_at.take()) {
            (false, _, _) => None,
            (true, true, Some(stamp)) => Some(stamp),
            (true, _, _) => Some(now),
        };
        self.completed = completed;
    }
}

/// JavaScript-style truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn test_open_ticket_serializes_null_completed_at() {
        let ticket = ImprovementTicket {
            id: "t1".into(),
            title: "Sort by map".to_string(),
            description: None,
            created_at: Timestamp::parse("2024-05-01T10:00:00.000Z").unwrap(),
            completed: false,
            completed_at: None,
        };
        let value = serde_json::to_value(&ticket).unwrap();
        assert_eq!(value["completedAt"], json!(null));
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_set_completed_round_trip() {
        let mut ticket = ImprovementTicket {
            id: "t1".into(),
            title: "x".to_string(),
            description: None,
            created_at: Timestamp::now(),
            completed: false,
            completed_at: None,
        };
        ticket.set_completed(true, Timestamp::now());
        assert!(ticket.completed_at.is_some());
        ticket.set_completed(false, Timestamp::now());
        assert!(ticket.completed_at.is_none());
    }

    #[test]
    fn test_closing_twice_keeps_first_stamp() {
        let first = Timestamp::parse("2024-05-01T10:00:00.000Z").unwrap();
        let later = Timestamp::parse("2024-05-03T10:00:00.000Z").unwrap();
        let mut ticket = ImprovementTicket {
            id: "t1".into(),
            title: "x".to_string(),
            description: None,
            created_at: Timestamp::now(),
            completed: false,
            completed_at: None,
        };
        ticket.set_completed(true, first.clone());
        ticket.set_completed(true, later.clone());
        assert_eq!(ticket.completed_at, Some(first));

        ticket.set_completed(false, later.clone());
        ticket.set_completed(true, later.clone());
        assert_eq!(ticket.completed_at, Some(later));
    }

    #[test]
    fn test_draft_defaults() {
        let draft: TicketDraft = serde_json::from_value(json!({"id": "a", "title": "x"})).unwrap();
        assert_eq!(draft.completed, Value::Null);
        assert!(draft.created_at.is_none());
    }
}
