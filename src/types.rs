use serde::{Deserialize, Serialize};
use std::fmt;

/// Occurrence count accumulated per metric key
pub type Count = u64;

/// A normalized web-activity record.
///
/// Built once per JSON object by the parser. `hour` is derived from
/// `timestamp` at construction and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub action: String,
    pub page: String,
    pub session_id: String,
    pub timestamp: String,
    pub hour: String,
}

/// The six aggregation dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Action,
    Page,
    Hour,
    ActionPage,
    Session,
    HourAction,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 6] = [
        MetricCategory::Action,
        MetricCategory::Page,
        MetricCategory::Hour,
        MetricCategory::ActionPage,
        MetricCategory::Session,
        MetricCategory::HourAction,
    ];

    /// Textual tag, used only for display
    pub fn tag(&self) -> &'static str {
        match self {
            MetricCategory::Action => "action",
            MetricCategory::Page => "page",
            MetricCategory::Hour => "hour",
            MetricCategory::ActionPage => "action_page",
            MetricCategory::Session => "session",
            MetricCategory::HourAction => "hour_action",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity of one aggregated metric.
///
/// The category is the enum discriminant, so payload text can never be
/// confused with a category or a delimiter. The serde form (internally
/// tagged JSON) is the key encoding used between streaming phases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum MetricKey {
    Action { action: String },
    Page { page: String },
    Hour { hour: String },
    ActionPage { action: String, page: String },
    Session { session_id: String },
    HourAction { hour: String, action: String },
}

impl MetricKey {
    pub fn category(&self) -> MetricCategory {
        match self {
            MetricKey::Action { .. } => MetricCategory::Action,
            MetricKey::Page { .. } => MetricCategory::Page,
            MetricKey::Hour { .. } => MetricCategory::Hour,
            MetricKey::ActionPage { .. } => MetricCategory::ActionPage,
            MetricKey::Session { .. } => MetricCategory::Session,
            MetricKey::HourAction { .. } => MetricCategory::HourAction,
        }
    }
}

/// Raw `category:payload` rendering, with `_` joining composite payloads.
///
/// Ambiguous when payloads contain `_` or `:`, so it is only ever used for
/// logs and as a last-resort label.
impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.category().tag();
        match self {
            MetricKey::Action { action } => write!(f, "{}:{}", tag, action),
            MetricKey::Page { page } => write!(f, "{}:{}", tag, page),
            MetricKey::Hour { hour } => write!(f, "{}:{}", tag, hour),
            MetricKey::ActionPage { action, page } => write!(f, "{}:{}_{}", tag, action, page),
            MetricKey::Session { session_id } => write!(f, "{}:{}", tag, session_id),
            MetricKey::HourAction { hour, action } => write!(f, "{}:{}_{}", tag, hour, action),
        }
    }
}

/// A formatted result line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub label: String,
    pub count: Count,
}

impl OutputRecord {
    pub fn new(label: impl Into<String>, count: Count) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.label, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_category() {
        let key = MetricKey::ActionPage {
            action: "click".to_string(),
            page: "/home".to_string(),
        };
        assert_eq!(key.category(), MetricCategory::ActionPage);
        assert_eq!(key.to_string(), "action_page:click_/home");
    }

    #[test]
    fn test_payload_named_like_category_stays_distinct() {
        let action = MetricKey::Action {
            action: "session".to_string(),
        };
        let session = MetricKey::Session {
            session_id: "session".to_string(),
        };
        assert_ne!(action, session);
        assert_eq!(action.category(), MetricCategory::Action);
    }

    #[test]
    fn test_wire_encoding_has_no_delimiters() {
        let key = MetricKey::Page {
            page: "/a\tb\nc".to_string(),
        };
        let encoded = serde_json::to_string(&key).unwrap();
        assert!(!encoded.contains('\t'));
        assert!(!encoded.contains('\n'));
        assert_eq!(encoded, r#"{"category":"page","page":"/a\tb\nc"}"#);

        let decoded: MetricKey = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_output_record_display() {
        let record = OutputRecord::new("Acción [click]", 2);
        assert_eq!(record.to_string(), "Acción [click]\t2");
    }
}
