use chrono::NaiveDate;
use serde_json::Value;

/// Display text for records without a concrete date.
pub const TBD: &str = "TBD";

/// One element of the model's JSON array, before any coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub event: Option<Value>,
    pub date: Option<Value>,
    pub kind: Option<Value>,
    pub weight: Option<Value>,
}

impl RawRecord {
    /// Non-object values still yield a record, with every field absent.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => RawRecord {
                event: map.remove("event"),
                date: map.remove("date"),
                kind: map.remove("type"),
                weight: map.remove("weight"),
            },
            _ => RawRecord::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Scheduled(NaiveDate),
    Unscheduled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub event: Option<String>,
    pub course: String,
    pub kind: Option<String>,
    pub weight: f64,
    pub schedule: Schedule,
}

impl NormalizedRecord {
    pub fn resolved_date(&self) -> Option<NaiveDate> {
        match self.schedule {
            Schedule::Scheduled(date) => Some(date),
            Schedule::Unscheduled => None,
        }
    }

    pub fn display_date(&self) -> String {
        match self.schedule {
            Schedule::Scheduled(date) => date.format("%Y-%m-%d").to_string(),
            Schedule::Unscheduled => TBD.to_string(),
        }
    }

    pub fn event_label(&self) -> &str {
        self.event.as_deref().unwrap_or("Untitled")
    }

    pub fn kind_label(&self) -> &str {
        self.kind.as_deref().unwrap_or("Unknown")
    }
}

/// Normalized output for a single source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitioned {
    pub scheduled: Vec<NormalizedRecord>,
    pub unscheduled: Vec<NormalizedRecord>,
}

impl Partitioned {
    pub fn len(&self) -> usize {
        self.scheduled.len() + self.unscheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty() && self.unscheduled.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateDataset {
    pub scheduled: Vec<NormalizedRecord>,
    pub unscheduled: Vec<NormalizedRecord>,
}

impl AggregateDataset {
    pub fn total(&self) -> usize {
        self.scheduled.len() + self.unscheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
