use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::{NormalizedRecord, Partitioned, RawRecord, Schedule, TBD};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%b. %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%Y%m%d",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Splits one source's records into scheduled and unscheduled, tagging each with `course`.
///
/// Records whose date is a sentinel come first in the unscheduled partition, followed by
/// records whose date could not be parsed. Relative order inside each group is preserved.
pub fn normalize(records: Vec<RawRecord>, course: &str) -> Partitioned {
    let mut scheduled = Vec::new();
    let mut sentinel = Vec::new();
    let mut unparsed = Vec::new();

    for record in records {
        let date_text = date_text(record.date.as_ref());
        let mut normalized = NormalizedRecord {
            event: text_field(record.event.as_ref()),
            course: course.to_string(),
            kind: text_field(record.kind.as_ref()),
            weight: coerce_weight(record.weight.as_ref()),
            schedule: Schedule::Unscheduled,
        };

        if is_unscheduled_sentinel(&date_text) {
            sentinel.push(normalized);
            continue;
        }

        match parse_date(&date_text) {
            Some(date) => {
                normalized.schedule = Schedule::Scheduled(date);
                scheduled.push(normalized);
            }
            None => unparsed.push(normalized),
        }
    }

    sentinel.extend(unparsed);
    Partitioned {
        scheduled,
        unscheduled: sentinel,
    }
}

pub fn is_unscheduled_sentinel(date_text: &str) -> bool {
    let trimmed = date_text.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(TBD) || trimmed.eq_ignore_ascii_case("null")
}

/// Lenient calendar-date parser. ISO dates are expected; a handful of common textual
/// forms are also accepted, and timestamps keep only their date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Any weight that is not a finite, non-negative number becomes 0.
pub fn coerce_weight(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok(),
        _ => None,
    };

    match parsed {
        Some(weight) if weight.is_finite() && weight > 0.0 => weight,
        _ => 0.0,
    }
}

fn date_text(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(event: &str, date: Value, weight: Value) -> RawRecord {
        RawRecord {
            event: Some(json!(event)),
            date: Some(date),
            kind: Some(json!("Exam")),
            weight: Some(weight),
        }
    }

    #[test]
    fn sentinels_route_to_unscheduled() {
        let records = vec![
            raw("a", json!("TBD"), json!(0)),
            raw("b", json!("tbd"), json!(0)),
            raw("c", json!(""), json!(0)),
            raw("d", json!("null"), json!(0)),
            raw("e", json!("  Tbd "), json!(0)),
            raw("f", Value::Null, json!(0)),
        ];
        let out = normalize(records, "CS101");
        assert!(out.scheduled.is_empty());
        assert_eq!(out.unscheduled.len(), 6);
        assert!(out.unscheduled.iter().all(|r| r.display_date() == "TBD"));
    }

    #[test]
    fn iso_dates_are_scheduled_with_canonical_display() {
        let out = normalize(vec![raw("Midterm", json!(" 2025-10-12 "), json!(20))], "CS101");
        assert_eq!(out.scheduled.len(), 1);
        let record = &out.scheduled[0];
        assert_eq!(record.display_date(), "2025-10-12");
        assert_eq!(record.resolved_date(), NaiveDate::from_ymd_opt(2025, 10, 12));
        assert_eq!(record.course, "CS101");
    }

    #[test]
    fn unparseable_dates_are_demoted_not_dropped() {
        let records = vec![
            raw("Essay", json!("sometime in spring"), json!(10)),
            raw("Quiz", json!("TBD"), json!(5)),
            raw("Final", json!("2025-12-15"), json!(40)),
        ];
        let out = normalize(records, "HIST2");
        assert_eq!(out.len(), 3);
        assert_eq!(out.scheduled.len(), 1);
        let events: Vec<_> = out.unscheduled.iter().map(|r| r.event_label()).collect();
        assert_eq!(events, vec!["Quiz", "Essay"]);
        assert_eq!(out.unscheduled[1].display_date(), "TBD");
    }

    #[test]
    fn lenient_formats_parse() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 12);
        for text in [
            "2025/10/12",
            "10/12/2025",
            "October 12, 2025",
            "Oct 12, 2025",
            "12 October 2025",
            "Sunday, October 12, 2025",
            "2025-10-12 09:30:00",
            "2025-10-12T09:30:00Z",
        ] {
            assert_eq!(parse_date(text), expected, "{text}");
        }
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date("week 7"), None);
    }

    #[test]
    fn weights_coerce_to_non_negative_numbers() {
        assert_eq!(coerce_weight(Some(&json!("20"))), 20.0);
        assert_eq!(coerce_weight(Some(&json!(20))), 20.0);
        assert_eq!(coerce_weight(Some(&json!("20%"))), 20.0);
        assert_eq!(coerce_weight(Some(&json!(12.5))), 12.5);
        assert_eq!(coerce_weight(Some(&json!("lots"))), 0.0);
        assert_eq!(coerce_weight(Some(&json!(null))), 0.0);
        assert_eq!(coerce_weight(Some(&json!(true))), 0.0);
        assert_eq!(coerce_weight(Some(&json!(-5))), 0.0);
        assert_eq!(coerce_weight(None), 0.0);
    }

    #[test]
    fn weight_is_coerced_in_both_partitions() {
        let records = vec![
            raw("a", json!("TBD"), json!("15")),
            raw("b", json!("2025-09-01"), json!("bad")),
        ];
        let out = normalize(records, "X");
        assert_eq!(out.unscheduled[0].weight, 15.0);
        assert_eq!(out.scheduled[0].weight, 0.0);
    }

    #[test]
    fn overflowing_weight_keeps_the_record() {
        let raw = r#"[{"event":"Final","date":"2025-12-15","type":"Exam","weight":1e400}]"#;
        let records = crate::coerce::coerce_response(raw, "X").unwrap();
        let out = normalize(records, "X");
        assert_eq!(out.scheduled.len(), 1);
        assert_eq!(out.scheduled[0].weight, 0.0);
        assert_eq!(out.scheduled[0].display_date(), "2025-12-15");
    }

    #[test]
    fn empty_input_yields_empty_partitions() {
        let out = normalize(Vec::new(), "X");
        assert_eq!(out, Partitioned::default());
    }

    #[test]
    fn missing_event_is_carried_through() {
        let out = normalize(vec![RawRecord::default()], "X");
        assert_eq!(out.unscheduled.len(), 1);
        assert_eq!(out.unscheduled[0].event, None);
        assert_eq!(out.unscheduled[0].event_label(), "Untitled");
    }

    #[test]
    fn non_string_labels_are_stringified() {
        let record = RawRecord {
            event: Some(json!(3)),
            date: Some(json!("2025-01-01")),
            kind: Some(json!("Quiz")),
            weight: None,
        };
        let out = normalize(vec![record], "X");
        assert_eq!(out.scheduled[0].event.as_deref(), Some("3"));
        assert_eq!(out.scheduled[0].kind.as_deref(), Some("Quiz"));
    }
}
