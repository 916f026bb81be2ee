use serde_json::Value;

use crate::error::SourceError;
use crate::models::RawRecord;

const FENCE_MARKERS: [&str; 2] = ["```json", "```"];
const EXCERPT_CHARS: usize = 200;

/// Removes markdown fences by literal substring removal and trims.
pub fn strip_wrappers(raw: &str) -> String {
    let mut cleaned = raw.to_string();
    for marker in FENCE_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.trim().to_string()
}

/// Parses a model response into raw records. Only a top-level JSON array is accepted;
/// field types are left for the normalizer.
pub fn coerce_response(raw: &str, source_name: &str) -> Result<Vec<RawRecord>, SourceError> {
    let cleaned = strip_wrappers(raw);
    let parse_error = |reason: String| SourceError::Parse {
        source_name: source_name.to_string(),
        reason,
        raw_excerpt: excerpt(&cleaned),
    };

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(items)) => Ok(items.into_iter().map(RawRecord::from_value).collect()),
        Ok(other) => Err(parse_error(format!("expected an array, found {}", json_kind(&other)))),
        Err(err) => Err(parse_error(err.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_fenced_json() {
        let raw = "```json\n[{\"event\": \"Midterm\", \"date\": \"2025-10-12\"}]\n```";
        let records = coerce_response(raw, "CS101").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, Some(json!("Midterm")));
        assert_eq!(records[0].date, Some(json!("2025-10-12")));
    }

    #[test]
    fn accepts_bare_array() {
        let raw = r#"  [{"event": "HW1", "type": "Homework", "weight": "5"}, {"event": "HW2"}] "#;
        let records = coerce_response(raw, "CS101").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, Some(json!("Homework")));
        assert_eq!(records[1].weight, None);
    }

    #[test]
    fn prose_is_a_parse_error_for_that_source() {
        let err = coerce_response("Sorry, I could not find any deadlines.", "MATH250")
            .unwrap_err();
        match err {
            SourceError::Parse {
                source_name,
                raw_excerpt,
                ..
            } => {
                assert_eq!(source_name, "MATH250");
                assert!(raw_excerpt.starts_with("Sorry"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn object_at_top_level_is_rejected() {
        let err = coerce_response(r#"{"event": "Final"}"#, "BIO1").unwrap_err();
        assert!(err.to_string().contains("expected an array, found an object"));
    }

    #[test]
    fn non_object_elements_are_kept_as_empty_records() {
        let records = coerce_response(r#"["Final exam", 3]"#, "BIO1").unwrap();
        assert_eq!(records, vec![RawRecord::default(), RawRecord::default()]);
    }

    #[test]
    fn empty_array_yields_no_records() {
        assert!(coerce_response("```[]```", "BIO1").unwrap().is_empty());
    }

    #[test]
    fn excerpt_is_bounded() {
        let long = "x".repeat(1000);
        let err = coerce_response(&long, "LONG").unwrap_err();
        match err {
            SourceError::Parse { raw_excerpt, .. } => {
                assert_eq!(raw_excerpt.chars().count(), EXCERPT_CHARS + 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn out_of_range_numbers_still_parse() {
        let raw = r#"[{"event":"Final","date":"2025-12-15","type":"Exam","weight":1e400}]"#;
        let records = coerce_response(raw, "X").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, Some(json!("Final")));
        assert!(records[0].weight.is_some());
    }
}
