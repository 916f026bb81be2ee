use std::fmt::Write;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::NormalizedRecord;

pub const CALENDAR_FILE_NAME: &str = "semester_plan.ics";

const PRODID: &str = "-//Syllabus Scout//Semester Plan//EN";
const MAX_LINE_OCTETS: usize = 75;

pub fn build_calendar(records: &[NormalizedRecord]) -> String {
    build_calendar_at(records, Utc::now())
}

/// Emits one all-day VEVENT per scheduled record. Records without a usable date are
/// skipped; the document itself is always complete.
pub fn build_calendar_at(records: &[NormalizedRecord], stamp: DateTime<Utc>) -> String {
    let mut output = String::new();
    push_line(&mut output, "BEGIN:VCALENDAR");
    push_line(&mut output, "VERSION:2.0");
    push_line(&mut output, &format!("PRODID:{PRODID}"));
    push_line(&mut output, "CALSCALE:GREGORIAN");

    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();
    for (position, record) in records.iter().enumerate() {
        let Some((start, end)) = all_day_span(record) else {
            continue;
        };

        push_line(&mut output, "BEGIN:VEVENT");
        push_line(&mut output, &format!("UID:{}", event_uid(record, position)));
        push_line(&mut output, &format!("DTSTAMP:{dtstamp}"));
        push_line(
            &mut output,
            &format!("DTSTART;VALUE=DATE:{}", start.format("%Y%m%d")),
        );
        push_line(
            &mut output,
            &format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")),
        );
        push_line(
            &mut output,
            &format!("SUMMARY:{}", escape_text(&event_title(record))),
        );
        push_line(
            &mut output,
            &format!("DESCRIPTION:{}", escape_text(&event_description(record))),
        );
        push_line(&mut output, "TRANSP:TRANSPARENT");
        push_line(&mut output, "END:VEVENT");
    }

    push_line(&mut output, "END:VCALENDAR");
    output
}

pub fn event_title(record: &NormalizedRecord) -> String {
    format!("{} ({})", record.event_label(), record.course)
}

pub fn event_description(record: &NormalizedRecord) -> String {
    format!(
        "Type: {}\nWeight: {}%",
        record.kind_label(),
        format_weight(record.weight)
    )
}

/// `20.0` renders as `20`, `12.5` as `12.5`.
pub fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.0}")
    } else {
        format!("{weight}")
    }
}

fn all_day_span(record: &NormalizedRecord) -> Option<(NaiveDate, NaiveDate)> {
    let start = record.resolved_date()?;
    let end = start.succ_opt()?;
    Some((start, end))
}

fn event_uid(record: &NormalizedRecord, position: usize) -> String {
    let key = format!(
        "{}|{}|{}|{}",
        record.course,
        record.event_label(),
        record.display_date(),
        position
    );
    format!(
        "{}@syllabus-scout",
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    )
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Writes a content line, folding at 75 octets without splitting a UTF-8 sequence.
fn push_line(output: &mut String, line: &str) {
    let mut octets = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if octets + width > MAX_LINE_OCTETS {
            output.push_str("\r\n ");
            octets = 1;
        }
        output.push(ch);
        octets += width;
    }
    let _ = write!(output, "\r\n");
}
