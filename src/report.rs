use std::fmt::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{Datelike, Month};
use serde::Serialize;

use crate::calendar::format_weight;
use crate::error::SourceError;
use crate::models::{AggregateDataset, NormalizedRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub scheduled: usize,
    pub unscheduled: usize,
    pub heaviest_month: Option<Month>,
}

impl Summary {
    pub fn heaviest_month_label(&self) -> &'static str {
        self.heaviest_month.map(|m| m.name()).unwrap_or("N/A")
    }
}

/// One bubble on the workload scatter: x = date, y = course, size = weight,
/// colour = category.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    pub date: String,
    pub course: String,
    pub category: String,
    pub size: f64,
    pub event: String,
}

#[derive(Serialize)]
struct ScheduledRow<'a> {
    date: String,
    course: &'a str,
    event: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    weight: f64,
}

#[derive(Serialize)]
struct UnscheduledRow<'a> {
    course: &'a str,
    event: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    weight: f64,
}

pub fn summarize(dataset: &AggregateDataset) -> Summary {
    Summary {
        total: dataset.total(),
        scheduled: dataset.scheduled.len(),
        unscheduled: dataset.unscheduled.len(),
        heaviest_month: heaviest_month(&dataset.scheduled),
    }
}

/// Month with the most scheduled records. Ties go to the alphabetically first month name.
pub fn heaviest_month(records: &[NormalizedRecord]) -> Option<Month> {
    let mut counts = [0usize; 12];
    for date in records.iter().filter_map(NormalizedRecord::resolved_date) {
        counts[date.month0() as usize] += 1;
    }

    let mut best: Option<(Month, usize)> = None;
    for (month0, count) in counts.into_iter().enumerate() {
        if count == 0 {
            continue;
        }
        let Some(month) = u8::try_from(month0 + 1)
            .ok()
            .and_then(|number| Month::try_from(number).ok())
        else {
            continue;
        };
        let better = match best {
            None => true,
            Some((top_month, top)) => {
                count > top || (count == top && month.name() < top_month.name())
            }
        };
        if better {
            best = Some((month, count));
        }
    }
    best.map(|(month, _)| month)
}

pub fn timeline_points(records: &[NormalizedRecord]) -> Vec<TimelinePoint> {
    let mut points: Vec<TimelinePoint> = records
        .iter()
        .filter(|record| record.resolved_date().is_some())
        .map(|record| TimelinePoint {
            date: record.display_date(),
            course: record.course.clone(),
            category: record.kind_label().to_string(),
            size: record.weight,
            event: record.event_label().to_string(),
        })
        .collect();
    points.sort_by(|a, b| a.course.cmp(&b.course).then_with(|| a.date.cmp(&b.date)));
    points
}

pub fn build_report(dataset: &AggregateDataset, failures: &[SourceError]) -> String {
    let summary = summarize(dataset);
    let mut output = String::new();

    let _ = writeln!(output, "# Semester Plan");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total assignments: {}", summary.total);
    let _ = writeln!(output, "- Scheduled events: {}", summary.scheduled);
    let _ = writeln!(output, "- TBD items: {}", summary.unscheduled);
    let _ = writeln!(output, "- Heaviest month: {}", summary.heaviest_month_label());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Workload Timeline");
    let points = timeline_points(&dataset.scheduled);
    if points.is_empty() {
        let _ = writeln!(output, "No dated assignments found.");
    } else {
        let mut current_course: Option<&str> = None;
        for point in points.iter() {
            if current_course != Some(point.course.as_str()) {
                let _ = writeln!(output, "### {}", point.course);
                current_course = Some(point.course.as_str());
            }
            let _ = writeln!(
                output,
                "- {} {} ({}, weight {})",
                point.date,
                point.event,
                point.category,
                format_weight(point.size)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Scheduled Assignments");
    if dataset.scheduled.is_empty() {
        let _ = writeln!(output, "No dated assignments found.");
    } else {
        let _ = writeln!(output, "| Date | Course | Event | Type | Weight |");
        let _ = writeln!(output, "| --- | --- | --- | --- | --- |");
        for record in dataset.scheduled.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                record.display_date(),
                cell(&record.course),
                cell(record.event_label()),
                cell(record.kind_label()),
                format_weight(record.weight)
            );
        }
    }

    if !dataset.unscheduled.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## TBD / Undated Assignments");
        let _ = writeln!(output, "| Course | Event | Type | Weight |");
        let _ = writeln!(output, "| --- | --- | --- | --- |");
        for record in dataset.unscheduled.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                cell(&record.course),
                cell(record.event_label()),
                cell(record.kind_label()),
                format_weight(record.weight)
            );
        }
    }

    if !failures.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Sources Skipped");
        for failure in failures {
            let _ = writeln!(output, "- {} ({} error)", failure.source_name(), failure.kind());
        }
    }

    output
}

fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

pub fn write_scheduled_csv(path: &Path, records: &[NormalizedRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(ScheduledRow {
            date: record.display_date(),
            course: &record.course,
            event: record.event_label(),
            kind: record.kind_label(),
            weight: record.weight,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_unscheduled_csv(path: &Path, records: &[NormalizedRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(UnscheduledRow {
            course: &record.course,
            event: record.event_label(),
            kind: record.kind_label(),
            weight: record.weight,
        })?;
    }
    writer.flush()?;
    Ok(())
}
