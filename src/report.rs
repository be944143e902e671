use std::fmt::Write;

use crate::aging;
use crate::models::{DiagnosisRecord, TrendDirection};
use crate::trends;

pub const OVERALL_CONCERN: &str = "overall";

fn direction_label(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Improving => "improving",
        TrendDirection::Stable => "stable",
        TrendDirection::Worsening => "worsening",
    }
}

pub fn build_report(
    age_group: Option<i32>,
    since_days: Option<i64>,
    records: &[DiagnosisRecord],
) -> String {
    let scores = aging::aging_scores(records);
    let estimate = aging::estimate(age_group, &scores);
    let range = aging::age_range(age_group);
    let summaries = trends::summarize_concerns(&trends::concern_trends(records, None));

    let mut output = String::new();
    let window_label = match since_days.and_then(crate::source::cutoff_date) {
        Some(cutoff) => format!("scans since {}", cutoff),
        None => "all scans".to_string(),
    };

    let _ = writeln!(output, "# Skin Trend Report");
    let _ = writeln!(
        output,
        "Generated for age {}-{} ({}, {} diagnoses)",
        range.min,
        range.max,
        window_label,
        records.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Skin Age");

    if scores.is_empty() {
        let _ = writeln!(output, "No aging scores recorded; showing age bracket midpoint.");
    }
    let _ = writeln!(output, "- Estimated skin age: {:.1}", estimate.skin_age);
    let _ = writeln!(
        output,
        "- Aging pace: {:.2}x ({})",
        estimate.aging_pace,
        estimate.pace_label()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Concern Trends");

    if summaries.is_empty() {
        let _ = writeln!(output, "No dated severity scores in this window.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: latest {} (avg {:.1} over {} scans, {:+} since first, {})",
                summary.key,
                summary.latest,
                summary.avg_severity,
                summary.count,
                summary.change,
                direction_label(summary.direction)
            );
        }
    }

    let mut recent: Vec<(chrono::NaiveDateTime, &DiagnosisRecord)> = records
        .iter()
        .filter_map(|record| record.created().map(|created| (created, record)))
        .collect();
    recent.sort_by(|a, b| b.0.cmp(&a.0));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Scans");

    if recent.is_empty() {
        let _ = writeln!(output, "No scans recorded for this window.");
    } else {
        for (created, record) in recent.iter().take(5) {
            let overall = record
                .severity(OVERALL_CONCERN)
                .map(|value| value.to_string())
                .unwrap_or_else(|| "n/a".to_string());
            let _ = writeln!(
                output,
                "- {} overall {} across {} concerns",
                created.format("%Y-%m-%d %H:%M"),
                overall,
                record.severities.len()
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn record(created_at: &str, severities: &[(&str, i32)]) -> DiagnosisRecord {
        DiagnosisRecord {
            id: Uuid::new_v4(),
            created_at: created_at.to_string(),
            severities: severities
                .iter()
                .map(|(key, value)| (key.to_string(), *value))
                .collect::<BTreeMap<_, _>>(),
            routine_recommendations: None,
            scan_recommendations: None,
            image_uris: Vec::new(),
        }
    }

    #[test]
    fn empty_report_has_explicit_no_data_lines() {
        let report = build_report(None, None, &[]);
        assert!(report.contains("age 21-30"));
        assert!(report.contains("Estimated skin age: 25.5"));
        assert!(report.contains("Aging pace: 1.00x (typical)"));
        assert!(report.contains("No dated severity scores"));
        assert!(report.contains("No scans recorded"));
    }

    #[test]
    fn unbounded_window_reads_as_all_scans() {
        let report = build_report(Some(2), Some(i64::MAX), &[]);
        assert!(report.contains("(all scans, 0 diagnoses)"));
    }

    #[test]
    fn report_lists_concerns_and_recent_scans() {
        let records = vec![
            record("2026-01-05T09:00:00Z", &[("aging", 30), ("overall", 44)]),
            record("2026-02-05T09:00:00Z", &[("aging", 70), ("overall", 51)]),
            record("broken", &[("overall", 99)]),
        ];
        let report = build_report(Some(1), None, &records);

        assert!(report.contains("Estimated skin age: 26.5"));
        assert!(report.contains("Aging pace: 1.22x (faster)"));
        assert!(report.contains("- aging: latest 70 (avg 50.0 over 2 scans, +40 since first, worsening)"));
        assert!(report.contains("- 2026-02-05 09:00 overall 51 across 2 concerns"));
        assert!(!report.contains("overall 99"));

        let newest = report.find("2026-02-05").expect("newest scan listed");
        let oldest = report.find("2026-01-05").expect("oldest scan listed");
        assert!(newest < oldest);
    }
}
