use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::models::DiagnosisRecord;

pub fn load_diagnoses(path: &Path) -> anyhow::Result<Vec<DiagnosisRecord>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let mut records = match extension.as_deref() {
        Some("json") => load_json(path)?,
        Some("csv") => load_csv(path)?,
        _ => bail!(
            "unsupported diagnosis file {} (expected .json or .csv)",
            path.display()
        ),
    };

    for record in records.iter_mut() {
        clamp_severities(record);
    }

    log::info!("loaded {} diagnoses from {}", records.len(), path.display());
    Ok(records)
}

fn load_json(path: &Path) -> anyhow::Result<Vec<DiagnosisRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<DiagnosisRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid diagnosis JSON in {}", path.display()))?;
    Ok(records)
}

fn load_csv(path: &Path) -> anyhow::Result<Vec<DiagnosisRecord>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        diagnosis_id: Option<Uuid>,
        created_at: String,
        concern: String,
        severity: i32,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut by_id: BTreeMap<Uuid, DiagnosisRecord> = BTreeMap::new();
    let mut order = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("bad row {} in {}", line + 1, path.display()))?;
        let id = row.diagnosis_id.unwrap_or_else(Uuid::new_v4);

        let record = by_id.entry(id).or_insert_with(|| {
            order.push(id);
            DiagnosisRecord {
                id,
                created_at: row.created_at.clone(),
                severities: BTreeMap::new(),
                routine_recommendations: None,
                scan_recommendations: None,
                image_uris: Vec::new(),
            }
        });
        if record.created_at != row.created_at {
            log::warn!(
                "diagnosis {} row {} has created_at {:?}, keeping {:?}",
                id,
                line + 1,
                row.created_at,
                record.created_at
            );
        }
        record.severities.insert(row.concern, row.severity);
    }

    Ok(order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect())
}

fn clamp_severities(record: &mut DiagnosisRecord) {
    for (concern, value) in record.severities.iter_mut() {
        if !(0..=100).contains(value) {
            log::warn!(
                "diagnosis {} has {} severity {} outside 0..=100, clamping",
                record.id,
                concern,
                value
            );
            *value = (*value).clamp(0, 100);
        }
    }
}

/// Accepts RFC 3339, a naive ISO datetime, or a bare calendar date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).naive_utc());
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `None` when the window reaches past the earliest representable date.
pub fn cutoff_date(since_days: i64) -> Option<NaiveDate> {
    let window = Duration::try_days(since_days.max(1))?;
    Utc::now().date_naive().checked_sub_signed(window)
}

/// Records with unreadable timestamps are kept; the aggregator drops them.
pub fn within_window(records: Vec<DiagnosisRecord>, since_days: i64) -> Vec<DiagnosisRecord> {
    let Some(cutoff) = cutoff_date(since_days) else {
        log::debug!("window of {} days is unbounded, keeping all records", since_days);
        return records;
    };
    records
        .into_iter()
        .filter(|record| match record.created() {
            Some(created) => created.date() >= cutoff,
            None => true,
        })
        .collect()
}
