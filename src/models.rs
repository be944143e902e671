use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    pub id: Uuid,
    /// Raw timestamp as exported; may be malformed.
    pub created_at: String,
    #[serde(default)]
    pub severities: BTreeMap<String, i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_uris: Vec<String>,
}

impl DiagnosisRecord {
    pub fn created(&self) -> Option<NaiveDateTime> {
        crate::source::parse_timestamp(&self.created_at)
    }

    pub fn severity(&self, concern: &str) -> Option<i32> {
        self.severities.get(concern).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityTrendPoint {
    /// `None` when the source timestamp could not be resolved.
    pub date: Option<NaiveDateTime>,
    pub value: i32,
}

#[derive(Debug, Clone)]
pub struct ConcernTrend {
    pub key: String,
    pub color: &'static str,
    pub data: Vec<SeverityTrendPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingEstimate {
    pub skin_age: f64,
    pub aging_pace: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub value: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub hide_data_point: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub key: String,
    pub color: &'static str,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TrendChart {
    NoData,
    Ready {
        labels: Vec<ChartPoint>,
        series: Vec<ChartSeries>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcernSummary {
    pub key: String,
    pub count: usize,
    pub first: i32,
    pub latest: i32,
    pub avg_severity: f64,
    pub change: i32,
    pub direction: TrendDirection,
}

/// Chart color for a concern key; unknown keys get a neutral gray.
pub fn concern_color(key: &str) -> &'static str {
    match key {
        "overall" => "#6C63FF",
        "aging" => "#FF8A65",
        "acne" => "#E57373",
        "redness" => "#F06292",
        "dryness" => "#4FC3F7",
        "oiliness" => "#FFD54F",
        "pores" => "#A1887F",
        "pigmentation" => "#BA68C8",
        "wrinkles" => "#81C784",
        "dark_circles" => "#7986CB",
        _ => "#9E9E9E",
    }
}
