use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::models::{
    concern_color, ChartPoint, ChartSeries, ConcernSummary, ConcernTrend, DiagnosisRecord,
    SeverityTrendPoint, TrendChart, TrendDirection,
};

/// Distinct dates above which series are smoothed.
const SMOOTHING_DATE_THRESHOLD: usize = 15;
/// Below this many distinct dates every point is drawn.
const ALL_POINTS_DATE_THRESHOLD: usize = 6;
const DEFAULT_WINDOW: usize = 3;
const WIDE_WINDOW: usize = 5;
const WIDE_WINDOW_POINT_THRESHOLD: usize = 50;
const STABLE_BAND: i32 = 5;

/// Builds one trend per concern key. With `concerns` set, only those keys are
/// produced, in the order given.
pub fn concern_trends(records: &[DiagnosisRecord], concerns: Option<&[String]>) -> Vec<ConcernTrend> {
    let keys: Vec<String> = match concerns {
        Some(keys) => keys.to_vec(),
        None => records
            .iter()
            .flat_map(|record| record.severities.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    };

    keys.into_iter()
        .map(|key| {
            let mut data: Vec<SeverityTrendPoint> = records
                .iter()
                .filter_map(|record| {
                    record.severity(&key).map(|value| SeverityTrendPoint {
                        date: record.created(),
                        value,
                    })
                })
                .collect();
            // Undated points sort first and are dropped during aggregation.
            data.sort_by(|a, b| a.date.cmp(&b.date));

            ConcernTrend {
                color: concern_color(&key),
                key,
                data,
            }
        })
        .collect()
}

/// Label points are one per distinct calendar date. Series points are one per
/// dated scan in date order, not one per label, so same-day scans or concerns
/// missing from some scans make a series' length differ from the labels.
pub fn aggregate(trends: &[ConcernTrend], visible: Option<&[String]>) -> TrendChart {
    let included: Vec<(&ConcernTrend, Vec<SeverityTrendPoint>)> = trends
        .iter()
        .filter(|trend| match visible {
            Some(keys) => keys.iter().any(|key| key == &trend.key),
            None => true,
        })
        .map(|trend| (trend, dated_points(trend)))
        .collect();

    if included.is_empty() {
        return TrendChart::NoData;
    }

    let dates: BTreeSet<NaiveDate> = included
        .iter()
        .flat_map(|(_, points)| points.iter().filter_map(|point| point.date))
        .map(|date| date.date())
        .collect();

    if dates.is_empty() {
        return TrendChart::NoData;
    }

    let should_smooth = dates.len() > SMOOTHING_DATE_THRESHOLD;
    let show_all_points = dates.len() < ALL_POINTS_DATE_THRESHOLD;

    let spans_years = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => first.year() != last.year(),
        _ => false,
    };
    let labels = dates
        .iter()
        .map(|date| ChartPoint {
            value: 0,
            label: Some(axis_label(date, spans_years)),
            hide_data_point: true,
        })
        .collect();

    let series = included
        .into_iter()
        .filter(|(_, points)| !points.is_empty())
        .map(|(trend, points)| {
            let raw: Vec<i32> = points.iter().map(|point| point.value).collect();
            let values = if should_smooth {
                smooth_data(&raw, window_size(raw.len()))
            } else {
                raw
            };
            let last = values.len() - 1;

            ChartSeries {
                key: trend.key.clone(),
                color: trend.color,
                points: values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| ChartPoint {
                        value,
                        label: None,
                        hide_data_point: !(show_all_points || i == last),
                    })
                    .collect(),
            }
        })
        .collect();

    TrendChart::Ready { labels, series }
}

fn axis_label(date: &NaiveDate, with_year: bool) -> String {
    if with_year {
        format!("{}/{}/{:02}", date.month(), date.day(), date.year().rem_euclid(100))
    } else {
        format!("{}/{}", date.month(), date.day())
    }
}

fn dated_points(trend: &ConcernTrend) -> Vec<SeverityTrendPoint> {
    let mut points: Vec<SeverityTrendPoint> = trend
        .data
        .iter()
        .filter(|point| point.date.is_some())
        .copied()
        .collect();

    let dropped = trend.data.len() - points.len();
    if dropped > 0 {
        log::debug!("dropped {} undated points from {}", dropped, trend.key);
    }

    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}

pub fn window_size(point_count: usize) -> usize {
    if point_count > WIDE_WINDOW_POINT_THRESHOLD {
        WIDE_WINDOW
    } else {
        DEFAULT_WINDOW
    }
}

/// Centered moving average, window clamped at the edges, rounded half up.
pub fn smooth_data(values: &[i32], window: usize) -> Vec<i32> {
    if values.len() <= window {
        return values.to_vec();
    }

    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half).min(values.len() - 1);
            let slice = &values[start..=end];
            let mean = slice.iter().map(|v| *v as f64).sum::<f64>() / slice.len() as f64;
            (mean + 0.5).floor() as i32
        })
        .collect()
}

pub fn summarize_concerns(trends: &[ConcernTrend]) -> Vec<ConcernSummary> {
    let mut summaries: Vec<ConcernSummary> = trends
        .iter()
        .filter_map(|trend| {
            let points = dated_points(trend);
            let first = points.first()?.value;
            let latest = points.last()?.value;
            let total: i32 = points.iter().map(|point| point.value).sum();
            let change = latest - first;

            Some(ConcernSummary {
                key: trend.key.clone(),
                count: points.len(),
                first,
                latest,
                avg_severity: total as f64 / points.len() as f64,
                change,
                direction: direction(change),
            })
        })
        .collect();

    summaries.sort_by(|a, b| b.latest.cmp(&a.latest).then_with(|| a.key.cmp(&b.key)));
    summaries
}

fn direction(change: i32) -> TrendDirection {
    // Severity is 0 best, 100 worst.
    if change <= -STABLE_BAND {
        TrendDirection::Improving
    } else if change >= STABLE_BAND {
        TrendDirection::Worsening
    } else {
        TrendDirection::Stable
    }
}
