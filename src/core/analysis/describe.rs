use crate::core::data::{Column, Table};
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Summary statistics for one column, shaped like a dataframe `describe()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Text(TextSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSummary {
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: Option<usize>,
}

pub fn describe_column(csv_path: impl AsRef<Path>, column: &str) -> Result<ColumnSummary> {
    let table = Table::from_csv_path(csv_path)?;
    let summary = summarize(table.column(column)?);
    info!("Described column '{}'", column);
    Ok(summary)
}

pub fn summarize(column: &Column) -> ColumnSummary {
    match column {
        Column::Numeric(_) => {
            let values = column.numeric_values().unwrap_or_default();
            ColumnSummary::Numeric(summarize_numeric(&values))
        }
        Column::Text(values) => ColumnSummary::Text(summarize_text(values)),
    }
}

fn summarize_numeric(values: &[f64]) -> NumericSummary {
    let count = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    NumericSummary {
        count,
        mean: mean(values),
        std: sample_std(values),
        min: sorted.first().copied(),
        p25: quantile(&sorted, 0.25),
        p50: quantile(&sorted, 0.50),
        p75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

fn summarize_text(values: &[Option<String>]) -> TextSummary {
    // first-seen order keeps ties on `top` deterministic
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().flatten() {
        let entry = counts.entry(value.as_str()).or_insert_with(|| {
            order.push(value.as_str());
            0
        });
        *entry += 1;
    }

    let mut top: Option<(&str, usize)> = None;
    for value in &order {
        let freq = counts[value];
        if top.map_or(true, |(_, best)| freq > best) {
            top = Some((value, freq));
        }
    }

    TextSummary {
        count: values.iter().flatten().count(),
        unique: order.len(),
        top: top.map(|(value, _)| value.to_string()),
        freq: top.map(|(_, freq)| freq),
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with one degree of freedom removed.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Linear interpolation between closest ranks; `sorted` must be ascending.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(values: &[f64]) -> Column {
        Column::Numeric(values.iter().copied().map(Some).collect())
    }

    #[test]
    fn test_numeric_summary() {
        let summary = summarize(&numeric(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        let ColumnSummary::Numeric(s) = summary else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.count, 5);
        assert_eq!(s.mean, Some(3.0));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(5.0));
        assert_eq!(s.p25, Some(2.0));
        assert_eq!(s.p50, Some(3.0));
        assert_eq!(s.p75, Some(4.0));
        let std = s.std.unwrap();
        assert!((std - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_quantiles_interpolate() {
        let ColumnSummary::Numeric(s) = summarize(&numeric(&[10.0, 1.0, 4.0, 2.0])) else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.p25, Some(1.75));
        assert_eq!(s.p50, Some(3.0));
        assert_eq!(s.p75, Some(5.5));
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let column = Column::Numeric(vec![Some(2.0), None, Some(4.0)]);
        let ColumnSummary::Numeric(s) = summarize(&column) else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, Some(3.0));
    }

    #[test]
    fn test_single_value_has_no_std() {
        let ColumnSummary::Numeric(s) = summarize(&numeric(&[7.0])) else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert_eq!(s.p75, Some(7.0));
    }

    #[test]
    fn test_text_summary() {
        let column = Column::Text(
            ["b", "a", "b", "a", "c"]
                .iter()
                .map(|s| Some(s.to_string()))
                .chain(std::iter::once(None))
                .collect(),
        );
        let summary = summarize(&column);
        assert_eq!(
            summary,
            ColumnSummary::Text(TextSummary {
                count: 5,
                unique: 3,
                top: Some("b".to_string()),
                freq: Some(2),
            })
        );
    }

    #[test]
    fn test_serialized_keys() {
        let value = serde_json::to_value(summarize(&numeric(&[1.0, 2.0]))).unwrap();
        for key in ["count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
    }
}
