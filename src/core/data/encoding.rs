use super::table::Column;
use std::cmp::Ordering;

/// Maps each distinct value to its rank among the sorted distinct values.
///
/// Fit fresh for every call; never shared between invocations.
#[derive(Debug, Clone)]
pub struct LabelEncoder<T> {
    classes: Vec<T>,
}

impl<T: PartialOrd + Clone> LabelEncoder<T> {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut classes: Vec<T> = values.into_iter().cloned().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        classes.dedup_by(|a, b| a == b);
        Self { classes }
    }

    /// Code for `value`, or `None` if it was not seen during fit.
    pub fn transform_one(&self, value: &T) -> Option<u32> {
        self.classes
            .binary_search_by(|class| class.partial_cmp(value).unwrap_or(Ordering::Less))
            .ok()
            .map(|code| code as u32)
    }
}

/// Turns the given rows of a column into a fresh numeric feature.
///
/// Text is label-encoded over the distinct values in `rows`; numbers pass
/// through. Every row in `rows` must be non-missing.
pub fn encode_feature(column: &Column, rows: &[usize]) -> Vec<f64> {
    match column {
        Column::Numeric(values) => rows.iter().filter_map(|&row| values[row]).collect(),
        Column::Text(values) => {
            let kept: Vec<&String> = rows.iter().filter_map(|&row| values[row].as_ref()).collect();
            let encoder = LabelEncoder::fit(kept.iter().copied());
            kept.iter()
                .filter_map(|value| encoder.transform_one(value))
                .map(f64::from)
                .collect()
        }
    }
}

/// Label-encodes the given rows of a column into class codes.
pub fn encode_labels(column: &Column, rows: &[usize]) -> Vec<u32> {
    match column {
        Column::Numeric(values) => {
            let kept: Vec<f64> = rows.iter().filter_map(|&row| values[row]).collect();
            let encoder = LabelEncoder::fit(kept.iter());
            kept.iter().filter_map(|v| encoder.transform_one(v)).collect()
        }
        Column::Text(values) => {
            let kept: Vec<&String> = rows.iter().filter_map(|&row| values[row].as_ref()).collect();
            let encoder = LabelEncoder::fit(kept.iter().copied());
            kept.iter().filter_map(|v| encoder.transform_one(v)).collect()
        }
    }
}
