use crate::error::{AnalysisError, Result};
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Cell values read as missing, matching the usual dataframe defaults.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single column, tagged by storage type. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(values) => values[row].is_none(),
            Column::Text(values) => values[row].is_none(),
        }
    }

    /// Non-missing numeric values in row order; `None` for text columns.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        match self {
            Column::Numeric(values) => Some(values.iter().flatten().copied().collect()),
            Column::Text(_) => None,
        }
    }

    /// Number of distinct non-missing values among the given rows.
    pub fn distinct_count(&self, rows: &[usize]) -> usize {
        match self {
            Column::Numeric(values) => rows
                .iter()
                .filter_map(|&row| values[row])
                .map(|v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
                .collect::<HashSet<_>>()
                .len(),
            Column::Text(values) => rows
                .iter()
                .filter_map(|&row| values[row].as_deref())
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

/// An in-memory CSV: ordered named columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    n_rows: usize,
}

impl Table {
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        debug!(
            "Loaded {}: {} rows, {} columns",
            path.display(),
            table.n_rows,
            table.names.len()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let names = dedupe_headers(reader.headers()?.iter());
        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];

        for record in reader.records() {
            let record = record?;
            for (cells, field) in raw.iter_mut().zip(record.iter()) {
                cells.push(parse_cell(field));
            }
        }

        let n_rows = raw.first().map(|cells| cells.len()).unwrap_or(0);
        let columns = raw.into_iter().map(infer_column).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Ok(Self {
            names,
            columns,
            index,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Look up a column by name; absent names are an invalid argument.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.index
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| AnalysisError::column_not_found(name))
    }

    /// Fails on the first absent name, in the order given.
    pub fn require_columns<'a, I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            self.column(name)?;
        }
        Ok(())
    }
}

fn parse_cell(field: &str) -> Option<String> {
    if MISSING_MARKERS.contains(&field) {
        None
    } else {
        Some(field.to_string())
    }
}

fn infer_column(cells: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .map(|v| (!v.is_nan()).then_some(v)),
        })
        .collect();

    match parsed {
        Some(values) => Column::Numeric(values),
        None => Column::Text(cells),
    }
}

fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();
    for header in headers {
        let name = match seen.get_mut(header) {
            Some(count) => {
                *count += 1;
                format!("{}.{}", header, count)
            }
            None => header.to_string(),
        };
        seen.entry(header.to_string()).or_insert(0);
        names.push(name);
    }
    names
}
