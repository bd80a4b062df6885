use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::{Context, Result, bail};

// ---------------------------------------------------------------------------
// CellValue – a single cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a dataframe would infer.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as an `f64` when it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A column is numeric when every non-null cell is a number and at least
/// one cell is non-null.
fn infer_kind<'a>(cells: impl Iterator<Item = &'a CellValue>) -> ColumnKind {
    let mut seen_number = false;
    for cell in cells {
        if cell.is_null() {
            continue;
        }
        if !cell.is_numeric() {
            return ColumnKind::Text;
        }
        seen_number = true;
    }
    if seen_number {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One country-year observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub country: String,
    pub year: i32,
    /// Numeric metric cells present on this row: column_name → value.
    /// Null cells are absent.
    pub metrics: BTreeMap<String, f64>,
}

impl Record {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed indices used by the selection
/// widgets and validation.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All rows, in source order.
    pub records: Vec<Record>,
    /// Every source column in header order, with its inferred kind.
    pub columns: Vec<ColumnInfo>,
    /// Numeric columns usable as features (excludes country and year).
    pub features: Vec<String>,
    /// Distinct countries in order of first appearance.
    pub countries: Vec<String>,
    /// Observed `(min_year, max_year)`; `None` only for an empty dataset.
    pub year_bounds: Option<(i32, i32)>,
    pub country_column: String,
    pub year_column: String,
}

impl Dataset {
    /// Build the indices from a schema and already-typed records.
    pub fn new(
        columns: Vec<ColumnInfo>,
        records: Vec<Record>,
        country_column: &str,
        year_column: &str,
    ) -> Self {
        let features = columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .filter(|c| c.name != country_column && c.name != year_column)
            .map(|c| c.name.clone())
            .collect();

        let mut seen = HashSet::new();
        let countries = records
            .iter()
            .filter(|r| seen.insert(r.country.as_str()))
            .map(|r| r.country.clone())
            .collect();

        let year_bounds = records.iter().fold(None::<(i32, i32)>, |acc, r| match acc {
            None => Some((r.year, r.year)),
            Some((lo, hi)) => Some((i32::min(lo, r.year), i32::max(hi, r.year))),
        });

        Dataset {
            records,
            columns,
            features,
            countries,
            year_bounds,
            country_column: country_column.to_string(),
            year_column: year_column.to_string(),
        }
    }

    /// Type a raw cell grid: infer column kinds, then convert each row into a
    /// [`Record`]. Row numbers in errors are 1-based data rows.
    pub fn from_table(
        headers: Vec<String>,
        rows: Vec<Vec<CellValue>>,
        country_column: &str,
        year_column: &str,
    ) -> Result<Self> {
        if rows.is_empty() {
            bail!("Dataset must contain at least one data row");
        }

        let country_idx = headers
            .iter()
            .position(|h| h == country_column)
            .with_context(|| format!("missing country column '{country_column}'"))?;
        let year_idx = headers
            .iter()
            .position(|h| h == year_column)
            .with_context(|| format!("missing year column '{year_column}'"))?;

        let columns: Vec<ColumnInfo> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let kind = infer_kind(rows.iter().filter_map(|row| row.get(i)));
                ColumnInfo::new(name.clone(), kind)
            })
            .collect();

        let numeric_cols: Vec<(usize, &str)> = columns
            .iter()
            .enumerate()
            .filter(|(i, c)| c.kind == ColumnKind::Numeric && *i != country_idx && *i != year_idx)
            .map(|(i, c)| (i, c.name.as_str()))
            .collect();

        let mut records = Vec::with_capacity(rows.len());
        for (row_no, row) in rows.iter().enumerate() {
            let line = row_no + 1;
            let country = match row.get(country_idx) {
                None | Some(CellValue::Null) => bail!("Row {line}: empty '{country_column}'"),
                Some(CellValue::Text(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            let year = row
                .get(year_idx)
                .and_then(cell_to_year)
                .with_context(|| format!("Row {line}: '{year_column}' is not an integer year"))?;

            let metrics = numeric_cols
                .iter()
                .filter_map(|&(i, name)| {
                    let value = row.get(i)?.as_f64()?;
                    Some((name.to_string(), value))
                })
                .collect();

            records.push(Record {
                country,
                year,
                metrics,
            });
        }

        Ok(Dataset::new(columns, records, country_column, year_column))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `name` is a numeric feature column.
    pub fn is_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }

    pub fn has_country(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }
}

fn cell_to_year(cell: &CellValue) -> Option<i32> {
    match cell {
        CellValue::Integer(i) => i32::try_from(*i).ok(),
        CellValue::Float(f) if f.fract() == 0.0 && f.is_finite() => i32::try_from(*f as i64).ok(),
        _ => None,
    }
}
