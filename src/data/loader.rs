use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset};
use crate::config::DashboardConfig;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a metrics table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text with a header row (configured delimiter)
/// * `.tsv`          – tab-delimited text with a header row
/// * `.json`         – `[{ "Country": "...", "Year": 2020, ... }, ...]`
/// * `.parquet`      – flat Parquet file, one column per field
pub fn load_file(path: &Path, config: &DashboardConfig) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "txt" => {
            let file = std::fs::File::open(path).context("opening delimited file")?;
            load_delimited(file, config.delimiter_byte()?, config)
        }
        "tsv" => {
            let file = std::fs::File::open(path).context("opening TSV file")?;
            load_delimited(file, b'\t', config)
        }
        "json" => load_json(path, config),
        "parquet" | "pq" => load_parquet(path, config),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} records ({} countries, {} features) from {}",
        dataset.len(),
        dataset.countries.len(),
        dataset.features.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names, one record per line. Cell types are
/// guessed per cell; column kinds are inferred afterwards from all cells.
pub fn load_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    config: &DashboardConfig,
) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("data row {}", row_no + 1))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Dataset::from_table(headers, rows, &config.country_column, &config.year_column)
}

/// Cell texts read as missing values, the same set pandas' `read_csv` uses.
const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn guess_cell_type(s: &str) -> CellValue {
    if MISSING_TOKENS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_nan() {
            return CellValue::Null;
        }
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "Country": "France", "Year": 2020, "GDP (in Trillions USD)": 2.63 },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys in order of first appearance; keys missing
/// from an object read as null.
fn load_json(path: &Path, config: &DashboardConfig) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Dataset::from_table(headers, rows, &config.country_column, &config.year_column)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file (one scalar column per field), as written by
/// **Pandas** (`df.to_parquet()`) or **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, config: &DashboardConfig) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&headers)
            .map(|(col, name)| normalize_column(name, col))
            .collect::<Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| extract_cell(col, row)).collect());
        }
    }

    Dataset::from_table(headers, rows, &config.country_column, &config.year_column)
}

/// The type a column is read as: all strings become `Utf8`, all integers
/// `Int64`, all floats and decimals `Float64`. Dictionary columns read as
/// their value type. `None` for types the dashboard cannot use.
fn canonical_type(data_type: &DataType) -> Option<DataType> {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Some(DataType::Utf8),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Some(DataType::Int64),
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(..)
        | DataType::Decimal256(..) => Some(DataType::Float64),
        DataType::Boolean => Some(DataType::Boolean),
        DataType::Null => Some(DataType::Null),
        DataType::Dictionary(_, value) => canonical_type(value),
        _ => None,
    }
}

/// Cast a column to its [`canonical_type`]; unsupported types are an error.
fn normalize_column(name: &str, col: &ArrayRef) -> Result<ArrayRef> {
    let target = canonical_type(col.data_type()).with_context(|| {
        format!("Column '{name}' has unsupported type {:?}", col.data_type())
    })?;
    if col.data_type() == &target {
        return Ok(col.clone());
    }
    cast(col, &target)
        .with_context(|| format!("converting column '{name}' from {:?}", col.data_type()))
}

/// Extract a single cell from a column already passed through
/// [`normalize_column`]. NaN floats read as missing.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| CellValue::Text(s.value(row).to_string())),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| match a.value(row) {
                v if v.is_nan() => CellValue::Null,
                v => CellValue::Float(v),
            }),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => None,
    };
    // A `Null`-typed column has no validity buffer, so it lands here too.
    cell.unwrap_or(CellValue::Null)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use arrow::array::{Date32Array, DictionaryArray, Float32Array, Int16Array, UInt32Array};
    use arrow::datatypes::{Field, Int32Type, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::model::ColumnKind;

    const WORLD: &str = "\
Country,Year,Continent,GDP (in Trillions USD),Population (in Millions)
France,2020,Europe,2.63,67.4
France,2021,Europe,2.96,67.7
Japan,2020,Asia,5.04,126.2
Japan,2021,Asia,,125.7
";

    #[test]
    fn test_load_delimited() {
        let config = DashboardConfig::default();
        let ds = load_delimited(WORLD.as_bytes(), b',', &config).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.countries, vec!["France", "Japan"]);
        assert_eq!(
            ds.features,
            vec!["GDP (in Trillions USD)", "Population (in Millions)"]
        );
        assert_eq!(ds.columns[2].kind, ColumnKind::Text);
        assert_eq!(ds.records[3].metric("GDP (in Trillions USD)"), None);
        assert_eq!(ds.year_bounds, Some((2020, 2021)));
    }

    #[test]
    fn test_load_semicolon_delimited() {
        let config = DashboardConfig::default();
        let text = "Country;Year;Score\nPeru;2010;1.5\n";
        let ds = load_delimited(text.as_bytes(), b';', &config).unwrap();
        assert_eq!(ds.records[0].metric("Score"), Some(1.5));
    }

    #[test]
    fn test_header_only_fails() {
        let config = DashboardConfig::default();
        let err = load_delimited("Country,Year,GDP\n".as_bytes(), b',', &config).unwrap_err();
        assert!(err.to_string().contains("at least one data row"));
    }

    #[test]
    fn test_text_year_fails() {
        let config = DashboardConfig::default();
        let text = "Country,Year,GDP\nPeru,twenty,1.0\n";
        assert!(load_delimited(text.as_bytes(), b',', &config).is_err());
    }

    #[test]
    fn test_guess_cell_type() {
        assert_eq!(guess_cell_type(""), CellValue::Null);
        for token in ["NaN", "nan", "NA", "N/A", "n/a", "NULL", "null", "None", "#N/A", "<NA>"] {
            assert_eq!(guess_cell_type(token), CellValue::Null, "{token}");
        }
        assert_eq!(guess_cell_type("42"), CellValue::Integer(42));
        assert_eq!(guess_cell_type("4.5"), CellValue::Float(4.5));
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("Chad"), CellValue::Text("Chad".to_string()));
    }

    #[test]
    fn test_missing_tokens_keep_columns_numeric() {
        let config = DashboardConfig::default();
        let text = "Country,Year,GDP,Population\nPeru,2010,1.5,NA\nChile,2010,N/A,19\n";
        let ds = load_delimited(text.as_bytes(), b',', &config).unwrap();
        assert_eq!(ds.features, vec!["GDP", "Population"]);
        assert_eq!(ds.records[0].metric("Population"), None);
        assert_eq!(ds.records[1].metric("GDP"), None);
        assert_eq!(ds.records[1].metric("Population"), Some(19.0));
    }

    /// A scratch path under the system temp dir, removed on drop.
    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str) -> Self {
            TempFile(std::env::temp_dir().join(format!("global_metrics_{}_{name}", std::process::id())))
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn write_parquet(path: &Path, batch: &RecordBatch) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_load_parquet_normalizes_column_types() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(
                "Country",
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
                false,
            ),
            Field::new("Year", DataType::Int16, false),
            Field::new("Population", DataType::UInt32, false),
            Field::new("GDP", DataType::Float64, true),
            Field::new("Life Expectancy", DataType::Float32, false),
        ]));
        let countries: DictionaryArray<Int32Type> =
            vec!["France", "Japan", "France"].into_iter().collect();
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(countries),
                Arc::new(Int16Array::from(vec![2020, 2020, 2021])),
                Arc::new(UInt32Array::from(vec![67, 126, 68])),
                Arc::new(Float64Array::from(vec![Some(2.63), None, Some(2.96)])),
                Arc::new(Float32Array::from(vec![82.5, f32::NAN, 82.25])),
            ],
        )
        .unwrap();

        let tmp = TempFile::new("types.parquet");
        write_parquet(&tmp.0, &batch);
        let ds = load_file(&tmp.0, &DashboardConfig::default()).unwrap();

        assert_eq!(ds.countries, vec!["France", "Japan"]);
        assert_eq!(ds.features, vec!["Population", "GDP", "Life Expectancy"]);
        assert_eq!(ds.year_bounds, Some((2020, 2021)));
        assert_eq!(ds.records[1].metric("Population"), Some(126.0));
        assert_eq!(ds.records[1].metric("GDP"), None);
        assert_eq!(ds.records[1].metric("Life Expectancy"), None);
        assert_eq!(ds.records[2].metric("Life Expectancy"), Some(82.25));
    }

    #[test]
    fn test_load_parquet_rejects_unsupported_type() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Country", DataType::Utf8, false),
            Field::new("Year", DataType::Int64, false),
            Field::new("Recorded", DataType::Date32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Peru"])),
                Arc::new(Int64Array::from(vec![2010])),
                Arc::new(Date32Array::from(vec![14610])),
            ],
        )
        .unwrap();

        let tmp = TempFile::new("date.parquet");
        write_parquet(&tmp.0, &batch);
        let err = load_file(&tmp.0, &DashboardConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Recorded"));
    }

    #[test]
    fn test_load_json_records() {
        let tmp = TempFile::new("records.json");
        std::fs::write(
            &tmp.0,
            r#"[
                {"Country": "Peru", "Year": 2010, "GDP": 0.15},
                {"Country": "Chile", "Year": 2011, "GDP": null, "Population": 17}
            ]"#,
        )
        .unwrap();
        let ds = load_file(&tmp.0, &DashboardConfig::default()).unwrap();

        assert_eq!(ds.countries, vec!["Peru", "Chile"]);
        assert_eq!(ds.features, vec!["GDP", "Population"]);
        assert_eq!(ds.records[0].metric("Population"), None);
        assert_eq!(ds.records[1].metric("Population"), Some(17.0));
    }

    #[test]
    fn test_json_to_cell() {
        assert_eq!(json_to_cell(&serde_json::json!(2020)), CellValue::Integer(2020));
        assert_eq!(json_to_cell(&serde_json::json!(1.25)), CellValue::Float(1.25));
        assert_eq!(json_to_cell(&serde_json::json!(null)), CellValue::Null);
    }

    #[test]
    fn test_unsupported_extension() {
        let config = DashboardConfig::default();
        let err = load_file(Path::new("metrics.xlsx"), &config).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
