use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const FIRST_YEAR: i64 = 2000;
const LAST_YEAR: i64 = 2023;

/// (country, continent, GDP 2000 in trillions, population 2000 in millions,
///  life expectancy 2000, CO2 2000 in Mt)
const COUNTRIES: [(&str, &str, f64, f64, f64, f64); 10] = [
    ("United States", "North America", 10.25, 282.2, 76.6, 6010.0),
    ("China", "Asia", 1.21, 1262.6, 71.4, 3405.0),
    ("Japan", "Asia", 4.97, 126.8, 81.1, 1264.0),
    ("Germany", "Europe", 1.95, 82.2, 78.0, 900.0),
    ("India", "Asia", 0.47, 1056.6, 62.5, 1032.0),
    ("United Kingdom", "Europe", 1.66, 58.9, 77.7, 565.0),
    ("France", "Europe", 1.36, 60.9, 78.9, 400.0),
    ("Brazil", "South America", 0.66, 175.9, 70.1, 345.0),
    ("Nigeria", "Africa", 0.07, 122.9, 46.3, 80.0),
    ("Australia", "Oceania", 0.42, 19.2, 79.2, 350.0),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[-1, 1)`.
    fn jitter(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }
}

struct Columns {
    country: Vec<String>,
    year: Vec<i64>,
    continent: Vec<String>,
    gdp: Vec<f64>,
    population: Vec<f64>,
    life_expectancy: Vec<f64>,
    co2: Vec<f64>,
}

fn generate(rng: &mut SimpleRng) -> Columns {
    let mut cols = Columns {
        country: Vec::new(),
        year: Vec::new(),
        continent: Vec::new(),
        gdp: Vec::new(),
        population: Vec::new(),
        life_expectancy: Vec::new(),
        co2: Vec::new(),
    };

    // Rows ordered by year, then country, like a yearly statistics export.
    let mut current: Vec<(f64, f64, f64, f64)> = COUNTRIES
        .iter()
        .map(|&(_, _, gdp, pop, life, co2)| (gdp, pop, life, co2))
        .collect();

    for year in FIRST_YEAR..=LAST_YEAR {
        for (i, &(name, continent, ..)) in COUNTRIES.iter().enumerate() {
            let (gdp, pop, life, co2) = &mut current[i];
            if year > FIRST_YEAR {
                *gdp *= 1.0 + 0.045 + 0.03 * rng.jitter();
                *pop *= 1.0 + 0.008 + 0.004 * rng.jitter();
                *life += 0.18 + 0.1 * rng.jitter();
                *co2 *= 1.0 + 0.01 + 0.03 * rng.jitter();
            }
            cols.country.push(name.to_string());
            cols.year.push(year);
            cols.continent.push(continent.to_string());
            cols.gdp.push(round2(*gdp));
            cols.population.push(round2(*pop));
            cols.life_expectancy.push(round2(*life));
            cols.co2.push(round2(*co2));
        }
    }
    cols
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

const HEADERS: [&str; 7] = [
    "Country",
    "Year",
    "Continent",
    "GDP (in Trillions USD)",
    "Population (in Millions)",
    "Life Expectancy",
    "CO2 Emissions (in Million Metric Tons)",
];

fn write_csv(cols: &Columns, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record(HEADERS)?;
    for i in 0..cols.country.len() {
        writer.write_record([
            cols.country[i].clone(),
            cols.year[i].to_string(),
            cols.continent[i].clone(),
            cols.gdp[i].to_string(),
            cols.population[i].to_string(),
            cols.life_expectancy[i].to_string(),
            cols.co2[i].to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

fn write_parquet(cols: &Columns, path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Int64, false),
        Field::new(HEADERS[2], DataType::Utf8, false),
        Field::new(HEADERS[3], DataType::Float64, false),
        Field::new(HEADERS[4], DataType::Float64, false),
        Field::new(HEADERS[5], DataType::Float64, false),
        Field::new(HEADERS[6], DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(cols.country.clone())),
            Arc::new(Int64Array::from(cols.year.clone())),
            Arc::new(StringArray::from(cols.continent.clone())),
            Arc::new(Float64Array::from(cols.gdp.clone())),
            Arc::new(Float64Array::from(cols.population.clone())),
            Arc::new(Float64Array::from(cols.life_expectancy.clone())),
            Arc::new(Float64Array::from(cols.co2.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let cols = generate(&mut rng);

    write_csv(&cols, "Dataset.csv")?;
    write_parquet(&cols, "sample_data.parquet")?;

    println!(
        "Wrote {} rows ({} countries, {FIRST_YEAR}-{LAST_YEAR}) to Dataset.csv and sample_data.parquet",
        cols.country.len(),
        COUNTRIES.len()
    );
    Ok(())
}
