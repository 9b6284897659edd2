//! Columnar view of a trial CSV file
//!
//! Every cell is parsed as `f64`. Boolean flags written as `True`/`False`
//! become `1.0`/`0.0` and empty cells become NaN; anything else that is not a
//! number is a parse error.

use std::{collections::HashMap, io};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("{source}")]
    Csv { source: csv::Error },
    #[display("line {line}, column '{column}': cannot parse '{value}' as a number")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },
}

/// A trial file held as named numeric columns.
#[derive(Debug, Clone, Default)]
pub struct TrialTable {
    index: HashMap<String, usize>,
    columns: Vec<Vec<f64>>,
    num_rows: usize,
}

impl TrialTable {
    /// Parses CSV with a header row.
    pub fn from_reader<R>(reader: R) -> Result<Self, TableError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|source| TableError::Csv { source })?
            .clone();
        let mut columns = vec![Vec::new(); headers.len()];
        let mut num_rows = 0;

        for record in reader.records() {
            let record = record.map_err(|source| TableError::Csv { source })?;
            let line = record.position().map_or(0, csv::Position::line);
            for (idx, (column, value)) in headers.iter().zip(&record).enumerate() {
                let parsed = parse_cell(value).ok_or_else(|| TableError::InvalidValue {
                    line,
                    column: column.to_owned(),
                    value: value.to_owned(),
                })?;
                columns[idx].push(parsed);
            }
            num_rows += 1;
        }

        // Later duplicates of a header are shadowed by the first occurrence.
        let mut index = HashMap::new();
        for (idx, name) in headers.iter().enumerate() {
            index.entry(name.to_owned()).or_insert(idx);
        }

        Ok(Self {
            index,
            columns,
            num_rows,
        })
    }

    /// Builds a table from named columns of equal length.
    ///
    /// # Panics
    ///
    /// Panics if the columns have different lengths.
    #[must_use]
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for (name, values) in columns {
            if table.columns.is_empty() {
                table.num_rows = values.len();
            }
            assert_eq!(values.len(), table.num_rows, "columns must have equal length");
            let name = name.into();
            if !table.index.contains_key(&name) {
                table.index.insert(name, table.columns.len());
            }
            table.columns.push(values);
        }
        table
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&idx| self.columns[idx].as_slice())
    }
}

fn parse_cell(value: &str) -> Option<f64> {
    match value {
        "" => Some(f64::NAN),
        "True" | "true" => Some(1.0),
        "False" | "false" => Some(0.0),
        _ => value.parse().ok(),
    }
}
