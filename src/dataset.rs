//! Tabular neighborhood metrics, one row per neighborhood observation.

use crate::config::ColumnNames;
use crate::error::{LoadError, io_err};
use csv::{ReaderBuilder, StringRecord};
use log::info;
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodRecord {
    /// Join key against the boundary name property
    pub name: String,
    pub rank: i64,
    pub opportunity_cost: Decimal,
    /// Only drives the choropleth color scale
    pub map_factor: f64,
    /// Raw text of every other column, in header order
    pub extra: Vec<String>,
}

/// Every field of a row; two rows with equal keys are exact duplicates.
pub(crate) type RowKey<'a> = (&'a str, i64, Decimal, OrderedFloat<f64>, &'a [String]);

impl NeighborhoodRecord {
    pub fn new(name: &str, rank: i64, opportunity_cost: Decimal, map_factor: f64) -> Self {
        Self {
            name: name.to_string(),
            rank,
            opportunity_cost,
            map_factor,
            extra: Vec::new(),
        }
    }

    pub(crate) fn row_key(&self) -> RowKey<'_> {
        (
            self.name.as_str(),
            self.rank,
            self.opportunity_cost,
            OrderedFloat(self.map_factor),
            self.extra.as_slice(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub extra_columns: Vec<String>,
    pub records: Vec<NeighborhoodRecord>,
}

struct ColumnIndices {
    name: usize,
    rank: usize,
    opportunity_cost: usize,
    map_factor: usize,
    extra: Vec<usize>,
}

impl ColumnIndices {
    fn from_header(
        header: &StringRecord,
        columns: &ColumnNames,
        path: &Path,
    ) -> Result<Self, LoadError> {
        let find = |column: &str| {
            header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| LoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };

        let name = find(&columns.name)?;
        let rank = find(&columns.rank)?;
        let opportunity_cost = find(&columns.opportunity_cost)?;
        let map_factor = find(&columns.map_factor)?;

        let extra = (0..header.len())
            .filter(|i| ![name, rank, opportunity_cost, map_factor].contains(i))
            .collect();

        Ok(Self {
            name,
            rank,
            opportunity_cost,
            map_factor,
            extra,
        })
    }
}

// Rows have the header's width; csv rejects ragged rows.
fn cell(row: &StringRecord, index: usize) -> &str {
    row.get(index).unwrap_or_default()
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

impl Dataset {
    pub fn load(path: &Path, columns: &ColumnNames) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|e| io_err!(path, e))?;
        let dataset = Self::from_reader(BufReader::new(file), columns, path)?;

        info!(
            "Loaded {} neighborhood rows from {}",
            dataset.records.len(),
            path.display()
        );

        Ok(dataset)
    }

    /// `path` only labels errors.
    pub fn from_reader<R: Read>(
        reader: R,
        columns: &ColumnNames,
        path: &Path,
    ) -> Result<Self, LoadError> {
        let csv_err = |source: csv::Error| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(reader);

        let header = rdr.headers().map_err(csv_err)?.clone();
        let indices = ColumnIndices::from_header(&header, columns, path)?;

        let mut records = vec![];

        for (row_number, csv_row) in rdr.records().enumerate() {
            let row = csv_row.map_err(csv_err)?;
            // header is line 1
            let line = row_number + 2;

            let invalid = |column: &str, value: &str| LoadError::InvalidValue {
                path: path.to_path_buf(),
                row: line,
                column: column.to_string(),
                value: value.to_string(),
            };

            let name = cell(&row, indices.name);

            let rank_text = cell(&row, indices.rank);
            let rank = rank_text
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(&columns.rank, rank_text))?;

            let cost_text = cell(&row, indices.opportunity_cost);
            let opportunity_cost = parse_decimal(cost_text)
                .ok_or_else(|| invalid(&columns.opportunity_cost, cost_text))?;

            let factor_text = cell(&row, indices.map_factor);
            let map_factor = factor_text
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid(&columns.map_factor, factor_text))?;

            let extra = indices
                .extra
                .iter()
                .map(|&i| cell(&row, i).to_string())
                .collect();

            records.push(NeighborhoodRecord {
                name: name.to_string(),
                rank,
                opportunity_cost,
                map_factor,
                extra,
            });
        }

        let extra_columns = indices
            .extra
            .iter()
            .map(|&i| header[i].to_string())
            .collect();

        Ok(Self {
            extra_columns,
            records,
        })
    }
}
