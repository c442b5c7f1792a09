//! Summary statistics over the neighborhood rows behind the metric widgets.

use crate::dataset::NeighborhoodRecord;
use crate::format::round2;
use ahash::AHashSet;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    Rank,
    OpportunityCost,
    MapFactor,
}

impl MetricField {
    fn value(self, record: &NeighborhoodRecord) -> Decimal {
        match self {
            MetricField::Rank => Decimal::from(record.rank),
            MetricField::OpportunityCost => record.opportunity_cost,
            // non-finite factors count as zero
            MetricField::MapFactor => Decimal::from_f64(record.map_factor).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricMode {
    Sum,
    Average,
}

/// Rows matching `selected_name` (all rows when empty), exact duplicates
/// removed. The first occurrence of a duplicate is the one kept.
pub fn select_rows<'a>(
    records: &'a [NeighborhoodRecord],
    selected_name: &str,
) -> Vec<&'a NeighborhoodRecord> {
    let mut seen = AHashSet::new();

    records
        .iter()
        .filter(|record| selected_name.is_empty() || record.name == selected_name)
        .filter(|&record| seen.insert(record.row_key()))
        .collect()
}

/// Sum or average of `field` over the selected rows, rounded to 2 places.
/// The average of zero rows is zero.
pub fn compute_metric(
    records: &[NeighborhoodRecord],
    selected_name: &str,
    field: MetricField,
    mode: MetricMode,
) -> Decimal {
    let rows = select_rows(records, selected_name);
    let total: Decimal = rows.iter().map(|record| field.value(record)).sum();

    let result = match mode {
        MetricMode::Sum => total,
        MetricMode::Average if rows.is_empty() => Decimal::ZERO,
        MetricMode::Average => total / Decimal::from(rows.len()),
    };

    round2(result)
}

/// The two widgets shown under the map for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodSummary {
    pub selection: String,
    /// Sum of ranks
    pub rank: Decimal,
    /// Average opportunity cost
    pub opportunity_cost: Decimal,
}

impl NeighborhoodSummary {
    pub fn compute(records: &[NeighborhoodRecord], selection: &str) -> Self {
        Self {
            selection: selection.to_string(),
            rank: compute_metric(records, selection, MetricField::Rank, MetricMode::Sum),
            opportunity_cost: compute_metric(
                records,
                selection,
                MetricField::OpportunityCost,
                MetricMode::Average,
            ),
        }
    }
}
