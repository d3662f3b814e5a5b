//! Date x variety price table with weekly continuity.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::WEEK_DAYS;
use crate::extract::{DocumentRecord, PriceMap};

/// Sparse `date -> variety -> price` records accumulated over a run.
pub type PriceRecords = BTreeMap<NaiveDate, PriceMap>;

/// Folds one document into the run's records. Keys already present for the
/// same date are overwritten.
pub fn merge_document(records: &mut PriceRecords, document: DocumentRecord) {
    records.entry(document.date).or_default().extend(document.prices);
}

/// Dense table: one row per date, one column per variety.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub varieties: Vec<String>,
    pub prices: BTreeMap<String, Vec<Option<u32>>>,
    pub interpolated: BTreeMap<String, Vec<bool>>,
}

impl PriceTable {
    /// Densifies `records` onto a weekly grid and fills the gaps. Returns
    /// `None` when there is nothing to tabulate.
    pub fn assemble(records: &PriceRecords) -> Option<Self> {
        let first = *records.keys().next()?;
        let last = *records.keys().next_back()?;
        let dates = weekly_rows(first, last, records.keys().copied());

        let varieties: Vec<String> = records
            .values()
            .flat_map(|prices| prices.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if varieties.is_empty() {
            return None;
        }

        let mut prices = BTreeMap::new();
        let mut interpolated = BTreeMap::new();
        for variety in &varieties {
            let observed: Vec<Option<u32>> = dates
                .iter()
                .map(|date| records.get(date).and_then(|row| row.get(variety)).copied())
                .collect();
            let filled = fill_gaps(&dates, &observed);
            let flags: Vec<bool> = observed
                .iter()
                .zip(&filled)
                .map(|(seen, value)| seen.is_none() && value.is_some())
                .collect();
            prices.insert(variety.clone(), filled);
            interpolated.insert(variety.clone(), flags);
        }

        Some(Self {
            dates,
            varieties,
            prices,
            interpolated,
        })
    }

    /// Percent change per variety. Each value compares a row with the one
    /// before it, which is not always 7 days earlier since off-grid report
    /// dates are kept as rows.
    pub fn wow_change(&self) -> BTreeMap<String, Vec<Option<f64>>> {
        self.prices
            .iter()
            .map(|(variety, column)| (variety.clone(), week_over_week(column)))
            .collect()
    }
}

/// Every 7th day from `first` through `last`, plus the observed dates that
/// fall between grid points.
fn weekly_rows(first: NaiveDate, last: NaiveDate, observed: impl Iterator<Item = NaiveDate>) -> Vec<NaiveDate> {
    let mut rows: BTreeSet<NaiveDate> = observed.collect();
    let mut day = first;
    while day <= last {
        rows.insert(day);
        day += Duration::days(WEEK_DAYS);
    }
    rows.into_iter().collect()
}

/// Linear interpolation in calendar days between known neighbours, then
/// forward and backward fill at the edges.
pub fn fill_gaps(dates: &[NaiveDate], column: &[Option<u32>]) -> Vec<Option<u32>> {
    let known: Vec<usize> = (0..column.len()).filter(|&i| column[i].is_some()).collect();
    if known.is_empty() {
        return column.to_vec();
    }

    (0..column.len())
        .map(|i| {
            if column[i].is_some() {
                return column[i];
            }
            let prev = known.iter().rev().find(|&&k| k < i).copied();
            let next = known.iter().find(|&&k| k > i).copied();
            match (prev, next) {
                (Some(p), Some(n)) => {
                    let (vp, vn) = (f64::from(column[p]?), f64::from(column[n]?));
                    let span = (dates[n] - dates[p]).num_days() as f64;
                    let offset = (dates[i] - dates[p]).num_days() as f64;
                    Some((vp + (vn - vp) * offset / span).round() as u32)
                }
                (Some(p), None) => column[p],
                (None, Some(n)) => column[n],
                (None, None) => None,
            }
        })
        .collect()
}

/// Percent change against the previous row, to two decimals. `None` on the
/// first row and wherever either side is missing.
pub fn week_over_week(column: &[Option<u32>]) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            let (previous, current) = (column[i - 1]?, column[i]?);
            if previous == 0 {
                return None;
            }
            let change = (f64::from(current) - f64::from(previous)) / f64::from(previous) * 100.0;
            Some((change * 100.0).round() / 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::DateSource;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn records(rows: Vec<(NaiveDate, Vec<(&str, u32)>)>) -> PriceRecords {
        rows.into_iter()
            .map(|(date, prices)| {
                let map = prices.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
                (date, map)
            })
            .collect()
    }

    #[test]
    fn wow_change_basic() {
        assert_eq!(week_over_week(&[Some(1000), Some(1100)]), vec![None, Some(10.0)]);
        assert_eq!(week_over_week(&[Some(1000), None]), vec![None, None]);
        assert_eq!(week_over_week(&[Some(3000), Some(1000)]), vec![None, Some(-66.67)]);
        assert!(week_over_week(&[]).is_empty());
    }

    #[test]
    fn missing_week_is_interpolated() {
        let d0 = ymd(2025, 11, 6);
        let d2 = ymd(2025, 11, 20);
        let table = PriceTable::assemble(&records(vec![(d0, vec![("KDL", 100)]), (d2, vec![("KDL", 300)])])).unwrap();

        assert_eq!(table.dates, vec![d0, ymd(2025, 11, 13), d2]);
        assert_eq!(table.prices["KDL"], vec![Some(100), Some(200), Some(300)]);
        assert_eq!(table.interpolated["KDL"], vec![false, true, false]);
    }

    #[test]
    fn edges_are_forward_and_back_filled() {
        let d0 = ymd(2025, 11, 6);
        let d1 = ymd(2025, 11, 13);
        let d2 = ymd(2025, 11, 20);
        let table = PriceTable::assemble(&records(vec![
            (d0, vec![("A", 1000)]),
            (d1, vec![("A", 1100), ("B", 500)]),
            (d2, vec![("A", 1200)]),
        ]))
        .unwrap();

        assert_eq!(table.varieties, vec!["A", "B"]);
        assert_eq!(table.prices["B"], vec![Some(500), Some(500), Some(500)]);
        assert_eq!(table.interpolated["B"], vec![true, false, true]);
        assert_eq!(table.wow_change()["A"], vec![None, Some(10.0), Some(9.09)]);
    }

    #[test]
    fn off_grid_dates_are_kept_and_weighted_by_days() {
        let d0 = ymd(2025, 11, 6);
        let thu = ymd(2025, 11, 20);
        let mon = ymd(2025, 11, 24);
        let table = PriceTable::assemble(&records(vec![(d0, vec![("A", 1000)]), (mon, vec![("A", 1800)])]))
        .unwrap();

        assert_eq!(table.dates, vec![d0, ymd(2025, 11, 13), thu, mon]);
        assert_eq!(table.prices["A"], vec![Some(1000), Some(1311), Some(1622), Some(1800)]);
        assert_eq!(table.interpolated["A"], vec![false, true, true, false]);
    }

    #[test]
    fn empty_records_produce_no_table() {
        assert!(PriceTable::assemble(&PriceRecords::new()).is_none());
        let only_empty = records(vec![(ymd(2025, 11, 6), vec![])]);
        assert!(PriceTable::assemble(&only_empty).is_none());
    }

    #[test]
    fn later_documents_overwrite_same_date() {
        let date = ymd(2025, 12, 1);
        let mut all = PriceRecords::new();
        for (key, price) in [("A", 100), ("A", 200)] {
            merge_document(
                &mut all,
                DocumentRecord {
                    date,
                    date_source: DateSource::Filename,
                    prices: [(key.to_string(), price)].into_iter().collect(),
                },
            );
        }
        merge_document(
            &mut all,
            DocumentRecord {
                date,
                date_source: DateSource::Filename,
                prices: [("B".to_string(), 300)].into_iter().collect(),
            },
        );
        assert_eq!(all[&date]["A"], 200);
        assert_eq!(all[&date]["B"], 300);
    }

    #[test]
    fn all_empty_column_stays_null() {
        let dates = [ymd(2025, 11, 6), ymd(2025, 11, 13)];
        assert_eq!(fill_gaps(&dates, &[None, None]), vec![None, None]);
    }
}
