//! Aggregator Module
//! Groups records by one or two keys and reduces each bucket to a number.
//!
//! Key order at both levels is first occurrence in the filtered input, never
//! sorted, so the same rows always give the same table in the same order.

use super::record::Record;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    #[error("Cannot sum field '{field}' in record {row}: {}", describe_value(.value))]
    Parse {
        field: String,
        row: usize,
        value: Option<String>,
    },
    #[error("Record {row} has no '{field}' field to group by")]
    MissingKey { field: String, row: usize },
}

fn describe_value(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("'{}' is not a number", v),
        None => "field is absent".to_string(),
    }
}

/// How a bucket of records is reduced to one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Reduction {
    /// Sum of a numeric field
    Sum(String),
    /// Number of records
    Count,
}

/// One or two grouping fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKeys {
    pub primary: String,
    pub secondary: Option<String>,
}

impl GroupKeys {
    pub fn one(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    pub fn two(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: Some(secondary.into()),
        }
    }
}

/// Row predicate: `field == value`, compared loosely.
///
/// Trimmed strings that match are equal, and so are two values that both
/// parse to the same number ("2018" and "2018.0"). A record without the
/// field never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFilter {
    pub field: String,
    pub value: String,
}

impl RowFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.get(&self.field) else {
            return false;
        };
        let (actual, expected) = (actual.trim(), self.value.trim());
        if actual == expected {
            return true;
        }
        match (actual.parse::<f64>(), expected.parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// A second-level bucket and its reduced value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub key: String,
    pub value: f64,
}

/// A top-level bucket holding its second-level aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEntry {
    pub key: String,
    pub values: Vec<Aggregate>,
}

impl GroupEntry {
    pub fn value_for(&self, key: &str) -> Option<f64> {
        self.values.iter().find(|a| a.key == key).map(|a| a.value)
    }

    pub fn total(&self) -> f64 {
        self.values.iter().map(|a| a.value).sum()
    }
}

/// Ordered result of one aggregation run. Rebuilt, never edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTable {
    entries: Vec<GroupEntry>,
}

impl AggregateTable {
    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&GroupEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum over every leaf aggregate in the table.
    pub fn leaf_total(&self) -> f64 {
        self.entries.iter().map(GroupEntry::total).sum()
    }
}

/// Configured group-by/reduce run. Holds no state between runs.
#[derive(Debug, Clone)]
pub struct Aggregator {
    keys: GroupKeys,
    reduction: Reduction,
    filter: Option<RowFilter>,
    skip_bad_rows: bool,
}

impl Aggregator {
    pub fn new(keys: GroupKeys, reduction: Reduction) -> Self {
        Self {
            keys,
            reduction,
            filter: None,
            skip_bad_rows: false,
        }
    }

    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_optional_filter(mut self, filter: Option<RowFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Drop rows with a missing key or an unparseable summed value instead of
    /// failing. Skipped rows are counted in a warning.
    pub fn skip_bad_rows(mut self) -> Self {
        self.skip_bad_rows = true;
        self
    }

    /// Filter, then partition by the primary key, then by the secondary key,
    /// then reduce each leaf.
    ///
    /// With a single key every entry holds one aggregate keyed like the entry.
    pub fn aggregate(&self, records: &[Record]) -> Result<AggregateTable, AggregateError> {
        let mut skipped = 0usize;
        let filtered: Vec<(usize, &Record)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.filter.as_ref().map_or(true, |f| f.matches(r)))
            .filter(|&(row, r)| {
                let usable = !self.skip_bad_rows || self.is_usable(r, row);
                if !usable {
                    skipped += 1;
                }
                usable
            })
            .collect();
        if skipped > 0 {
            warn!(
                "Skipped {} records with a missing key or unparseable value",
                skipped
            );
        }

        let mut entries = Vec::new();
        for (key, bucket) in partition(&filtered, &self.keys.primary)? {
            let values = match &self.keys.secondary {
                Some(secondary) => partition(&bucket, secondary)?
                    .into_iter()
                    .map(|(sub_key, leaf)| {
                        Ok(Aggregate {
                            key: sub_key,
                            value: self.reduce(&leaf)?,
                        })
                    })
                    .collect::<Result<Vec<_>, AggregateError>>()?,
                None => vec![Aggregate {
                    key: key.clone(),
                    value: self.reduce(&bucket)?,
                }],
            };
            entries.push(GroupEntry { key, values });
        }

        debug!(
            "Aggregated {} of {} records into {} groups",
            filtered.len(),
            records.len(),
            entries.len()
        );
        Ok(AggregateTable { entries })
    }

    fn is_usable(&self, record: &Record, row: usize) -> bool {
        let keys_present = record.contains(&self.keys.primary)
            && self.keys.secondary.as_ref().map_or(true, |k| record.contains(k));
        let value_parses = match &self.reduction {
            Reduction::Sum(field) => parse_number(record, field, row).is_ok(),
            Reduction::Count => true,
        };
        keys_present && value_parses
    }

    fn reduce(&self, bucket: &[(usize, &Record)]) -> Result<f64, AggregateError> {
        match &self.reduction {
            Reduction::Count => Ok(bucket.len() as f64),
            Reduction::Sum(field) => bucket
                .iter()
                .map(|(row, record)| parse_number(record, field, *row))
                .sum(),
        }
    }
}

/// Split rows by `field`, keeping distinct keys in first-seen order.
fn partition<'a>(
    rows: &[(usize, &'a Record)],
    field: &str,
) -> Result<Vec<(String, Vec<(usize, &'a Record)>)>, AggregateError> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<(usize, &'a Record)>)> = Vec::new();

    for &(row, record) in rows {
        let key = record.get(field).ok_or_else(|| AggregateError::MissingKey {
            field: field.to_string(),
            row,
        })?;
        match index.get(key) {
            Some(&slot) => buckets[slot].1.push((row, record)),
            None => {
                index.insert(key, buckets.len());
                buckets.push((key.to_string(), vec![(row, record)]));
            }
        }
    }

    Ok(buckets)
}

fn parse_number(record: &Record, field: &str, row: usize) -> Result<f64, AggregateError> {
    let raw = record.get(field);
    raw.map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| AggregateError::Parse {
            field: field.to_string(),
            row,
            value: raw.map(str::to_string),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crime(district: &str, shooting: &str, year: &str, amount: &str) -> Record {
        Record::from_pairs([
            ("district", district),
            ("shooting", shooting),
            ("year", year),
            ("amount", amount),
        ])
    }

    fn sample() -> Vec<Record> {
        vec![
            crime("A", "Y", "2018", "2"),
            crime("A", "N", "2018", "5"),
            crime("A", "Y", "2018", "1.5"),
            crime("B", "Y", "2017", "4"),
        ]
    }

    fn by_district_and_flag(reduction: Reduction) -> Aggregator {
        Aggregator::new(GroupKeys::two("district", "shooting"), reduction)
    }

    #[test]
    fn test_count_for_one_year_keeps_first_seen_order() {
        let table = by_district_and_flag(Reduction::Count)
            .with_filter(RowFilter::equals("year", "2018"))
            .aggregate(&sample())
            .unwrap();

        // "Y" appears before "N" within district A
        let expected = vec![GroupEntry {
            key: "A".to_string(),
            values: vec![
                Aggregate {
                    key: "Y".to_string(),
                    value: 2.0,
                },
                Aggregate {
                    key: "N".to_string(),
                    value: 1.0,
                },
            ],
        }];
        assert_eq!(table.entries(), expected.as_slice());
    }

    #[test]
    fn test_top_level_order_is_not_sorted() {
        let records = vec![
            crime("Z", "Y", "2018", "1"),
            crime("A", "Y", "2018", "1"),
            crime("M", "", "2018", "1"),
            crime("A", "", "2018", "1"),
        ];
        let table = by_district_and_flag(Reduction::Count)
            .aggregate(&records)
            .unwrap();
        let keys: Vec<&str> = table.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Z", "A", "M"]);
        assert_eq!(table.get("A").unwrap().value_for(""), Some(1.0));
    }

    #[test]
    fn test_sum_matches_filtered_field_total() {
        let records = sample();
        let filter = RowFilter::equals("year", "2018");
        let table = by_district_and_flag(Reduction::Sum("amount".to_string()))
            .with_filter(filter.clone())
            .aggregate(&records)
            .unwrap();

        let expected: f64 = records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.get("amount").unwrap().parse::<f64>().unwrap())
            .sum();
        assert_eq!(table.leaf_total(), expected);
        assert_eq!(table.get("A").unwrap().value_for("Y"), Some(3.5));
    }

    #[test]
    fn test_count_matches_filtered_record_count() {
        let records = sample();
        for year in ["2018", "2017", "2016"] {
            let filter = RowFilter::equals("year", year);
            let table = by_district_and_flag(Reduction::Count)
                .with_filter(filter.clone())
                .aggregate(&records)
                .unwrap();
            let matching = records.iter().filter(|r| filter.matches(r)).count();
            assert_eq!(table.leaf_total(), matching as f64);
        }
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let records = sample();
        let aggregator = by_district_and_flag(Reduction::Sum("amount".to_string()));
        let first = aggregator.aggregate(&records).unwrap();
        let second = aggregator.aggregate(&records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_year_without_rows_gives_empty_table() {
        let table = by_district_and_flag(Reduction::Sum("amount".to_string()))
            .with_filter(RowFilter::equals("year", "2015"))
            .aggregate(&sample())
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.leaf_total(), 0.0);
    }

    #[test]
    fn test_non_numeric_sum_fails_loudly() {
        let mut records = sample();
        records.push(crime("B", "", "2017", "n/a"));

        let err = by_district_and_flag(Reduction::Sum("amount".to_string()))
            .aggregate(&records)
            .unwrap_err();
        assert_eq!(
            err,
            AggregateError::Parse {
                field: "amount".to_string(),
                row: 4,
                value: Some("n/a".to_string()),
            }
        );
    }

    #[test]
    fn test_bad_value_outside_filter_is_ignored() {
        let mut records = sample();
        records.push(crime("B", "", "2017", ""));

        let table = by_district_and_flag(Reduction::Sum("amount".to_string()))
            .with_filter(RowFilter::equals("year", "2018"))
            .aggregate(&records)
            .unwrap();
        assert_eq!(table.leaf_total(), 8.5);
    }

    #[test]
    fn test_skip_bad_rows_drops_unusable_records() {
        let mut records = sample();
        records.push(crime("B", "Y", "2016", "n/a"));
        records.push(Record::from_pairs([("shooting", "Y"), ("amount", "7")]));

        let table = by_district_and_flag(Reduction::Sum("amount".to_string()))
            .skip_bad_rows()
            .aggregate(&records)
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A").unwrap().value_for("Y"), Some(3.5));
        assert_eq!(table.get("B").unwrap().value_for("Y"), Some(4.0));
        assert_eq!(table.leaf_total(), 12.5);
    }

    #[test]
    fn test_absent_sum_field_is_a_parse_error() {
        let records = vec![Record::from_pairs([("district", "A"), ("shooting", "Y")])];
        let err = by_district_and_flag(Reduction::Sum("amount".to_string()))
            .aggregate(&records)
            .unwrap_err();
        assert!(matches!(err, AggregateError::Parse { value: None, .. }));
        assert!(err.to_string().contains("field is absent"));
    }

    #[test]
    fn test_missing_group_key() {
        let records = vec![Record::from_pairs([("shooting", "Y"), ("year", "2018")])];
        let err = by_district_and_flag(Reduction::Count)
            .aggregate(&records)
            .unwrap_err();
        assert_eq!(
            err,
            AggregateError::MissingKey {
                field: "district".to_string(),
                row: 0,
            }
        );
    }

    #[test]
    fn test_single_key_grouping() {
        let table = Aggregator::new(GroupKeys::one("district"), Reduction::Count)
            .aggregate(&sample())
            .unwrap();
        assert_eq!(table.len(), 2);
        let a = table.get("A").unwrap();
        assert_eq!(a.values.len(), 1);
        assert_eq!(a.value_for("A"), Some(3.0));
    }

    #[test]
    fn test_filter_compares_loosely() {
        let record = crime("A", "Y", " 2018.0", "1");
        assert!(RowFilter::equals("year", "2018").matches(&record));
        assert!(!RowFilter::equals("year", "2017").matches(&record));
        assert!(!RowFilter::equals("month", "1").matches(&record));
    }
}
