//! Record and Dataset types
//! One CSV row is a field-name to string map; a dataset is the ordered rows.

use std::collections::{HashMap, HashSet};

/// A single CSV row. Values stay as strings until a reduction needs a number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    /// Build a record from `(field, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// The loaded CSV: column names in file order plus every row in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// First column of `required` the dataset lacks, if any.
    pub fn require_columns<'a>(&self, required: &[&'a str]) -> Result<(), &'a str> {
        match required.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(missing),
            None => Ok(()),
        }
    }

    /// Distinct values of `field`, in order of first appearance.
    pub fn distinct_values(&self, field: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.get(field))
            .filter(|v| seen.insert(v.to_string()))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lookup() {
        let record = Record::from_pairs([("district", "A"), ("shooting", "")]);
        assert_eq!(record.get("district"), Some("A"));
        assert_eq!(record.get("shooting"), Some(""));
        assert_eq!(record.get("year"), None);
        assert!(record.contains("shooting"));
    }

    #[test]
    fn test_distinct_values_keep_first_seen_order() {
        let records = ["2017", "2018", "2017", "2015", "2018"]
            .iter()
            .map(|y| Record::from_pairs([("year", *y)]))
            .collect();
        let dataset = Dataset::new(vec!["year".to_string()], records);

        assert_eq!(dataset.distinct_values("year"), vec!["2017", "2018", "2015"]);
        assert!(dataset.distinct_values("district").is_empty());
        assert!(dataset.has_column("year"));
        assert_eq!(dataset.require_columns(&["year"]), Ok(()));
        assert_eq!(dataset.require_columns(&["year", "district"]), Err("district"));
        assert_eq!(dataset.len(), 5);
    }
}
