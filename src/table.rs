use std::collections::HashMap;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    /// True when every present cell is numeric, the way a CSV reader would
    /// infer a float column. An all-missing column counts as numeric.
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .all(|value| value.is_null() || matches!(value, Value::Number(_)))
    }

    pub fn max_number(&self) -> Option<f64> {
        self.values
            .iter()
            .filter_map(Value::as_f64)
            .fold(None, |acc, value| match acc {
                Some(current) if current >= value => Some(current),
                _ => Some(value),
            })
    }
}

/// Column-oriented table; every column holds the same number of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn from_columns(columns: Vec<Column>) -> AnalysisResult<Self> {
        if let Some(first) = columns.first() {
            let height = first.values.len();
            if let Some(bad) = columns.iter().find(|column| column.values.len() != height) {
                return Err(AnalysisError::schema(format!(
                    "column '{}' has {} values, expected {}",
                    bad.name,
                    bad.values.len(),
                    height
                )));
            }
        }
        Ok(Table { columns })
    }

    pub fn from_reader<R: io::Read>(reader: R) -> AnalysisResult<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::new()))
            .collect();

        for result in reader.records() {
            let record = result?;
            for (column, cell) in columns.iter_mut().zip(record.iter()) {
                column.values.push(Value::parse(cell));
            }
        }

        Table::from_columns(columns)
    }

    pub fn from_path(path: &Path) -> AnalysisResult<Self> {
        let file = std::fs::File::open(path)?;
        let table = Table::from_reader(io::BufReader::new(file))?;
        debug!(
            path = %path.display(),
            rows = table.height(),
            cols = table.width(),
            "loaded CSV"
        );
        Ok(table)
    }

    /// Stacks tables vertically. Columns are matched by canonical key (the
    /// n-th column with a key in one table meets the n-th with that key in
    /// the next) and keep the first-seen name and order; a table lacking a
    /// column contributes missing cells.
    pub fn concat(tables: &[Table]) -> AnalysisResult<Self> {
        let mut slots: Vec<(String, usize)> = Vec::new();
        let mut columns: Vec<Column> = Vec::new();
        let mut stacked = 0;

        for table in tables {
            let height = table.height();
            let mut filled = vec![false; columns.len()];
            let mut occurrences: HashMap<String, usize> = HashMap::new();

            for source in &table.columns {
                let key = canonical_key(&source.name);
                let occurrence = occurrences.entry(key.clone()).or_insert(0);
                let slot = (key, *occurrence);
                *occurrence += 1;

                let index = match slots.iter().position(|existing| *existing == slot) {
                    Some(index) => index,
                    None => {
                        slots.push(slot);
                        columns.push(Column::new(
                            source.name.clone(),
                            vec![Value::Null; stacked],
                        ));
                        filled.push(false);
                        columns.len() - 1
                    }
                };
                let target = &mut columns[index];
                if target.name != source.name {
                    debug!(kept = %target.name, merged = %source.name, "matched column by key");
                }
                target.values.extend(source.values.iter().cloned());
                filled[index] = true;
            }

            for (column, _) in columns.iter_mut().zip(&filled).filter(|(_, done)| !**done) {
                column
                    .values
                    .extend(std::iter::repeat(Value::Null).take(height));
            }
            stacked += height;
        }

        Table::from_columns(columns)
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, |column| column.values.len())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }

    pub fn push_column(&mut self, column: Column) -> AnalysisResult<()> {
        if !self.columns.is_empty() && column.values.len() != self.height() {
            return Err(AnalysisError::schema(format!(
                "column '{}' has {} values, expected {}",
                column.name,
                column.values.len(),
                self.height()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// First `n` rows, every column kept.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|column| {
                    Column::new(
                        column.name.clone(),
                        column.values.iter().take(n).cloned().collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Case- and spacing-insensitive form of a column name: trimmed, lowercased,
/// inner whitespace runs collapsed to a single underscore.
pub fn canonical_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Canonical key to column positions, in column order. Built once per table
/// so that later lookups are exact map hits.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    positions: HashMap<String, Vec<usize>>,
}

impl KeyIndex {
    pub fn build(table: &Table) -> Self {
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, column) in table.columns().iter().enumerate() {
            positions
                .entry(canonical_key(&column.name))
                .or_default()
                .push(index);
        }
        KeyIndex { positions }
    }

    pub fn first(&self, key: &str) -> Option<usize> {
        self.positions.get(key).and_then(|found| found.first().copied())
    }

    pub fn all(&self, key: &str) -> &[usize] {
        self.positions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_csv_and_types_cells() {
        let csv = "State,Account length,Churn\nNY,10,Yes\nCA,,No\n";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.column_names(), vec!["State", "Account length", "Churn"]);
        let tenure = table.column("Account length").unwrap();
        assert_eq!(tenure.values, vec![Value::Number(10.0), Value::Null]);
        assert!(tenure.is_numeric());
        assert!(!table.column("Churn").unwrap().is_numeric());
    }

    #[test]
    fn concat_fills_absent_columns() {
        let train = Table::from_reader("State,Churn\nNY,Yes\n".as_bytes()).unwrap();
        let test = Table::from_reader("Churn,Area_code\nNo,415\n".as_bytes()).unwrap();
        let merged = Table::concat(&[train, test]).unwrap();
        assert_eq!(merged.height(), 2);
        assert_eq!(merged.column_names(), vec!["State", "Churn", "Area_code"]);
        assert_eq!(
            merged.column("State").unwrap().values,
            vec![Value::Text("NY".to_string()), Value::Null]
        );
    }

    #[test]
    fn concat_matches_names_by_key() {
        let train = Table::from_reader("State,Churn\nNY,Yes\n".as_bytes()).unwrap();
        let test = Table::from_reader("state,Churn \nCA,Yes\n".as_bytes()).unwrap();
        let merged = Table::concat(&[train, test]).unwrap();
        assert_eq!(merged.column_names(), vec!["State", "Churn"]);
        assert_eq!(
            merged.column("Churn").unwrap().values,
            vec![Value::Text("Yes".to_string()); 2]
        );
    }

    #[test]
    fn concat_keeps_duplicates_within_one_table() {
        let only = Table::from_reader("Churn,churn \nYes,No\n".as_bytes()).unwrap();
        let merged = Table::concat(&[only]).unwrap();
        assert_eq!(merged.column_names(), vec!["Churn", "churn "]);
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = Table::from_columns(vec![
            Column::new("a", vec![Value::Null]),
            Column::new("b", vec![]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn canonical_key_ignores_case_and_spacing() {
        assert_eq!(canonical_key(" Account length "), "account_length");
        assert_eq!(canonical_key("ACCOUNT_LENGTH"), "account_length");
        assert_eq!(canonical_key("International  plan"), "international_plan");
    }

    #[test]
    fn key_index_keeps_every_match_in_order() {
        let table = Table::from_columns(vec![
            Column::new("Churn", vec![]),
            Column::new("State", vec![]),
            Column::new("churn", vec![]),
        ])
        .unwrap();
        let index = KeyIndex::build(&table);
        assert_eq!(index.all("churn"), &[0, 2]);
        assert_eq!(index.first("state"), Some(1));
        assert_eq!(index.first("missing"), None);
    }
}
