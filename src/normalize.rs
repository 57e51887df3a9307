use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{TenureBucket, Value};
use crate::table::{canonical_key, Column, KeyIndex, Table};

pub const CHURN_FLAG_COLUMN: &str = "Churn_flag";
pub const TENURE_BUCKET_COLUMN: &str = "Tenure_Bucket";

pub const CHURN_KEY: &str = "churn";
pub const ACCOUNT_LENGTH_KEY: &str = "account_length";

const TRUE_TOKENS: [&str; 4] = ["yes", "y", "true", "1"];

/// Upper (inclusive) edge of the `New` bucket.
pub const NEW_UPPER: f64 = 50.0;
/// Upper (inclusive) edge of the `Mid` bucket.
pub const MID_UPPER: f64 = 150.0;

/// Bucket edges for one table. The interior cutoffs are fixed; the top edge
/// follows the largest account length observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TenureBins {
    pub new_upper: f64,
    pub mid_upper: f64,
    pub top: f64,
}

impl TenureBins {
    pub fn from_observed_max(max: Option<f64>) -> Self {
        let top = max.map_or(0.0, |value| value.floor() + 1.0);
        TenureBins {
            new_upper: NEW_UPPER,
            mid_upper: MID_UPPER,
            top: top.max(MID_UPPER + 1.0),
        }
    }

    /// Missing or non-numeric lengths count as zero and land in `New`.
    pub fn bucket(&self, account_length: Option<f64>) -> TenureBucket {
        let value = account_length.unwrap_or(0.0);
        if value <= self.new_upper {
            TenureBucket::New
        } else if value <= self.mid_upper {
            TenureBucket::Mid
        } else {
            TenureBucket::Long
        }
    }
}

/// A table whose names are trimmed and unique, carrying a boolean churn flag
/// and (when an account length is present) a tenure bucket.
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    table: Table,
    churn_column: String,
    keys: KeyIndex,
    tenure_bins: Option<TenureBins>,
}

impl CanonicalTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Name of the source churn column, before derivation.
    pub fn churn_column(&self) -> &str {
        &self.churn_column
    }

    pub fn tenure_bins(&self) -> Option<TenureBins> {
        self.tenure_bins
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }

    /// Exact lookup by canonical key (see [`canonical_key`]).
    pub fn column_by_key(&self, key: &str) -> Option<&Column> {
        self.keys
            .first(key)
            .and_then(|index| self.table.column_at(index))
    }

    pub fn churn_flags(&self) -> Vec<bool> {
        self.column_by_key(&canonical_key(CHURN_FLAG_COLUMN))
            .map(|column| {
                column
                    .values
                    .iter()
                    .map(|value| matches!(value, Value::Bool(true)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn into_parts(self) -> (Table, String) {
        (self.table, self.churn_column)
    }
}

/// Normalizes a raw table into its canonical form.
///
/// Fails with a schema error when no column is named `churn` (ignoring case
/// and surrounding whitespace). Individual cells never fail: unrecognised
/// churn tokens map to `false` and unusable account lengths to `New`.
pub fn normalize(raw: Table) -> AnalysisResult<CanonicalTable> {
    let mut table = raw;
    trim_column_names(&mut table);
    let keys = KeyIndex::build(&table);

    let churn_matches = keys.all(CHURN_KEY);
    let churn_index = *churn_matches
        .first()
        .ok_or_else(|| AnalysisError::schema("missing churn column"))?;
    if churn_matches.len() > 1 {
        let ignored: Vec<&str> = churn_matches[1..]
            .iter()
            .filter_map(|index| table.column_at(*index))
            .map(|column| column.name.as_str())
            .collect();
        warn!(?ignored, "several churn columns found, using the first");
    }

    let churn_source = table
        .column_at(churn_index)
        .ok_or_else(|| AnalysisError::schema("missing churn column"))?;
    let churn_column = churn_source.name.clone();
    let flags = derive_churn_flags(churn_source);
    replace_column(&mut table, Column::new(CHURN_FLAG_COLUMN, flags))?;

    let keys = KeyIndex::build(&table);
    let existing_bucket = keys.first(&canonical_key(TENURE_BUCKET_COLUMN));
    let mut tenure_bins = None;
    if let Some(index) = existing_bucket {
        debug!("tenure bucket already present, keeping it");
        if let Some(column) = table.columns_mut().get_mut(index) {
            column.values.iter_mut().for_each(retype_bucket);
        }
    } else if let Some(index) = keys.first(ACCOUNT_LENGTH_KEY) {
        if let Some(source) = table.column_at(index) {
            let bins = TenureBins::from_observed_max(source.max_number());
            let buckets = source
                .values
                .iter()
                .map(|value| Value::Bucket(bins.bucket(value.as_f64())))
                .collect();
            table.push_column(Column::new(TENURE_BUCKET_COLUMN, buckets))?;
            tenure_bins = Some(bins);
        }
    }

    debug!(
        rows = table.height(),
        churn_column = %churn_column,
        tenure = tenure_bins.is_some(),
        "normalized dataset"
    );

    let keys = KeyIndex::build(&table);
    Ok(CanonicalTable {
        table,
        churn_column,
        keys,
        tenure_bins,
    })
}

/// Bucket labels read back from a file become ordered buckets again.
fn retype_bucket(value: &mut Value) {
    if let Value::Text(label) = value {
        if let Some(bucket) = TenureBucket::from_label(label) {
            *value = Value::Bucket(bucket);
        }
    }
}

/// Token rule for a single textual churn cell.
pub fn churn_token(value: &Value) -> bool {
    let token = value.to_string().trim().to_lowercase();
    TRUE_TOKENS.contains(&token.as_str())
}

fn derive_churn_flags(source: &Column) -> Vec<Value> {
    let numeric = source.is_numeric();
    source
        .values
        .iter()
        .map(|value| {
            let flag = if numeric {
                value.as_f64().is_some_and(|number| number != 0.0)
            } else {
                churn_token(value)
            };
            Value::Bool(flag)
        })
        .collect()
}

/// Trims every name; a name that collides with an earlier one gets a `.N` suffix.
fn trim_column_names(table: &mut Table) {
    let mut seen: Vec<String> = Vec::new();
    for column in table.columns_mut().iter_mut() {
        let trimmed = column.name.trim().to_string();
        let mut name = trimmed.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{trimmed}.{suffix}");
            suffix += 1;
        }
        if name != column.name {
            debug!(from = %column.name, to = %name, "renamed column");
        }
        seen.push(name.clone());
        column.name = name;
    }
}

fn replace_column(table: &mut Table, column: Column) -> AnalysisResult<()> {
    let key = canonical_key(&column.name);
    table
        .columns_mut()
        .retain(|existing| canonical_key(&existing.name) != key);
    table.push_column(column)
}
