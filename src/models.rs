use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Tokens the CSV reader treats as a missing cell.
const NULL_TOKENS: [&str; 8] = ["", "na", "n/a", "nan", "null", "none", "<na>", "#n/a"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Ordered tenure category; sorts New < Mid < Long.
    Bucket(TenureBucket),
}

impl Value {
    /// Types one raw CSV cell: missing markers become `Null`, anything that
    /// parses as a finite-or-infinite float becomes `Number`, the rest stays text.
    pub fn parse(raw: &str) -> Value {
        let trimmed = raw.trim();
        if NULL_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str()) {
            return Value::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_nan() => Value::Null,
            Ok(number) => Value::Number(number),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(number) => number.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) if !number.is_nan() => Some(*number),
            Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Ordering used for key sorts: nulls first, then numbers, booleans,
    /// buckets and text.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Number(number) if number.is_nan() => 0,
                Value::Number(_) => 1,
                Value::Bool(_) => 2,
                Value::Bucket(_) => 3,
                Value::Text(_) => 4,
            }
        }

        match (self, other) {
            (Value::Number(a), Value::Number(b)) if !a.is_nan() && !b.is_nan() => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Bucket(a), Value::Bucket(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }

    /// Lexicographic [`Value::sort_cmp`] over a key tuple.
    pub fn cmp_keys(left: &[Value], right: &[Value]) -> Ordering {
        left.iter()
            .zip(right)
            .map(|(a, b)| a.sort_cmp(b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| left.len().cmp(&right.len()))
    }

    /// Grouping identity. Text keys compare verbatim; `Number(1.0)` and `Text("1")` stay distinct.
    pub fn group_key(&self) -> String {
        match self {
            Value::Null => "\u{0}null".to_string(),
            Value::Number(number) if number.is_nan() => "\u{0}null".to_string(),
            Value::Number(number) => format!("n:{number}"),
            Value::Text(text) => format!("t:{text}"),
            Value::Bool(flag) => format!("b:{flag}"),
            Value::Bucket(bucket) => format!("k:{}", bucket.label()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(number) if number.is_nan() => Ok(()),
            Value::Number(number) => write!(f, "{number}"),
            Value::Text(text) => f.write_str(text),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Bucket(bucket) => f.write_str(bucket.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TenureBucket {
    New,
    Mid,
    Long,
}

impl TenureBucket {
    pub fn label(self) -> &'static str {
        match self {
            TenureBucket::New => "New",
            TenureBucket::Mid => "Mid",
            TenureBucket::Long => "Long",
        }
    }

    pub fn from_label(label: &str) -> Option<TenureBucket> {
        match label.trim().to_ascii_lowercase().as_str() {
            "new" => Some(TenureBucket::New),
            "mid" => Some(TenureBucket::Mid),
            "long" => Some(TenureBucket::Long),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Count of churners per group.
    Sum,
    /// Churn rate per group, in [0, 1].
    Mean,
    /// Ungrouped rows feeding a box plot.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub keys: Vec<Value>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub analysis: String,
    pub key_columns: Vec<String>,
    pub measure_column: String,
    pub measure: Measure,
    pub rows: Vec<ResultRow>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Five-number summary of one churn group for a box plot.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSummary {
    pub key: Value,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}
