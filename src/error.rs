use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The dataset lacks an identifying column; nothing can be computed from it.
    #[error("schema error: {message}")]
    Schema { message: String },
    /// One analysis cannot run; the others remain available.
    #[error("analysis '{analysis}' needs missing column(s): {}", .columns.join(", "))]
    MissingColumn {
        analysis: String,
        columns: Vec<String>,
    },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn schema(message: impl Into<String>) -> Self {
        AnalysisError::Schema {
            message: message.into(),
        }
    }

    pub fn missing_columns(analysis: impl Into<String>, columns: Vec<String>) -> Self {
        AnalysisError::MissingColumn {
            analysis: analysis.into(),
            columns,
        }
    }

    pub fn is_missing_column(&self) -> bool {
        matches!(self, AnalysisError::MissingColumn { .. })
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("classifier artifact references unknown feature '{0}'")]
    UnknownFeature(String),
    #[error("failed to read classifier artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse classifier artifact: {0}")]
    Json(#[from] serde_json::Error),
}
