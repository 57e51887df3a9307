use std::path::PathBuf;

use chrono::Duration;
use clap::Args;
use tracing::info;

use crate::cache::DEFAULT_TTL_SECS;
use crate::error::AnalysisResult;
use crate::normalize::{normalize, CanonicalTable};
use crate::table::Table;

/// Dataset and model locations shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Training partition of the default dataset
    #[arg(long, env = "CHURN_TRAIN_CSV", default_value = "data/churn-bigml-80.csv", global = true)]
    pub train: PathBuf,
    /// Test partition of the default dataset
    #[arg(long, env = "CHURN_TEST_CSV", default_value = "data/churn-bigml-20.csv", global = true)]
    pub test: PathBuf,
    /// CSV that replaces the default dataset
    #[arg(long, global = true)]
    pub input: Option<PathBuf>,
    /// Trained classifier artifact (JSON)
    #[arg(long, env = "CHURN_MODEL_PATH", default_value = "model/churn_model.json", global = true)]
    pub model: PathBuf,
    /// Seconds before the cached dataset is re-read
    #[arg(long, env = "CHURN_CACHE_TTL_SECS", default_value_t = DEFAULT_TTL_SECS, global = true)]
    pub cache_ttl_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// Two partitions stacked into one table.
    Partitions { train: PathBuf, test: PathBuf },
    /// A single user-supplied file.
    Upload(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: DatasetSource,
    pub model_path: PathBuf,
    pub cache_ttl: Duration,
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        let source = match args.input {
            Some(path) => DatasetSource::Upload(path),
            None => DatasetSource::Partitions {
                train: args.train,
                test: args.test,
            },
        };
        Config {
            source,
            model_path: args.model,
            cache_ttl: Duration::seconds(args.cache_ttl_secs.max(0)),
        }
    }
}

/// A loaded partition with the label it is reported under.
#[derive(Debug, Clone)]
pub struct Partition {
    pub label: &'static str,
    pub table: Table,
}

impl DatasetSource {
    pub fn load_partitions(&self) -> AnalysisResult<Vec<Partition>> {
        match self {
            DatasetSource::Partitions { train, test } => Ok(vec![
                Partition {
                    label: "Train",
                    table: Table::from_path(train)?,
                },
                Partition {
                    label: "Test",
                    table: Table::from_path(test)?,
                },
            ]),
            DatasetSource::Upload(path) => Ok(vec![Partition {
                label: "Uploaded",
                table: Table::from_path(path)?,
            }]),
        }
    }

    /// Reads every partition and stacks them; provenance is not kept.
    pub fn load(&self) -> AnalysisResult<Table> {
        let tables: Vec<Table> = self
            .load_partitions()?
            .into_iter()
            .map(|partition| partition.table)
            .collect();
        let merged = Table::concat(&tables)?;
        info!(rows = merged.height(), cols = merged.width(), "dataset loaded");
        Ok(merged)
    }

    pub fn load_canonical(&self) -> AnalysisResult<CanonicalTable> {
        normalize(self.load()?)
    }
}
