use std::collections::HashMap;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::debug;

use crate::error::ModelError;

/// More calls than this flag a customer as a high service-call risk.
pub const HIGH_SERVICE_CALLS_THRESHOLD: u32 = 3;

pub const FIELD_NAMES: [&str; 13] = [
    "Account_length",
    "International_plan",
    "Voice_mail_plan",
    "Number_vmail_messages",
    "Total_day_charge",
    "Total_eve_charge",
    "Total_night_charge",
    "Total_intl_minutes",
    "Total_intl_calls",
    "Total_intl_charge",
    "Customer_service_calls",
    "High_service_calls",
    "Total_charge",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Plan {
    No,
    Yes,
}

impl Plan {
    pub fn label(self) -> &'static str {
        match self {
            Plan::No => "No",
            Plan::Yes => "Yes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feature {
    Number(f64),
    Category(&'static str),
}

/// User-chosen values; the two derived fields are computed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInput {
    pub account_length: u32,
    pub international_plan: Plan,
    pub voice_mail_plan: Plan,
    pub number_vmail_messages: u32,
    pub total_day_charge: f64,
    pub total_eve_charge: f64,
    pub total_night_charge: f64,
    pub total_intl_minutes: f64,
    pub total_intl_calls: u32,
    pub total_intl_charge: f64,
    pub customer_service_calls: u32,
}

impl Default for PredictionInput {
    fn default() -> Self {
        PredictionInput {
            account_length: 120,
            international_plan: Plan::No,
            voice_mail_plan: Plan::No,
            number_vmail_messages: 10,
            total_day_charge: 30.56,
            total_eve_charge: 17.08,
            total_night_charge: 9.04,
            total_intl_minutes: 10.0,
            total_intl_calls: 4,
            total_intl_charge: 2.76,
            customer_service_calls: 1,
        }
    }
}

impl PredictionInput {
    /// Checks every numeric field against the range the input controls allow.
    pub fn validate(&self) -> Result<(), ModelError> {
        let checks: [(&'static str, f64, f64, f64); 9] = [
            ("Account_length", self.account_length as f64, 1.0, 243.0),
            ("Number_vmail_messages", self.number_vmail_messages as f64, 0.0, 51.0),
            ("Total_day_charge", self.total_day_charge, 0.0, 59.64),
            ("Total_eve_charge", self.total_eve_charge, 0.0, 30.91),
            ("Total_night_charge", self.total_night_charge, 1.04, 17.77),
            ("Total_intl_minutes", self.total_intl_minutes, 0.0, 20.0),
            ("Total_intl_calls", self.total_intl_calls as f64, 0.0, 20.0),
            ("Total_intl_charge", self.total_intl_charge, 0.0, 5.4),
            ("Customer_service_calls", self.customer_service_calls as f64, 0.0, 9.0),
        ];

        for (field, value, min, max) in checks {
            if !(min..=max).contains(&value) {
                return Err(ModelError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    pub fn total_charge(&self) -> f64 {
        self.total_day_charge + self.total_eve_charge + self.total_night_charge
    }

    pub fn high_service_calls(&self) -> bool {
        self.customer_service_calls > HIGH_SERVICE_CALLS_THRESHOLD
    }

    /// The row handed to the classifier, in [`FIELD_NAMES`] order.
    pub fn row(&self) -> Vec<(&'static str, Feature)> {
        let values = [
            Feature::Number(self.account_length as f64),
            Feature::Category(self.international_plan.label()),
            Feature::Category(self.voice_mail_plan.label()),
            Feature::Number(self.number_vmail_messages as f64),
            Feature::Number(self.total_day_charge),
            Feature::Number(self.total_eve_charge),
            Feature::Number(self.total_night_charge),
            Feature::Number(self.total_intl_minutes),
            Feature::Number(self.total_intl_calls as f64),
            Feature::Number(self.total_intl_charge),
            Feature::Number(self.customer_service_calls as f64),
            Feature::Number(if self.high_service_calls() { 1.0 } else { 0.0 }),
            Feature::Number(self.total_charge()),
        ];
        FIELD_NAMES.into_iter().zip(values).collect()
    }
}

pub trait Classifier {
    /// Probability of churn, in [0, 1].
    fn predict_score(&self, input: &PredictionInput) -> f64;

    fn threshold(&self) -> f64 {
        0.5
    }

    /// 1 for churn, 0 for stay.
    fn predict(&self, input: &PredictionInput) -> u8 {
        u8::from(self.predict_score(input) >= self.threshold())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Scaling {
    pub mean: f64,
    pub std: f64,
}

/// Logistic model exported from the training notebook.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub categories: HashMap<String, HashMap<String, f64>>,
    #[serde(default)]
    pub scaling: HashMap<String, Scaling>,
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticModel {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: LogisticModel = serde_json::from_str(json)?;
        model.check_features()?;
        Ok(model)
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let model = LogisticModel::from_json(&std::fs::read_to_string(path)?)?;
        debug!(
            path = %path.display(),
            weights = model.weights.len(),
            categories = model.categories.len(),
            "loaded classifier"
        );
        Ok(model)
    }

    fn check_features(&self) -> Result<(), ModelError> {
        self.weights
            .keys()
            .chain(self.categories.keys())
            .chain(self.scaling.keys())
            .find(|name| !FIELD_NAMES.contains(&name.as_str()))
            .map_or(Ok(()), |name| Err(ModelError::UnknownFeature(name.clone())))
    }

    fn logit(&self, input: &PredictionInput) -> f64 {
        input
            .row()
            .into_iter()
            .map(|(name, feature)| match feature {
                Feature::Number(value) => {
                    let weight = self.weights.get(name).copied().unwrap_or(0.0);
                    let scaled = match self.scaling.get(name) {
                        Some(scaling) if scaling.std > 0.0 => (value - scaling.mean) / scaling.std,
                        _ => value,
                    };
                    weight * scaled
                }
                Feature::Category(level) => self
                    .categories
                    .get(name)
                    .and_then(|levels| levels.get(level))
                    .copied()
                    .unwrap_or(0.0),
            })
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for LogisticModel {
    fn predict_score(&self, input: &PredictionInput) -> f64 {
        1.0 / (1.0 + (-self.logit(input)).exp())
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub churn: bool,
    pub probability: f64,
    pub high_service_calls: bool,
    pub total_charge: f64,
}

/// Validates the input, then asks the classifier for a verdict on the
/// 13-field row.
pub fn predict_churn(
    classifier: &dyn Classifier,
    input: &PredictionInput,
) -> Result<Verdict, ModelError> {
    input.validate()?;
    Ok(Verdict {
        churn: classifier.predict(input) == 1,
        probability: classifier.predict_score(input),
        high_service_calls: input.high_service_calls(),
        total_charge: input.total_charge(),
    })
}
