use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{AggregationResult, DistributionSummary, Measure, ResultRow, Value};
use crate::normalize::{CanonicalTable, ACCOUNT_LENGTH_KEY, CHURN_FLAG_COLUMN};
use crate::table::{canonical_key, Column};

pub const DEFAULT_TOP_N: usize = 20;
pub const MIN_TOP_N: usize = 5;
pub const MAX_TOP_N: usize = 50;

/// A column named by its canonical key, with the label used in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub key: &'static str,
    pub label: &'static str,
}

const STATE: ColumnRef = ColumnRef {
    key: "state",
    label: "State",
};
const ACCOUNT_LENGTH: ColumnRef = ColumnRef {
    key: ACCOUNT_LENGTH_KEY,
    label: "Account_length",
};
const INTERNATIONAL_PLAN: ColumnRef = ColumnRef {
    key: "international_plan",
    label: "International_plan",
};
const VOICE_MAIL_PLAN: ColumnRef = ColumnRef {
    key: "voice_mail_plan",
    label: "Voice_mail_plan",
};
const SERVICE_CALLS: ColumnRef = ColumnRef {
    key: "customer_service_calls",
    label: "Customer_service_calls",
};
const INTL_CHARGE: ColumnRef = ColumnRef {
    key: "total_intl_charge",
    label: "Total_intl_charge",
};
const TENURE_BUCKET: ColumnRef = ColumnRef {
    key: "tenure_bucket",
    label: "Tenure_Bucket",
};

/// Keeps rows whose column equals `equals`, ignoring case and surrounding spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFilter {
    pub column: ColumnRef,
    pub equals: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOp {
    None,
    /// Stable sort by measure, largest first; truncated to the requested top N.
    TopByMeasure,
    /// Stable ascending sort on the group key at this position.
    SortByKey(usize),
}

/// Declarative description of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingSpec {
    pub group_keys: &'static [ColumnRef],
    pub measure: Measure,
    /// Column plotted against the raw churn value by pass-through analyses.
    pub raw_source: Option<ColumnRef>,
    pub filter: Option<RowFilter>,
    pub post: PostOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    CustomerProfile,
    ServicePlans,
    CustomerService,
    UsageAndCharges,
    Multivariate,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::CustomerProfile => "Customer Profile",
            Category::ServicePlans => "Service Plans",
            Category::CustomerService => "Customer Service",
            Category::UsageAndCharges => "Usage & Charges",
            Category::Multivariate => "Multivariate Analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    StateChurn,
    AccountLengthVsChurn,
    IntlPlanChurn,
    VoicemailPlanChurn,
    ServiceCallsChurn,
    ServiceCallsByIntl,
    IntlChargeVsChurn,
    TenureBucketByIntl,
    TenureBucketByVoicemail,
}

impl Selector {
    pub const ALL: [Selector; 9] = [
        Selector::StateChurn,
        Selector::AccountLengthVsChurn,
        Selector::IntlPlanChurn,
        Selector::VoicemailPlanChurn,
        Selector::ServiceCallsChurn,
        Selector::ServiceCallsByIntl,
        Selector::IntlChargeVsChurn,
        Selector::TenureBucketByIntl,
        Selector::TenureBucketByVoicemail,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Selector::StateChurn => "state-churn",
            Selector::AccountLengthVsChurn => "account-length-vs-churn",
            Selector::IntlPlanChurn => "intl-plan-churn",
            Selector::VoicemailPlanChurn => "voicemail-plan-churn",
            Selector::ServiceCallsChurn => "service-calls-churn",
            Selector::ServiceCallsByIntl => "service-calls-by-intl",
            Selector::IntlChargeVsChurn => "intl-charge-vs-churn",
            Selector::TenureBucketByIntl => "tenure-bucket-by-intl",
            Selector::TenureBucketByVoicemail => "tenure-bucket-by-voicemail",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Selector::StateChurn => "Churn Rate by State",
            Selector::AccountLengthVsChurn => "Account Length vs Churn",
            Selector::IntlPlanChurn => "Churn by International Plan",
            Selector::VoicemailPlanChurn => "Churn by Voice Mail Plan",
            Selector::ServiceCallsChurn => "Churn vs Number of Customer Service Calls",
            Selector::ServiceCallsByIntl => "Churn by Service Calls Split by Intl Plan",
            Selector::IntlChargeVsChurn => "Churn vs Total Intl Charges (Intl Users Only)",
            Selector::TenureBucketByIntl => "Churn by Tenure Bucket & International Plan",
            Selector::TenureBucketByVoicemail => "Churn by Tenure Bucket & Voice Mail Plan",
        }
    }

    /// Name used when the result is saved as CSV.
    pub fn file_name(self) -> &'static str {
        match self {
            Selector::StateChurn => "state_churn.csv",
            Selector::AccountLengthVsChurn => "account_length_churn.csv",
            Selector::IntlPlanChurn => "intl_plan_churn.csv",
            Selector::VoicemailPlanChurn => "voice_mail_plan_churn.csv",
            Selector::ServiceCallsChurn => "service_calls_churn.csv",
            Selector::ServiceCallsByIntl => "intl_plan_service_calls_churn.csv",
            Selector::IntlChargeVsChurn => "intl_users_charges.csv",
            Selector::TenureBucketByIntl => "tenure_bucket_intl_plan.csv",
            Selector::TenureBucketByVoicemail => "tenure_bucket_voicemail.csv",
        }
    }

    /// 1-based position in the analysis menu.
    pub fn number(self) -> usize {
        Selector::ALL
            .iter()
            .position(|selector| *selector == self)
            .map_or(0, |index| index + 1)
    }

    pub fn category(self) -> Category {
        match self {
            Selector::StateChurn | Selector::AccountLengthVsChurn => Category::CustomerProfile,
            Selector::IntlPlanChurn | Selector::VoicemailPlanChurn => Category::ServicePlans,
            Selector::ServiceCallsChurn | Selector::ServiceCallsByIntl => {
                Category::CustomerService
            }
            Selector::IntlChargeVsChurn => Category::UsageAndCharges,
            Selector::TenureBucketByIntl | Selector::TenureBucketByVoicemail => {
                Category::Multivariate
            }
        }
    }

    pub fn spec(self) -> GroupingSpec {
        match self {
            Selector::StateChurn => GroupingSpec {
                group_keys: &[STATE],
                measure: Measure::Sum,
                raw_source: None,
                filter: None,
                post: PostOp::TopByMeasure,
            },
            Selector::AccountLengthVsChurn => GroupingSpec {
                group_keys: &[],
                measure: Measure::Raw,
                raw_source: Some(ACCOUNT_LENGTH),
                filter: None,
                post: PostOp::None,
            },
            Selector::IntlPlanChurn => GroupingSpec {
                group_keys: &[INTERNATIONAL_PLAN],
                measure: Measure::Mean,
                raw_source: None,
                filter: None,
                post: PostOp::None,
            },
            Selector::VoicemailPlanChurn => GroupingSpec {
                group_keys: &[VOICE_MAIL_PLAN],
                measure: Measure::Mean,
                raw_source: None,
                filter: None,
                post: PostOp::None,
            },
            Selector::ServiceCallsChurn => GroupingSpec {
                group_keys: &[SERVICE_CALLS],
                measure: Measure::Mean,
                raw_source: None,
                filter: None,
                post: PostOp::SortByKey(0),
            },
            Selector::ServiceCallsByIntl => GroupingSpec {
                group_keys: &[INTERNATIONAL_PLAN, SERVICE_CALLS],
                measure: Measure::Mean,
                raw_source: None,
                filter: None,
                post: PostOp::SortByKey(1),
            },
            Selector::IntlChargeVsChurn => GroupingSpec {
                group_keys: &[],
                measure: Measure::Raw,
                raw_source: Some(INTL_CHARGE),
                filter: Some(RowFilter {
                    column: INTERNATIONAL_PLAN,
                    equals: "yes",
                }),
                post: PostOp::None,
            },
            Selector::TenureBucketByIntl => GroupingSpec {
                group_keys: &[TENURE_BUCKET, INTERNATIONAL_PLAN],
                measure: Measure::Mean,
                raw_source: None,
                filter: None,
                post: PostOp::None,
            },
            Selector::TenureBucketByVoicemail => GroupingSpec {
                group_keys: &[TENURE_BUCKET, VOICE_MAIL_PLAN],
                measure: Measure::Mean,
                raw_source: None,
                filter: None,
                post: PostOp::None,
            },
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Selector {
    type Err = String;

    /// Accepts the id, the menu number or the title, ignoring case.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim().to_lowercase();
        Selector::ALL
            .iter()
            .copied()
            .find(|selector| {
                selector.id() == wanted
                    || selector.number().to_string() == wanted
                    || selector.title().to_lowercase() == wanted
            })
            .ok_or_else(|| {
                let known: Vec<&str> = Selector::ALL.iter().map(|selector| selector.id()).collect();
                format!("unknown analysis '{input}', expected one of: {}", known.join(", "))
            })
    }
}

/// Runs one analysis over a canonical table.
///
/// `top_n` only applies to analyses that rank groups; it defaults to
/// [`DEFAULT_TOP_N`]. Every required column is checked before any grouping.
pub fn aggregate(
    canonical: &CanonicalTable,
    selector: Selector,
    top_n: Option<usize>,
) -> AnalysisResult<AggregationResult> {
    let spec = selector.spec();
    check_required(canonical, selector, &spec)?;

    let flags = canonical.churn_flags();
    let selected = selected_rows(canonical, &spec);

    let mut result = match spec.raw_source {
        Some(source) if spec.measure == Measure::Raw => {
            pass_through(canonical, selector, source, &selected)
        }
        _ => group(canonical, selector, &spec, &flags, &selected),
    };

    match spec.post {
        PostOp::None => {}
        PostOp::TopByMeasure => {
            result
                .rows
                .sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
            result.rows.truncate(top_n.unwrap_or(DEFAULT_TOP_N));
        }
        PostOp::SortByKey(position) => {
            result.rows.sort_by(|a, b| match (a.keys.get(position), b.keys.get(position)) {
                (Some(left), Some(right)) => left.sort_cmp(right),
                _ => std::cmp::Ordering::Equal,
            });
        }
    }

    debug!(analysis = %selector, rows = result.rows.len(), "aggregated");
    Ok(result)
}

fn required_columns(spec: &GroupingSpec) -> Vec<ColumnRef> {
    let mut required: Vec<ColumnRef> = spec.group_keys.to_vec();
    required.extend(spec.raw_source);
    if let Some(filter) = spec.filter {
        if !required.contains(&filter.column) {
            required.push(filter.column);
        }
    }
    required
}

fn check_required(
    canonical: &CanonicalTable,
    selector: Selector,
    spec: &GroupingSpec,
) -> AnalysisResult<()> {
    let mut missing: Vec<String> = required_columns(spec)
        .into_iter()
        .filter(|column| canonical.column_by_key(column.key).is_none())
        .map(|column| column.label.to_string())
        .collect();
    if canonical
        .column_by_key(&canonical_key(CHURN_FLAG_COLUMN))
        .is_none()
    {
        missing.push(CHURN_FLAG_COLUMN.to_string());
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::missing_columns(selector.id(), missing))
    }
}

fn lookup<'a>(canonical: &'a CanonicalTable, column: ColumnRef) -> Option<&'a Column> {
    canonical.column_by_key(column.key)
}

fn selected_rows(canonical: &CanonicalTable, spec: &GroupingSpec) -> Vec<usize> {
    let height = canonical.height();
    match spec.filter.and_then(|filter| lookup(canonical, filter.column).map(|c| (filter, c))) {
        Some((filter, column)) => (0..height)
            .filter(|row| {
                column.values[*row]
                    .to_string()
                    .trim()
                    .eq_ignore_ascii_case(filter.equals)
            })
            .collect(),
        None => (0..height).collect(),
    }
}

fn pass_through(
    canonical: &CanonicalTable,
    selector: Selector,
    source: ColumnRef,
    selected: &[usize],
) -> AggregationResult {
    let churn = canonical.table().column(canonical.churn_column());
    let measured = lookup(canonical, source);
    let rows = match (churn, measured) {
        (Some(churn), Some(measured)) => selected
            .iter()
            .filter_map(|row| {
                measured.values[*row].as_f64().map(|value| ResultRow {
                    keys: vec![churn.values[*row].clone()],
                    value,
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    AggregationResult {
        analysis: selector.id().to_string(),
        key_columns: vec![canonical.churn_column().to_string()],
        measure_column: measured.map_or_else(|| source.label.to_string(), |c| c.name.clone()),
        measure: Measure::Raw,
        rows,
    }
}

fn group(
    canonical: &CanonicalTable,
    selector: Selector,
    spec: &GroupingSpec,
    flags: &[bool],
    selected: &[usize],
) -> AggregationResult {
    let key_columns: Vec<&Column> = spec
        .group_keys
        .iter()
        .filter_map(|column| lookup(canonical, *column))
        .collect();

    let mut positions: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, usize, usize)> = Vec::new();
    for &row in selected {
        let keys: Vec<Value> = key_columns
            .iter()
            .map(|column| column.values[row].clone())
            .collect();
        let identity: Vec<String> = keys.iter().map(Value::group_key).collect();
        let index = *positions.entry(identity).or_insert_with(|| {
            groups.push((keys, 0, 0));
            groups.len() - 1
        });
        let entry = &mut groups[index];
        entry.2 += 1;
        if flags.get(row).copied().unwrap_or(false) {
            entry.1 += 1;
        }
    }

    // Groups come out ordered by key; later sorts are stable on top of it.
    groups.sort_by(|a, b| Value::cmp_keys(&a.0, &b.0));
    let rows = groups
        .into_iter()
        .filter(|(_, _, count)| *count > 0)
        .map(|(keys, churned, count)| ResultRow {
            keys,
            value: match spec.measure {
                Measure::Mean => churned as f64 / count as f64,
                Measure::Sum | Measure::Raw => churned as f64,
            },
        })
        .collect();

    AggregationResult {
        analysis: selector.id().to_string(),
        key_columns: key_columns.iter().map(|column| column.name.clone()).collect(),
        measure_column: measure_column(spec.measure).to_string(),
        measure: spec.measure,
        rows,
    }
}

pub fn measure_column(measure: Measure) -> &'static str {
    match measure {
        Measure::Sum => "churn_count",
        Measure::Mean => "churn_rate",
        Measure::Raw => "value",
    }
}

/// Box-plot numbers per raw churn value, in first-encounter order.
pub fn distribution(result: &AggregationResult) -> Vec<DistributionSummary> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<f64>)> = Vec::new();
    for row in &result.rows {
        let key = row.keys.first().cloned().unwrap_or(Value::Null);
        let index = *positions.entry(key.group_key()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[index].1.push(row.value);
    }

    groups
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(key, mut values)| {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            DistributionSummary {
                key,
                count: values.len(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            }
        })
        .collect()
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TenureBucket;
    use crate::normalize::normalize;
    use crate::table::Table;

    fn canonical(csv: &str) -> CanonicalTable {
        normalize(Table::from_reader(csv.as_bytes()).unwrap()).unwrap()
    }

    fn text(value: &str) -> Value {
        Value::Text(value.to_string())
    }

    const TELECOM: &str = "\
State,Account length,International plan,Voice mail plan,Customer service calls,Total intl charge,Churn
KS,128,No,Yes,1,2.7,False
OH,107,No,Yes,4,3.7,True
NJ,137,Yes,No,0,3.29,False
OH,84,Yes,No,2,1.78,True
OK,75,Yes,No,3,2.73,True
AL,118,yes,No,0,1.7,False
MA,121,No,Yes,3,2.03,False
MO,147,Yes,No,0,1.92,False
WV,20,No,No,5,2.35,True
WV,180,No,Yes,1,2.5,False
";

    #[test]
    fn scenario_state_sums_and_missing_intl_plan() {
        let table = canonical("State,Churn,Account_length\nNY,Yes,10\nNY,No,60\nCA,Yes,200\n");
        let result = aggregate(&table, Selector::StateChurn, Some(20)).unwrap();
        assert_eq!(result.key_columns, vec!["State"]);
        assert_eq!(
            result.rows,
            vec![
                ResultRow {
                    keys: vec![text("CA")],
                    value: 1.0
                },
                ResultRow {
                    keys: vec![text("NY")],
                    value: 1.0
                },
            ]
        );

        let err = aggregate(&table, Selector::TenureBucketByIntl, None).unwrap_err();
        match err {
            AnalysisError::MissingColumn { analysis, columns } => {
                assert_eq!(analysis, "tenure-bucket-by-intl");
                assert_eq!(columns, vec!["International_plan".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_bucket_is_named() {
        let table = canonical("Churn,International_plan\nYes,No\n");
        let err = aggregate(&table, Selector::TenureBucketByIntl, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "analysis 'tenure-bucket-by-intl' needs missing column(s): Tenure_Bucket"
        );
    }

    #[test]
    fn state_top_n_is_sorted_and_stable() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::StateChurn, Some(5)).unwrap();
        assert!(result.len() <= 5);
        let states: Vec<String> = result.rows.iter().map(|row| row.keys[0].to_string()).collect();
        let values: Vec<f64> = result.rows.iter().map(|row| row.value).collect();
        assert_eq!(states, vec!["OH", "OK", "WV", "AL", "KS"]);
        assert_eq!(values, vec![2.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn tied_states_are_cut_alphabetically() {
        let table = canonical("State,Churn\nWV,Yes\nTX,Yes\nNY,Yes\nMN,Yes\nCA,Yes\nAL,Yes\n");
        let result = aggregate(&table, Selector::StateChurn, Some(5)).unwrap();
        let states: Vec<String> = result.rows.iter().map(|row| row.keys[0].to_string()).collect();
        assert_eq!(states, vec!["AL", "CA", "MN", "NY", "TX"]);
    }

    #[test]
    fn sums_bounded_by_record_count() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::StateChurn, Some(MAX_TOP_N)).unwrap();
        for row in &result.rows {
            assert!(row.value >= 0.0 && row.value <= table.height() as f64);
            assert_eq!(row.value.fract(), 0.0);
        }
        let total: f64 = result.rows.iter().map(|row| row.value).sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn means_are_rates() {
        let table = canonical(TELECOM);
        for selector in Selector::ALL {
            if selector.spec().measure != Measure::Mean {
                continue;
            }
            let result = aggregate(&table, selector, None).unwrap();
            assert!(!result.is_empty(), "{selector} produced no rows");
            for row in &result.rows {
                assert!((0.0..=1.0).contains(&row.value), "{selector}: {}", row.value);
            }
        }
    }

    #[test]
    fn intl_plan_keeps_observed_keys() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::IntlPlanChurn, None).unwrap();
        let keys: Vec<String> = result.rows.iter().map(|row| row.keys[0].to_string()).collect();
        assert_eq!(keys, vec!["No", "Yes", "yes"]);
        assert!((result.rows[0].value - 0.4).abs() < 1e-9);
        assert!((result.rows[1].value - 0.5).abs() < 1e-9);
        assert_eq!(result.measure_column, "churn_rate");
    }

    #[test]
    fn service_calls_sorted_by_key() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::ServiceCallsChurn, None).unwrap();
        let keys: Vec<Value> = result.rows.iter().map(|row| row.keys[0].clone()).collect();
        assert_eq!(
            keys,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
                .into_iter()
                .map(Value::Number)
                .collect::<Vec<_>>()
        );
        assert_eq!(result.rows[4].value, 1.0);
    }

    #[test]
    fn split_by_intl_sorts_on_second_key() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::ServiceCallsByIntl, None).unwrap();
        assert_eq!(
            result.key_columns,
            vec!["International plan", "Customer service calls"]
        );
        let calls: Vec<f64> = result
            .rows
            .iter()
            .filter_map(|row| row.keys[1].as_f64())
            .collect();
        let mut sorted = calls.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(calls, sorted);
        // Ties on call count keep plan order.
        assert_eq!(result.rows[0].keys, vec![text("Yes"), Value::Number(0.0)]);
    }

    #[test]
    fn intl_charge_filters_intl_users() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::IntlChargeVsChurn, None).unwrap();
        assert_eq!(result.measure, Measure::Raw);
        assert_eq!(result.key_columns, vec!["Churn"]);
        assert_eq!(result.measure_column, "Total intl charge");
        let charges: Vec<f64> = result.rows.iter().map(|row| row.value).collect();
        assert_eq!(charges, vec![3.29, 1.78, 2.73, 1.7, 1.92]);
    }

    #[test]
    fn account_length_passes_every_row() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::AccountLengthVsChurn, None).unwrap();
        assert_eq!(result.len(), table.height());
        assert_eq!(result.rows[0].keys, vec![text("False")]);
    }

    #[test]
    fn tenure_buckets_split_by_plan() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::TenureBucketByVoicemail, None).unwrap();
        assert_eq!(result.key_columns, vec!["Tenure_Bucket", "Voice mail plan"]);
        let keys: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|row| row.keys.iter().map(ToString::to_string).collect())
            .collect();
        assert_eq!(
            keys,
            vec![
                vec!["New", "No"],
                vec!["Mid", "No"],
                vec!["Mid", "Yes"],
                vec!["Long", "Yes"]
            ]
        );
        let new_no = result
            .rows
            .iter()
            .find(|row| row.keys == vec![Value::Bucket(TenureBucket::New), text("No")])
            .unwrap();
        assert_eq!(new_no.value, 1.0);
    }

    #[test]
    fn tenure_buckets_follow_tenure_order() {
        let table = canonical("Churn,Account_length,International_plan\nNo,120,No\nYes,10,No\nNo,200,No\n");
        let result = aggregate(&table, Selector::TenureBucketByIntl, None).unwrap();
        let buckets: Vec<String> = result.rows.iter().map(|row| row.keys[0].to_string()).collect();
        assert_eq!(buckets, vec!["New", "Mid", "Long"]);
    }

    #[test]
    fn distribution_summarises_each_churn_value() {
        let table = canonical(TELECOM);
        let result = aggregate(&table, Selector::IntlChargeVsChurn, None).unwrap();
        let summaries = distribution(&result);
        assert_eq!(summaries.len(), 2);
        let stayed = &summaries[0];
        assert_eq!(stayed.key, text("False"));
        assert_eq!(stayed.count, 3);
        assert_eq!(stayed.min, 1.7);
        assert_eq!(stayed.median, 1.92);
        assert_eq!(stayed.max, 3.29);
    }

    #[test]
    fn quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.5), 2.5);
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 1.0), 4.0);
    }

    #[test]
    fn selector_parses_id_number_and_title() {
        assert_eq!("state-churn".parse::<Selector>(), Ok(Selector::StateChurn));
        assert_eq!("8".parse::<Selector>(), Ok(Selector::TenureBucketByIntl));
        assert_eq!(
            "churn by voice mail plan".parse::<Selector>(),
            Ok(Selector::VoicemailPlanChurn)
        );
        assert!("bogus".parse::<Selector>().is_err());
    }
}
