use std::io;
use std::path::Path;

use crate::aggregate::Selector;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::AggregationResult;

/// Serializes a result as CSV: one header row (group keys, then the measure)
/// and one line per result row.
pub fn write_result<W: io::Write>(result: &AggregationResult, writer: W) -> AnalysisResult<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = result.key_columns.iter().map(String::as_str).collect();
    header.push(&result.measure_column);
    writer.write_record(&header)?;

    for row in &result.rows {
        let mut record: Vec<String> = row.keys.iter().map(ToString::to_string).collect();
        record.push(row.value.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn to_csv_string(result: &AggregationResult) -> AnalysisResult<String> {
    let mut buffer = Vec::new();
    write_result(result, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|err| AnalysisError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

pub fn export_to_path(result: &AggregationResult, path: &Path) -> AnalysisResult<()> {
    let file = std::fs::File::create(path)?;
    write_result(result, io::BufWriter::new(file))
}

/// Download name for a result, e.g. `state_churn.csv`.
pub fn default_file_name(result: &AggregationResult) -> String {
    match result.analysis.parse::<Selector>() {
        Ok(selector) => selector.file_name().to_string(),
        Err(_) => format!("{}.csv", result.analysis.replace('-', "_")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::Value;
    use crate::normalize::normalize;
    use crate::table::Table;

    const DATA: &str = "\
State,International plan,Customer service calls,Churn
NY,No,1,Yes
NY,Yes,4,No
CA,Yes,4,Yes
\"Washington, DC\",No,0,No
";

    fn canonical() -> crate::normalize::CanonicalTable {
        normalize(Table::from_reader(DATA.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn exported_result_reads_back_as_table() {
        let result = aggregate(&canonical(), Selector::ServiceCallsByIntl, None).unwrap();
        let text = to_csv_string(&result).unwrap();
        let parsed = Table::from_reader(text.as_bytes()).unwrap();

        assert_eq!(
            parsed.column_names(),
            vec!["International plan", "Customer service calls", "churn_rate"]
        );
        assert_eq!(parsed.height(), result.len());
        let rates = &parsed.column("churn_rate").unwrap().values;
        for (row, parsed_rate) in result.rows.iter().zip(rates) {
            let parsed_rate = parsed_rate.as_f64().unwrap();
            assert!((row.value - parsed_rate).abs() < 1e-12);
        }
        let calls = &parsed.column("Customer service calls").unwrap().values;
        let expected: Vec<Value> = result.rows.iter().map(|row| row.keys[1].clone()).collect();
        assert_eq!(calls, &expected);
    }

    #[test]
    fn keys_with_commas_are_quoted() {
        let result = aggregate(&canonical(), Selector::StateChurn, None).unwrap();
        let text = to_csv_string(&result).unwrap();
        assert!(text.starts_with("State,churn_count\n"));
        assert!(text.contains("\"Washington, DC\",0\n"));
        let parsed = Table::from_reader(text.as_bytes()).unwrap();
        assert_eq!(
            parsed.column("State").unwrap().values[2],
            Value::Text("Washington, DC".to_string())
        );
    }

    #[test]
    fn writes_file_with_default_name() {
        let result = aggregate(&canonical(), Selector::IntlPlanChurn, None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(default_file_name(&result));
        export_to_path(&result, &path).unwrap();
        assert!(path.ends_with("intl_plan_churn.csv"));
        let parsed = Table::from_path(&path).unwrap();
        assert_eq!(parsed.height(), 2);
    }

    #[test]
    fn file_names_follow_download_names() {
        let table = canonical();
        let split = aggregate(&table, Selector::ServiceCallsByIntl, None).unwrap();
        assert_eq!(
            default_file_name(&split),
            "intl_plan_service_calls_churn.csv"
        );
        assert_eq!(
            Selector::VoicemailPlanChurn.file_name(),
            "voice_mail_plan_churn.csv"
        );
        assert_eq!(
            Selector::IntlChargeVsChurn.file_name(),
            "intl_users_charges.csv"
        );

        let mut renamed = split;
        renamed.analysis = "custom-view".to_string();
        assert_eq!(default_file_name(&renamed), "custom_view.csv");
    }
}
