use std::fmt::Write;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::aggregate::{aggregate, distribution, Selector};
use crate::config::Partition;
use crate::error::AnalysisError;
use crate::insights::{commentary, KEY_TAKEAWAY, RECOMMENDATIONS, SUMMARY_INSIGHTS};
use crate::models::{AggregationResult, Measure};
use crate::normalize::CanonicalTable;
use crate::predict::Verdict;
use crate::table::Table;

const BAR_WIDTH: usize = 30;

const FEATURE_DEFINITIONS: [(&str, &str); 10] = [
    ("State", "U.S. state of the customer"),
    ("Account_length", "Days the customer has been with the company"),
    ("Area_code", "Telephone area code"),
    ("International_plan", "Whether the customer has an international plan (Yes/No)"),
    ("Voice_mail_plan", "Whether the customer has a voicemail plan (Yes/No)"),
    ("Number_vmail_messages", "Number of voice mail messages"),
    ("Total_day/eve/night_charge", "Call charges at different times of day"),
    ("Total_intl_*", "International minutes, calls and charges"),
    ("Customer_service_calls", "Number of calls made to customer service"),
    ("Churn", "Target variable: 1 if the customer left, 0 otherwise"),
];

fn format_measure(measure: Measure, value: f64) -> String {
    match measure {
        Measure::Mean => format!("{:.1}%", value * 100.0),
        Measure::Sum => format!("{value:.0}"),
        Measure::Raw => format!("{value:.2}"),
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let width = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(width.max(1))
}

/// Markdown table (with a text bar per row) for grouped results, or the
/// five-number summary per churn value for pass-through results.
pub fn render_result(result: &AggregationResult) -> String {
    let mut output = String::new();

    if result.measure == Measure::Raw {
        let _ = writeln!(
            output,
            "| {} | count | min | q1 | median | q3 | max |",
            result.key_columns.join(" | ")
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|");
        for summary in distribution(result) {
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
                summary.key,
                summary.count,
                summary.min,
                summary.q1,
                summary.median,
                summary.q3,
                summary.max
            );
        }
        let _ = writeln!(
            output,
            "\n_{} rows of {} by {}._",
            result.len(),
            result.measure_column,
            result.key_columns.join(", ")
        );
        return output;
    }

    let max = result
        .rows
        .iter()
        .map(|row| row.value)
        .fold(0.0_f64, f64::max);
    let _ = writeln!(
        output,
        "| {} | {} | |",
        result.key_columns.join(" | "),
        result.measure_column
    );
    let _ = writeln!(
        output,
        "|{}---|---|",
        "---|".repeat(result.key_columns.len())
    );
    for row in &result.rows {
        let keys: Vec<String> = row.keys.iter().map(ToString::to_string).collect();
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            keys.join(" | "),
            format_measure(result.measure, row.value),
            bar(row.value, max)
        );
    }
    output
}

/// One analysis with its narrative, as printed by `analyze`.
pub fn render_analysis(selector: Selector, result: &AggregationResult) -> String {
    let text = commentary(selector);
    let mut output = String::new();
    let _ = writeln!(
        output,
        "## {}. {} ({})",
        selector.number(),
        selector.title(),
        selector.category().label()
    );
    let _ = writeln!(output, "{}", text.question);
    let _ = writeln!(output);
    let _ = write!(output, "{}", render_result(result));
    let _ = writeln!(output);
    let _ = writeln!(output, "**Insight:** {}", text.insight);
    let _ = writeln!(output, "**Recommendation:** {}", text.recommendation);
    output
}

/// Every analysis in menu order. Analyses whose columns are missing are
/// replaced by a warning line; the rest of the report is still produced.
pub fn build_report(
    canonical: &CanonicalTable,
    source_label: &str,
    generated_at: DateTime<Utc>,
    top_n: usize,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Telecom Churn Analysis & Insights");
    let _ = writeln!(
        output,
        "Generated {} from {} ({} customers, churn column '{}')",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        source_label,
        canonical.height(),
        canonical.churn_column()
    );
    if let Some(bins) = canonical.tenure_bins() {
        let _ = writeln!(
            output,
            "Tenure buckets: New <= {}, Mid <= {}, Long <= {}",
            bins.new_upper, bins.mid_upper, bins.top
        );
    }

    for selector in Selector::ALL {
        let _ = writeln!(output);
        match aggregate(canonical, selector, Some(top_n)) {
            Ok(result) => {
                let _ = write!(output, "{}", render_analysis(selector, &result));
            }
            Err(err @ AnalysisError::MissingColumn { .. }) => {
                warn!(analysis = %selector, error = %err, "skipping analysis");
                let _ = writeln!(
                    output,
                    "## {}. {}",
                    selector.number(),
                    selector.title()
                );
                let _ = writeln!(output, "> Warning: {err}");
            }
            Err(err) => {
                warn!(analysis = %selector, error = %err, "analysis failed");
                let _ = writeln!(output, "> Error in {}: {err}", selector.id());
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Final Summary & Recommendations");
    let _ = writeln!(output);
    let _ = writeln!(output, "### Overall Insights");
    for (area, insight) in SUMMARY_INSIGHTS.iter() {
        let _ = writeln!(output, "- **{area}:** {insight}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "### Strategic Recommendations");
    for (index, recommendation) in RECOMMENDATIONS.iter().enumerate() {
        let _ = writeln!(output, "{}. {}", index + 1, recommendation);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "**Key takeaway:** {KEY_TAKEAWAY}");

    output
}

fn render_table(output: &mut String, table: &Table) {
    let names = table.column_names();
    let _ = writeln!(output, "| {} |", names.join(" | "));
    let _ = writeln!(output, "|{}", "---|".repeat(names.len()));
    for row in 0..table.height() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|column| column.values[row].to_string())
            .collect();
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }
}

/// Shapes, previews and the feature glossary for the loaded partitions.
pub fn render_info(partitions: &[Partition], preview_rows: usize) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Data Information & Feature Overview");
    let _ = writeln!(output);

    let mut total = 0;
    for partition in partitions {
        total += partition.table.height();
        let _ = writeln!(
            output,
            "- {} shape: {} rows x {} cols",
            partition.label,
            partition.table.height(),
            partition.table.width()
        );
    }
    let _ = writeln!(output, "- Total merged rows: {total}");

    for partition in partitions {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {} preview", partition.label);
        render_table(&mut output, &partition.table.head(preview_rows));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Feature Definitions");
    let _ = writeln!(output, "| Feature | Description |");
    let _ = writeln!(output, "|---|---|");
    for (feature, description) in FEATURE_DEFINITIONS.iter() {
        let _ = writeln!(output, "| `{feature}` | {description} |");
    }
    output
}

pub fn render_verdict(verdict: &Verdict) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Total charge (auto calculated): {:.2}", verdict.total_charge);
    if verdict.high_service_calls {
        let _ = writeln!(output, "High number of service calls");
    } else {
        let _ = writeln!(output, "Normal number of service calls");
    }
    let verdict_label = if verdict.churn {
        "likely to CHURN"
    } else {
        "likely to STAY"
    };
    let _ = writeln!(
        output,
        "This customer is {} (churn probability {:.2}%)",
        verdict_label,
        verdict.probability * 100.0
    );
    output
}
