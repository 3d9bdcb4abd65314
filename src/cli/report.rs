use std::fmt::Write as _;

use crate::comparison::{ComparisonSummary, Side};
use crate::format;
use crate::panel::PredictionPanel;

const LABEL_WIDTH: usize = 20;

/// Plain-text report of one panel: inputs, result or error, and analysis.
pub fn render_panel(panel: &PredictionPanel, side: Option<Side>) -> String {
    let state = panel.state();
    let mut out = String::new();
    let heading = match side {
        Some(side) => format!("Degree {side} Analysis"),
        None => "Investment Analysis".to_string(),
    };
    let _ = writeln!(out, "{heading}: {}", state.input.institution_name);
    let _ = writeln!(
        out,
        "  {} in {} ({}, {})",
        state.input.degree_type,
        state.input.major_field,
        state.input.control_type,
        state.input.state
    );

    if let Some(error) = &state.prediction_error {
        let _ = writeln!(out, "  {error}");
        return out;
    }
    let Some(prediction) = &state.prediction else {
        return out;
    };

    section(&mut out, "Education Costs");
    row(&mut out, "Annual Cost", format::currency(prediction.annual_cost));
    row(&mut out, "Total Investment", format::currency(prediction.total_loan_amount));

    section(&mut out, "Student Loan Details");
    row(&mut out, "Monthly Payment", format::currency(prediction.monthly_payment));
    row(&mut out, "Total Interest", format::currency(prediction.total_interest_paid));

    section(&mut out, "Return on Investment");
    row(&mut out, "10-Year ROI", format::roi_percentage(prediction.roi_percentage));
    row(&mut out, "Break-even Point", format::years(prediction.years_to_break_even));

    section(&mut out, "Income Projection");
    row(&mut out, "Per Year", format::currency(prediction.predicted_income));
    row(
        &mut out,
        "Expected Range",
        format!(
            "{} - {}",
            format::currency(prediction.range_low),
            format::currency(prediction.range_high)
        ),
    );

    if let Some(analysis) = &state.analysis {
        section(&mut out, "AI Insights");
        for line in analysis.lines() {
            let _ = writeln!(out, "    {line}");
        }
    } else if let Some(error) = &state.analysis_error {
        section(&mut out, "AI Insights");
        let _ = writeln!(out, "    {error}");
    }
    out
}

/// Plain-text comparison summary.
pub fn render_comparison(summary: &ComparisonSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Comparison Summary");
    row(
        &mut out,
        "Better ROI",
        format!(
            "Degree {}  ({:.1}% difference)",
            summary.roi.winner, summary.roi.magnitude
        ),
    );
    row(
        &mut out,
        "Higher Income",
        format!(
            "Degree {}  ({} difference)",
            summary.income.winner,
            format::currency(summary.income.magnitude)
        ),
    );
    row(
        &mut out,
        "Lower Cost",
        format!(
            "Degree {}  ({} difference)",
            summary.cost.winner,
            format::currency(summary.cost.magnitude)
        ),
    );
    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "  {title}");
}

fn row(out: &mut String, label: &str, value: String) {
    let _ = writeln!(out, "    {label:<LABEL_WIDTH$}{value}");
}
