//! Display helpers for currency and percentage figures (en-US conventions).

/// Whole US dollars with thousands separators, e.g. `$61,235` or `-$1,200`.
pub fn currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "n/a".to_string();
    }
    let rounded = amount.round();
    let digits = group_thousands(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// ROI with one decimal and an explicit `+` for gains, e.g. `+14.2%`.
pub fn roi_percentage(value: f64) -> String {
    if value > 0.0 {
        format!("+{value:.1}%")
    } else {
        format!("{value:.1}%")
    }
}

/// Break-even horizon, e.g. `5.8 years`, or `never` when it does not happen.
pub fn years(value: Option<f64>) -> String {
    match value {
        Some(years) if years.is_finite() => format!("{years:.1} years"),
        _ => "never".to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (idx, ch) in raw.chars().enumerate() {
        if idx > 0 && (raw.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_rounds_and_groups() {
        assert_eq!(currency(0.0), "$0");
        assert_eq!(currency(999.4), "$999");
        assert_eq!(currency(61234.5), "$61,235");
        assert_eq!(currency(1_234_567.0), "$1,234,567");
        assert_eq!(currency(-1200.0), "-$1,200");
        assert_eq!(currency(f64::NAN), "n/a");
    }

    #[test]
    fn roi_marks_gains_only() {
        assert_eq!(roi_percentage(14.24), "+14.2%");
        assert_eq!(roi_percentage(0.0), "0.0%");
        assert_eq!(roi_percentage(-3.46), "-3.5%");
    }

    #[test]
    fn years_handles_missing_break_even() {
        assert_eq!(years(Some(5.76)), "5.8 years");
        assert_eq!(years(None), "never");
    }
}
