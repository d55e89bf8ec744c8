use crate::transform::parse_month;

/// `2024-01-01` -> `Jan 24`. Unparseable values are shown as they came.
pub fn format_month_tick(month: &str) -> String {
    match parse_month(month) {
        Some(date) => date.format("%b %y").to_string(),
        None => month.to_string(),
    }
}

/// Y-axis tick: one decimal with a `K`/`M`/`B` suffix from a thousand upwards.
pub fn format_axis_value(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.1}", value)
    }
}

/// Tooltip value with `,` grouping and at most three fraction digits (`1,234,567.891`).
pub fn format_tooltip_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
