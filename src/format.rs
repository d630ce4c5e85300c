//! Number formatting for KPI cards and tables.

/// Group the integer digits of an already-formatted number with commas.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `1234567.891` → `"$1,234,567.89"`
pub fn format_money(value: f64) -> String {
    let grouped = group_thousands(&format!("{value:.2}"));
    match grouped.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None => format!("${grouped}"),
    }
}

/// `1234567` → `"1,234,567"`
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// A fraction rendered as a percentage with two decimals: `0.8` → `"80.00%"`.
pub fn format_fraction_pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// A value already in percent units: `20.0` → `"20.00%"`.
pub fn format_pct(percent: f64) -> String {
    format!("{percent:.2}%")
}
