//! Swedish (`sv-SE`) number and name formatting for presenting results.

const GROUP_SEPARATOR: char = '\u{a0}';
const MINUS_SIGN: char = '\u{2212}';

/// Whole kronor with grouped thousands, e.g. `31 250` (no currency suffix).
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(value) => format_grouped(value, 0),
        None => "0".to_string(),
    }
}

/// Currency difference with an explicit `+` for positive values.
pub fn format_diff(diff: f64) -> String {
    let formatted = format_currency(Some(diff));
    if diff.round() > 0.0 {
        format!("+{formatted}")
    } else {
        formatted
    }
}

/// Two decimals with a decimal comma, e.g. `32,45`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(value) => format_grouped(value, 2),
        None => "0,00".to_string(),
    }
}

/// Title-cases upper-case names from the API: `UPPLANDS VÄSBY` → `Upplands Väsby`.
pub fn format_name(name: &str) -> String {
    name.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn diff(a: f64, b: f64) -> f64 {
    a - b
}

fn format_grouped(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value.abs() * scale).round() / scale;
    let digits = format!("{rounded:.decimals$}");
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && rounded > 0.0 {
        out.push(MINUS_SIGN);
    }
    let len = integer.len();
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(digit);
    }
    if let Some(fraction) = fraction {
        out.push(',');
        out.push_str(fraction);
    }
    out
}
