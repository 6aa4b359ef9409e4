/// Format a price with two decimals and thousands separators, e.g. 2,512.35
pub fn format_price(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(int_part), frac_part)
}

/// Format an integer count with thousands separators
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format percentage with sign
pub fn format_percentage_with_sign(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
