use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Reads a number from model output, which may be a JSON number or text such
/// as `"120,000 kWh (Monthly)"` or `"INR 75,000"`. Thousands separators are
/// dropped and the first decimal number in the text is used.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_number_str(text),
        _ => None,
    }
}

pub fn parse_number_str(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    let cleaned = cleaned.trim();

    if let Ok(number) = cleaned.parse::<f64>() {
        return number.is_finite().then_some(number);
    }

    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = NUMBER
        .get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").ok())
        .as_ref()?;
    pattern
        .find(cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
