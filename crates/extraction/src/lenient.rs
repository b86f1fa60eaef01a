//! Serde helpers for model output, which mixes numbers, numeric strings and nulls.

use compliance_core::parse_number;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_number))
}

/// Strings stay as they are, numbers and booleans are rendered, null and
/// empty strings become `None`.
pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "super::number")]
        amount: Option<f64>,
        #[serde(default, deserialize_with = "super::string")]
        label: Option<String>,
    }

    fn sample(value: serde_json::Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn should_read_numbers_and_numeric_strings() {
        assert_eq!(sample(json!({"amount": 12})).amount, Some(12.0));
        assert_eq!(sample(json!({"amount": "6,000 kWh"})).amount, Some(6000.0));
        assert_eq!(sample(json!({"amount": null})).amount, None);
        assert_eq!(sample(json!({})).amount, None);
        assert_eq!(sample(json!({"amount": "n/a"})).amount, None);
    }

    #[test]
    fn should_read_strings_leniently() {
        assert_eq!(sample(json!({"label": "M-01"})).label.as_deref(), Some("M-01"));
        assert_eq!(sample(json!({"label": 101})).label.as_deref(), Some("101"));
        assert_eq!(sample(json!({"label": "  "})).label, None);
        assert_eq!(sample(json!({"label": ["x"]})).label, None);
    }
}
