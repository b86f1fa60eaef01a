use compliance_core::parse_number;
use serde_json::Value;

pub const DEFAULT_TOLERANCE: f64 = 5.0;

/// Strictly less than `tolerance` apart.
pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

/// Reads a claimed quantity: a number, a numeric string such as `"120,000"`, or
/// an object carrying a `total`.
pub fn parse_quantity(value: &Value) -> Option<f64> {
    match value {
        Value::Object(map) => map.get("total").and_then(parse_number),
        other => parse_number(other),
    }
}
