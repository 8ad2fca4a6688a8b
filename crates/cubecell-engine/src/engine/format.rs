use super::eval::Value;

/// Text written into a cell whose value could not be computed.
pub const ERROR_VALUE: &str = "#ERROR";

/// Format an evaluated value for display and storage.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Text(s) => s.clone(),
    }
}
