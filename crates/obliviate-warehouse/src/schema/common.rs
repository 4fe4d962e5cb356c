use serde_json::Value;

/// Locale-formatted decimals use a comma, e.g. `"1234,56"`; everything stored uses a dot.
pub fn normalize_decimal(value: &str) -> String {
    value.replace(',', ".")
}

/// Render a provider value as the text that is stored.
///
/// ```text
/// "Apple Inc."          -> Apple Inc.
/// 183.79                -> 183.79
/// true                  -> true
/// null / absent         -> (empty)
/// ["MSFT", "GOOGL"]     -> MSFT,GOOGL
/// ```
pub fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| render_value(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        // numbers, bools & objects keep their JSON text
        Some(other) => other.to_string(),
    }
}
