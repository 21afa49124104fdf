use serde_json::Value;

/// Print just the key answer from the output.
///
/// Looks for well-known result paths in order of priority, then falls
/// back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", minimal_answer(result_obj));
}

fn minimal_answer(result: &Value) -> String {
    // Graded output: "B- 54.6"
    if let Some(grade) = result.get("grade").filter(|g| g.is_object()) {
        let letter = grade.get("grade").map(format_minimal).unwrap_or_default();
        let score = grade.get("score").map(format_minimal).unwrap_or_default();
        return format!("{letter} {score}");
    }

    // Classification: "c-class tier-3"
    if let Some(class) = result.get("classification").filter(|c| c.is_object()) {
        let asset = class.get("asset_class").map(format_minimal).unwrap_or_default();
        let tier = class.get("market_tier").map(format_minimal).unwrap_or_default();
        return format!("{asset} {tier}");
    }

    let priority_paths: [&[&str]; 3] = [
        &["metrics", "year1_net_operating_income"],
        &["monthly_payment"],
        &["annual_debt_service"],
    ];
    for path in priority_paths {
        let found = path.iter().try_fold(result, |v, key| v.get(*key));
        if let Some(val) = found.filter(|v| !v.is_null()) {
            return format_minimal(val);
        }
    }

    match result {
        Value::Object(map) => map
            .iter()
            .next()
            .map(|(key, val)| format!("{}: {}", key, format_minimal(val)))
            .unwrap_or_default(),
        _ => format_minimal(result),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
