use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_object, ROW_FIELDS};

/// Field/value table of the result, then one table per row-shaped field.
pub fn print_table(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut fields = Vec::new();
    flatten("", result, &mut fields);
    for (key, val) in fields {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));

    for name in ROW_FIELDS {
        if let Some(Value::Array(rows)) = result.get(name) {
            if !rows.is_empty() {
                println!("\n{}:", name);
                print_rows(rows);
            }
        }
    }

    if let Some(envelope) = value.as_object() {
        print_envelope_notes(envelope);
    }
}

/// Scalars with dotted keys for nested objects; row arrays are skipped.
fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, out),
            Value::Array(_) if ROW_FIELDS.contains(&key.as_str()) => {}
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(format_scalar).collect();
                out.push((name, joined.join(", ")));
            }
            _ => out.push((name, format_scalar(val))),
        }
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows.iter().filter_map(Value::as_object) {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(format_scalar).unwrap_or_default())
            .collect();
        builder.push_record(cells);
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}
