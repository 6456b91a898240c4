use serde_json::Value;

use super::{format_scalar, result_object};

/// Headline field for each calculator, checked in order.
const HEADLINE_KEYS: [&str; 10] = [
    "value",
    "payment",
    "contribution",
    "apr_pct",
    "irr_pct",
    "rate_pct",
    "accelerated_years",
    "periodic_rate",
    "npv",
    "multiple",
];

/// Print just the headline number of a result.
pub fn print_minimal(value: &Value) {
    let Some(map) = result_object(value) else {
        println!("{}", format_scalar(value));
        return;
    };

    let headline = HEADLINE_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null());

    match headline {
        Some(val) => println!("{}", format_scalar(val)),
        None => {
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_scalar(val));
            }
        }
    }
}
