use serde_json::{Map, Value};
use std::io;

use super::{format_scalar, result_object, ROW_FIELDS};

/// Write the first non-empty row field (schedule, annual summary or
/// projection) as CSV; otherwise a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match result_object(value) {
        Some(result) => {
            let rows = ROW_FIELDS
                .iter()
                .filter_map(|name| result.get(*name).and_then(Value::as_array))
                .find(|rows| !rows.is_empty());
            match rows {
                Some(rows) => write_rows(&mut wtr, rows),
                None => write_fields(&mut wtr, result),
            }
        }
        None => wtr.write_record([format_scalar(value)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;

    for row in rows.iter().filter_map(Value::as_object) {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(format_scalar).unwrap_or_default())
            .collect();
        wtr.write_record(&cells)?;
    }
    Ok(())
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in result {
        if let Value::Object(inner) = val {
            for (sub, sub_val) in inner {
                wtr.write_record([format!("{}.{}", key, sub), format_scalar(sub_val)])?;
            }
        } else {
            wtr.write_record([key.clone(), format_scalar(val)])?;
        }
    }
    Ok(())
}
