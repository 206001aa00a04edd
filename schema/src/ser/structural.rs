//! The structural text format: JSON, two-space indented, with
//! `$schema` always the first key at the root (§4.J).

use super::{date_to_unix_timestamp, prune, Value};

pub fn render(root: Value, schema_url: &str) -> String {
    let root = match prune(root) {
        Value::Map(mut entries) => {
            entries.insert(0, ("$schema", Value::Str(schema_url.to_string())));
            Value::Map(entries)
        }
        other => other,
    };
    let mut out = String::new();
    write_value(&mut out, &root, 0);
    out.push('\n');
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn write_value(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(&b.to_string()),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Str(s) => write_json_string(out, s),
        Value::Date(s) => match date_to_unix_timestamp(s) {
            Some(ts) => out.push_str(&ts.to_string()),
            None => out.push_str("null"),
        },
        Value::Seq(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                indent(out, level + 1);
                write_value(out, item, level + 1);
                if i + 1 != items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            indent(out, level);
            out.push(']');
        }
        Value::Map(entries) => {
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (k, v)) in entries.iter().enumerate() {
                indent(out, level + 1);
                write_json_string(out, k);
                out.push_str(": ");
                write_value(out, v, level + 1);
                if i + 1 != entries.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            indent(out, level);
            out.push('}');
        }
    }
}

fn write_json_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
