//! The flow-style text format: the YAML dialect winget-style manifests
//! ship as. "Flow" here names the style of the *emitted* manifest
//! family, not YAML's flow-collection syntax — scalars are single-
//! quoted, collections are block-style, and multiline strings use a
//! literal block scalar.

use super::{prune, Value};

/// Everything a caller needs to stamp a file with the producer/schema
/// banner (§4.J).
#[derive(Debug, Clone)]
pub struct FlowBanner {
    pub producer: String,
    pub lang_server: String,
    pub schema_url: String,
}

/// Render a field tree as flow-style text, with the banner prepended.
pub fn render(root: Value, banner: &FlowBanner) -> String {
    let root = prune(root);
    let mut out = String::new();
    out.push_str(&format!("# Created using {}\n", banner.producer));
    out.push_str(&format!(
        "# {}: $schema={}\n",
        banner.lang_server, banner.schema_url
    ));

    match root {
        Value::Map(entries) => {
            for (key, value) in entries {
                write_entry(&mut out, 0, key, &value);
            }
        }
        other => write_scalar_line(&mut out, 0, None, &other),
    }
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn write_entry(out: &mut String, level: usize, key: &str, value: &Value) {
    match value {
        Value::Map(entries) => {
            indent(out, level);
            out.push_str(key);
            out.push_str(":\n");
            for (k, v) in entries {
                write_entry(out, level + 1, k, v);
            }
        }
        Value::Seq(items) => {
            indent(out, level);
            out.push_str(key);
            out.push_str(":\n");
            for item in items {
                write_seq_item(out, level, item);
            }
        }
        scalar => write_scalar_line(out, level, Some(key), scalar),
    }
}

fn write_seq_item(out: &mut String, level: usize, item: &Value) {
    match item {
        Value::Map(entries) => {
            indent(out, level);
            out.push_str("- ");
            let mut first = true;
            for (k, v) in entries {
                if first {
                    out.push_str(&format!("{k}:"));
                    first = false;
                } else {
                    indent(out, level + 1);
                    out.push_str(&format!("  {k}:"));
                }
                write_scalar_tail(out, level + 2, v);
            }
        }
        scalar => {
            indent(out, level);
            out.push_str("- ");
            out.push_str(&scalar_text(scalar, level + 1));
            out.push('\n');
        }
    }
}

fn write_scalar_line(out: &mut String, level: usize, key: Option<&str>, value: &Value) {
    indent(out, level);
    if let Some(k) = key {
        out.push_str(k);
        out.push_str(": ");
    }
    out.push_str(&scalar_text(value, level + 1));
    out.push('\n');
}

fn write_scalar_tail(out: &mut String, level: usize, value: &Value) {
    out.push(' ');
    out.push_str(&scalar_text(value, level));
    out.push('\n');
}

fn scalar_text(value: &Value, literal_indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Str(s) if Value::needs_literal_block(s) => literal_block(s, literal_indent),
        Value::Str(s) => quote_single(s),
        Value::Date(s) => quote_single(s),
        Value::Map(_) | Value::Seq(_) => unreachable!("compound value in scalar position"),
    }
}

fn quote_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn literal_block(s: &str, level: usize) -> String {
    let mut out = String::from("|-\n");
    for line in s.split(['\r', '\n', '\u{85}', '\u{2028}', '\u{2029}']) {
        if !line.is_empty() || s.ends_with(line) {
            for _ in 0..level {
                out.push_str("  ");
            }
            out.push_str(line);
            out.push('\n');
        }
    }
    out.pop();
    out
}
