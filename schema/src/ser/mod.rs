//! A tiny ordered, schema-agnostic value tree.
//!
//! This is the "explicit per-type field table" called for by the
//! spec's redesign hints: rather than deriving `Serialize` on the
//! model and letting reflection pick field names and order, each
//! manifest type has a `to_fields`/`from_fields` pair (in
//! `crate::fields`) that walks this tree directly. Both wire formats
//! (`flow` and `structural`) render the same tree; only their text
//! layout differs.

pub mod flow;
pub mod structural;

/// One node of the field tree. `Map` entries preserve declaration
/// order, which both renderers rely on (e.g. `$schema` first in the
/// structural format).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// A calendar date, stored canonically as `YYYY-MM-DD`. Rendered
    /// as a quoted date string in flow format and as a Unix timestamp
    /// in structural format (§4.I "tree-level update", §4.J) — the one
    /// field whose on-disk shape depends on the output format rather
    /// than being a fixed mapping from this tree.
    Date(String),
    Seq(Vec<Value>),
    Map(Vec<(&'static str, Value)>),
}

impl Value {
    pub fn is_empty_ish(&self) -> bool {
        matches!(self, Value::Null)
            || matches!(self, Value::Seq(s) if s.is_empty())
            || matches!(self, Value::Map(m) if m.is_empty())
    }

    pub fn opt_str(v: &Option<String>) -> Value {
        match v {
            Some(s) => Value::Str(s.clone()),
            None => Value::Null,
        }
    }

    pub fn str_list(v: &[String]) -> Value {
        Value::Seq(v.iter().cloned().map(Value::Str).collect())
    }

    pub fn int_list(v: &[i64]) -> Value {
        Value::Seq(v.iter().copied().map(Value::Int).collect())
    }

    /// Multiline strings (anything containing `\r`, `\n`, NEL, LS or
    /// PS) must be emitted as a literal block scalar in flow format
    /// (§4.J).
    pub fn needs_literal_block(s: &str) -> bool {
        s.contains(['\r', '\n', '\u{85}', '\u{2028}', '\u{2029}'])
    }

    pub fn opt_date(v: &Option<String>) -> Value {
        match v {
            Some(s) => Value::Date(s.clone()),
            None => Value::Null,
        }
    }
}

/// Days in each month of a non-leap year, for the date↔timestamp
/// conversion below.
const DAYS_IN_MONTH: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: i64) -> i64 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH[(month - 1) as usize]
    }
}

/// Parse a canonical `YYYY-MM-DD` string into a Unix timestamp
/// (seconds at midnight UTC). Used only when rendering to structural
/// format; flow format keeps the date string as-is.
pub fn date_to_unix_timestamp(date: &str) -> Option<i64> {
    let mut parts = date.splitn(3, '-');
    let year: i64 = parts.next()?.parse().ok()?;
    let month: i64 = parts.next()?.parse().ok()?;
    let day: i64 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let mut days: i64 = 0;
    if year >= 1970 {
        for y in 1970..year {
            days += if is_leap_year(y) { 366 } else { 365 };
        }
    } else {
        for y in year..1970 {
            days -= if is_leap_year(y) { 366 } else { 365 };
        }
    }
    for m in 1..month {
        days += days_in_month(year, m);
    }
    days += day - 1;
    Some(days * 86_400)
}

/// Inverse of [`date_to_unix_timestamp`]: convert seconds since the
/// epoch back to a canonical `YYYY-MM-DD` date string.
pub fn unix_timestamp_to_date(timestamp: i64) -> String {
    let mut days = timestamp.div_euclid(86_400);
    let mut year = 1970i64;
    loop {
        let year_len = if is_leap_year(year) { 366 } else { 365 };
        if days >= year_len {
            days -= year_len;
            year += 1;
        } else if days < 0 {
            year -= 1;
            days += if is_leap_year(year) { 366 } else { 365 };
        } else {
            break;
        }
    }
    let mut month = 1i64;
    loop {
        let len = days_in_month(year, month);
        if days >= len {
            days -= len;
            month += 1;
        } else {
            break;
        }
    }
    format!("{year:04}-{month:02}-{:02}", days + 1)
}

/// Strip `Null` entries and empty sequences from a `Map`, recursively.
/// Both renderers call this before walking the tree so "omit null
/// fields" is implemented once, not in each renderer.
pub fn prune(value: Value) -> Value {
    match value {
        Value::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !v.is_empty_ish())
                .collect(),
        ),
        Value::Seq(items) => Value::Seq(items.into_iter().map(prune).collect()),
        other => other,
    }
}
