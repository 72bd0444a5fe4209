// src/store/formula.rs
// Typed filter expressions for table selects.
//
// A `Filter` renders to Airtable formula text (quoting and escaping handled
// here, never by callers) and can be evaluated directly against a record's
// fields by in-process stores.

use serde_json::{Map, Value};
use std::fmt::Write;

/// A literal on the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Text(s)
    }
}

impl From<&String> for Literal {
    fn from(s: &String) -> Self {
        Literal::Text(s.clone())
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Number(n as f64)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

/// Boolean filter over a record's fields
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Literal),
    Ne(String, Literal),
    /// `FIND(needle, {field}) > 0`: substring match
    Contains(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains(field.into(), needle.into())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Render as Airtable formula text
    pub fn to_formula(&self) -> String {
        let mut out = String::new();
        self.write_formula(&mut out);
        out
    }

    fn write_formula(&self, out: &mut String) {
        match self {
            Filter::Eq(field, lit) => {
                let _ = write!(out, "{} = {}", field_ref(field), render_literal(lit));
            }
            Filter::Ne(field, lit) => {
                let _ = write!(out, "{} != {}", field_ref(field), render_literal(lit));
            }
            Filter::Contains(field, needle) => {
                let _ = write!(out, "FIND({}, {}) > 0", quote(needle), field_ref(field));
            }
            Filter::And(parts) => write_call(out, "AND", parts, "TRUE()"),
            Filter::Or(parts) => write_call(out, "OR", parts, "FALSE()"),
            Filter::Not(inner) => {
                out.push_str("NOT(");
                inner.write_formula(out);
                out.push(')');
            }
        }
    }

    /// Evaluate against a record's fields with Airtable's loose comparison
    /// rules: a missing field compares as blank, numbers and checkboxes
    /// compare by value.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Filter::Eq(field, lit) => literal_equals(fields.get(field), lit),
            Filter::Ne(field, lit) => !literal_equals(fields.get(field), lit),
            Filter::Contains(field, needle) => {
                needle.is_empty() || field_text(fields.get(field)).contains(needle.as_str())
            }
            Filter::And(parts) => parts.iter().all(|f| f.matches(fields)),
            Filter::Or(parts) => parts.iter().any(|f| f.matches(fields)),
            Filter::Not(inner) => !inner.matches(fields),
        }
    }
}

fn write_call(out: &mut String, name: &str, parts: &[Filter], empty: &str) {
    if parts.is_empty() {
        out.push_str(empty);
        return;
    }
    out.push_str(name);
    out.push('(');
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        part.write_formula(out);
    }
    out.push(')');
}

fn field_ref(field: &str) -> String {
    format!("{{{field}}}")
}

/// Single-quote a string literal, escaping backslashes and quotes
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::Text(s) => quote(s),
        Literal::Number(n) => format_number(*n),
        Literal::Bool(true) => "TRUE()".to_string(),
        Literal::Bool(false) => "FALSE()".to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => if *b { "1" } else { "0" }.to_string(),
        Some(Value::Number(n)) => n.as_f64().map(format_number).unwrap_or_default(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| field_text(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn literal_equals(value: Option<&Value>, lit: &Literal) -> bool {
    match lit {
        Literal::Text(s) => field_text(value) == *s,
        Literal::Number(n) => match value {
            Some(Value::Number(v)) => v.as_f64() == Some(*n),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok() == Some(*n),
            None | Some(Value::Null) => *n == 0.0,
            _ => false,
        },
        Literal::Bool(b) => {
            let truthy = match value {
                Some(Value::Bool(v)) => *v,
                Some(Value::Number(v)) => v.as_f64().is_some_and(|f| f != 0.0),
                Some(Value::String(s)) => !s.is_empty(),
                _ => false,
            };
            truthy == *b
        }
    }
}
