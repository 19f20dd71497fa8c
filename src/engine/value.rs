//! Runtime values and their rendering

use std::fmt::Write as _;

use crate::config::{EngineConfig, OutputFormat};

/// Digits kept when rendering, enough to hide binary rounding noise
const DISPLAY_PRECISION: u32 = 15;

/// Largest denominator tried when rendering fractions
const MAX_DENOMINATOR: i64 = 1000;

/// A number, optionally carrying how many significant figures it is known to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number {
    pub value: f64,
    pub sigfigs: Option<u32>,
}

impl Number {
    pub fn exact(value: f64) -> Self {
        Self {
            value,
            sigfigs: None,
        }
    }

    /// Result of combining two measured quantities keeps the lower precision
    pub fn combine(self, other: Number, value: f64) -> Self {
        let sigfigs = match (self.sigfigs, other.sigfigs) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        };
        Self { value, sigfigs }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Number),
    Text(String),
    Bool(bool),
    Unit,
}

impl Value {
    pub fn number(value: f64) -> Self {
        Value::Number(Number::exact(value))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Bool(_) => "boolean",
            Value::Unit => "nothing",
        }
    }

    /// Render for display under the given settings
    pub fn render(&self, config: &EngineConfig) -> String {
        match self {
            Value::Number(n) => render_number(*n, config),
            Value::Text(text) => text.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Unit => String::new(),
        }
    }

    /// Source text that evaluates back to this value
    pub fn to_literal(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.value.is_finite() {
                    format!("{}", n.value)
                } else if n.value.is_nan() {
                    "(1e999 - 1e999)".to_string()
                } else if n.value > 0.0 {
                    "1e999".to_string()
                } else {
                    "-1e999".to_string()
                }
            }
            Value::Text(text) => {
                let mut literal = String::with_capacity(text.len() + 2);
                literal.push('"');
                for c in text.chars() {
                    match c {
                        '"' => literal.push_str("\\\""),
                        '\\' => literal.push_str("\\\\"),
                        '\n' => literal.push_str("\\n"),
                        '\t' => literal.push_str("\\t"),
                        '\r' => literal.push_str("\\r"),
                        c => literal.push(c),
                    }
                }
                literal.push('"');
                literal
            }
            Value::Bool(b) => b.to_string(),
            Value::Unit => "\"\"".to_string(),
        }
    }
}

fn render_number(number: Number, config: &EngineConfig) -> String {
    let mut value = number.value;
    if config.significant_figures {
        if let Some(sigfigs) = number.sigfigs {
            value = round_significant(value, sigfigs);
        }
    }

    match config.output {
        OutputFormat::Raw => render_raw(value),
        OutputFormat::Math => render_fraction(value).unwrap_or_else(|| render_raw(value)),
        OutputFormat::Scientific => render_scientific(value),
    }
}

/// Round to `sigfigs` significant digits
pub fn round_significant(value: f64, sigfigs: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || sigfigs == 0 {
        return value;
    }
    let digits = (sigfigs - 1) as usize;
    format!("{:.*e}", digits, value).parse().unwrap_or(value)
}

fn render_raw(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let value = round_significant(value, DISPLAY_PRECISION);
    if value == value.trunc() && value.abs() < 1e15 {
        // avoid "-0"
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn render_scientific(value: f64) -> String {
    if !value.is_finite() {
        return render_raw(value);
    }
    let value = round_significant(value, DISPLAY_PRECISION);
    format!("{:e}", value).replace('e', "E")
}

fn render_fraction(value: f64) -> Option<String> {
    if !value.is_finite() || value == value.trunc() {
        return None;
    }

    for denominator in 2..=MAX_DENOMINATOR {
        let scaled = value * denominator as f64;
        if (scaled - scaled.round()).abs() < 1e-9 {
            let numerator = scaled.round() as i64;
            let mut text = String::new();
            let _ = write!(text, "{}/{}", numerator, denominator);
            return Some(text);
        }
    }
    None
}
