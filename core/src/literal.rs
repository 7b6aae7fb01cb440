use std::fmt;

use serde_json::Value;

/// A typed query literal.
///
/// Literals are carried through query fragments as values and only turned
/// into text when the fragment is rendered, so every string that reaches the
/// backend goes through one escaping path.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Literal {
    /// Whether this literal is its type's zero value.
    ///
    /// Zero values act as "not provided" sentinels in cursor pagination.
    pub fn is_zero(&self) -> bool {
        match self {
            Literal::Int(v) => *v == 0,
            Literal::Bool(v) => !*v,
            Literal::Str(v) => v.is_empty(),
        }
    }

    /// Writes the rendered form into `buf`.
    ///
    /// Integers and booleans render bare; strings render quoted with
    /// backslash escapes for quotes, backslashes and control characters.
    pub fn render(&self, buf: &mut String) {
        match self {
            Literal::Int(v) => {
                buf.push_str(&v.to_string());
            }
            Literal::Bool(v) => {
                buf.push_str(if *v { "true" } else { "false" });
            }
            Literal::Str(v) => {
                buf.push('"');
                escape_into(v, buf);
                buf.push('"');
            }
        }
    }

    /// Converts the literal into a JSON value for use in mutation documents.
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Int(v) => Value::from(*v),
            Literal::Bool(v) => Value::from(*v),
            Literal::Str(v) => Value::from(v.as_str()),
        }
    }
}

fn escape_into(s: &str, buf: &mut String) {
    for ch in s.chars() {
        match ch {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                buf.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => buf.push(c),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        self.render(&mut buf);
        f.write_str(&buf)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Int(v as i64)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Str(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Str(v)
    }
}
