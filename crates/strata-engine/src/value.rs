//! Script-visible values
//!
//! The host is string-oriented: every value has a canonical text form, and
//! lists render in brace-quoted list syntax so that option triples such as
//! `-color red blue` read back the way a script would write them.

use std::fmt;

/// A value passed into or returned from member functions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// String value
    Str(String),
    /// Integer value
    Int(i64),
    /// List of values
    List(Vec<Value>),
}

impl Value {
    /// The empty result
    pub fn empty() -> Self {
        Value::Str(String::new())
    }

    /// Create a list value
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// Check if this value renders as the empty string
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Str(s) => s.is_empty(),
            Value::Int(_) => false,
            Value::List(items) => items.is_empty(),
        }
    }

    /// Get the string payload without rendering, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get list elements, if this is a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

fn is_special(c: char) -> bool {
    c.is_whitespace() || matches!(c, '{' | '}' | '"' | ';' | '$' | '[' | ']' | '\\')
}

/// Braces nest properly and no backslash could escape the closing brace
fn braces_balanced(text: &str) -> bool {
    let mut depth: usize = 0;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0 && !text.ends_with('\\')
}

/// Quote a list element so it survives re-parsing as a single word
///
/// Elements are brace-quoted when their braces balance and backslash-escaped
/// otherwise.
fn write_element(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    let text = value.to_string();
    if text.is_empty() {
        return f.write_str("{}");
    }
    if !text.chars().any(is_special) {
        return f.write_str(&text);
    }
    if braces_balanced(&text) && !text.contains('\\') {
        return write!(f, "{{{}}}", text);
    }
    for c in text.chars() {
        match c {
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c if is_special(c) => write!(f, "\\{}", c)?,
            c => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write_element(f, item)?;
                }
                Ok(())
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(b as i64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(Value::empty().is_empty());
        assert!(Value::list(Vec::new()).is_empty());
        assert!(!Value::Int(0).is_empty());
    }

    #[test]
    fn test_list_display_quotes_elements() {
        let v = Value::list(vec![
            Value::from("-color"),
            Value::from("light red"),
            Value::empty(),
        ]);
        assert_eq!(v.to_string(), "-color {light red} {}");
    }

    #[test]
    fn test_nested_list_display() {
        let inner = Value::list(vec![Value::from("-x"), Value::from("1"), Value::from("2")]);
        let outer = Value::list(vec![inner.clone(), inner]);
        assert_eq!(outer.to_string(), "{-x 1 2} {-x 1 2}");
    }

    #[test]
    fn test_unbalanced_braces_are_escaped() {
        let v = Value::list(vec![Value::from("a}"), Value::from("{b c"), Value::from("d e")]);
        assert_eq!(v.to_string(), "a\\} \\{b\\ c {d e}");
    }

    #[test]
    fn test_backslash_is_escaped() {
        let v = Value::list(vec![Value::from("x\\y"), Value::from("{ok}")]);
        assert_eq!(v.to_string(), "x\\\\y {{ok}}");
    }
}
