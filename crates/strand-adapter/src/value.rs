//! Managed-side values
//!
//! Everything the adapter hands back is a copy: no `Value` ever holds a
//! pointer into provider memory.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Pair(u32, u32),
    List(Vec<Value>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn ints<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<i64>,
    {
        Value::List(items.into_iter().map(|n| Value::Int(n.into())).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
            Value::Pair(_, _) => "pair",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Pair(x, y) => write!(f, "({}, {})", x, y),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Pair(20, 10).to_string(), "(20, 10)");
        assert_eq!(Value::ints([11, 27, 31]).to_string(), "[11, 27, 31]");
        assert_eq!(Value::text("♪ la encore! ♪").to_string(), "\"♪ la encore! ♪\"");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_serialize() {
        let value = Value::List(vec![
            Value::Int(1),
            Value::Pair(2, 3),
            Value::text("x"),
            Value::Bool(true),
            Value::Null,
        ]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"[1,[2,3],"x",true,null]"#
        );
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Int(0).type_name(), "int");
        assert_eq!(Value::List(vec![]).type_name(), "list");
    }
}
