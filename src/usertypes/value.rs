use std::{fmt, path::PathBuf};

use super::number::Number;

/// Marker values that stand in for a real value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    /// A remote setting that has not been fetched yet.
    Disconnected,
    Unlimited,
    Random,
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Constant::Disconnected => "disconnected",
            Constant::Unlimited => "unlimited",
            Constant::Random => "random",
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A native value produced by one of the value types.
///
/// Booleans compare by truthiness and numbers by magnitude.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Number(Number),
    Path(PathBuf),
    List(Vec<String>),
    Constant(Constant),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(state) => Some(*state),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(number) => Some(number),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathBuf> {
        match self {
            Value::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<Constant> {
        match self {
            Value::Constant(constant) => Some(*constant),
            _ => None,
        }
    }

    pub fn is(&self, constant: Constant) -> bool {
        self.as_constant() == Some(constant)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Bool(state) => write!(f, "{state}"),
            Value::Number(number) => write!(f, "{number}"),
            Value::Path(path) => write!(f, "{}", path.display()),
            Value::List(items) => f.write_str(&items.join(", ")),
            Value::Constant(constant) => f.write_str(constant.name()),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<bool> for Value {
    fn from(state: bool) -> Self {
        Value::Bool(state)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        Value::Number(number)
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        Value::Path(path)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Constant> for Value {
    fn from(constant: Constant) -> Self {
        Value::Constant(constant)
    }
}
