use std::fmt;

use crate::interpreter::callable::Function;

/// Dynamic type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    Error,
    Number,
    String,
    Boolean,
    Array,
    Function,
}

#[derive(Clone, Debug, Default)]
pub enum Value {
    /// "No value": missing array entries, calls that return nothing.
    #[default]
    Undefined,
    Number(i64),
    Str(String),
    Bool(bool),
    Array(Array),
    Function(Function),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Undefined => ValueKind::Error,
            Self::Number(_) => ValueKind::Number,
            Self::Str(_) => ValueKind::String,
            Self::Bool(_) => ValueKind::Boolean,
            Self::Array(_) => ValueKind::Array,
            Self::Function(_) => ValueKind::Function,
        }
    }

    /// Only the boolean `true` counts; every other value is false.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// The entry under `key` when this is an array holding it. Every other
    /// kind has no entries.
    pub fn entry(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Array(array) => array.get(key),
            _ => None,
        }
    }
}

/// Deep structural equality, except that functions compare by the
/// identity of their literal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Array(a) => write!(f, "{a}"),
            Self::Undefined | Self::Function(_) => write!(f, "{}", self.kind()),
        }
    }
}

/// Insertion-ordered association list. Lookups scan linearly and compare
/// keys with [`Value`] equality.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Array {
    entries: Vec<(Value, Value)>,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Overwrite an existing key in place, or append a new entry.
    pub fn set(&mut self, key: Value, value: Value) {
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{k}:{v}")?;
        }
        write!(f, "]")
    }
}
