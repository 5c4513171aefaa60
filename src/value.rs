use std::collections::HashMap;

/// A dynamically-typed value flowing through the tally engine.
///
/// Covers every shape a parsed JSON document can take, with integers kept
/// separate from floats so aggregate results stay whole numbers when the
/// inputs were whole numbers.
///
/// # Examples
///
/// ```
/// use tally_lang::Value;
/// use std::collections::HashMap;
///
/// let scalar = Value::Integer(42);
/// let row = Value::Object(HashMap::from([
///     ("price".to_string(), Value::Float(9.99)),
/// ]));
/// let rows = Value::Array(vec![row]);
/// assert!(rows.is_array());
/// assert!(scalar.is_scalar());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON null
    Null,

    /// JSON boolean
    Boolean(bool),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// UTF-8 string
    String(String),

    /// List of values
    Array(Vec<Value>),

    /// Record with string keys
    Object(HashMap<String, Value>),
}

impl Value {
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Scalars are everything that is not a collection.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Numeric view of the value, if it has one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric coercion used by the aggregate operators: anything that is
    /// not a number counts as 0, so aggregates never produce NaN.
    pub fn coerce_float(&self) -> f64 {
        self.as_float().unwrap_or(0.0)
    }

    /// Field lookup on a record; `Null` when the value is not a record or
    /// the field is absent.
    pub fn field(&self, name: &str) -> Value {
        match self {
            Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

/// Loose equality used by conditions and the frequency/unique operators:
/// integers and floats compare numerically, everything else structurally.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Wrap an f64 back into a `Value`, preserving integer-ness when the result
/// is a whole number in i64 range.
pub fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Integer(n as i64)
    } else {
        Value::Float(n)
    }
}
