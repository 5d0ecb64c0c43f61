use std::fmt;

/// Typed payload of an attribute or dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Boolean(Vec<bool>),
    String(Vec<String>),
}

impl Data {
    pub fn len(&self) -> usize {
        match self {
            Data::Integer(v) => v.len(),
            Data::Float(v) => v.len(),
            Data::Boolean(v) => v.len(),
            Data::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Data::Integer(_) => "integer",
            Data::Float(_) => "float",
            Data::Boolean(_) => "boolean",
            Data::String(_) => "string",
        }
    }
}

/// An attribute or dataset read from a node. An empty `shape` is a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub shape: Vec<usize>,
    pub data: Data,
}

impl Value {
    pub fn new(shape: Vec<usize>, data: Data) -> Self {
        Self { shape, data }
    }

    pub fn vector(data: Data) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn matrix(rows: usize, cols: usize, data: Data) -> Self {
        Self {
            shape: vec![rows, cols],
            data,
        }
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty() || (self.shape.iter().all(|d| *d == 1) && self.data.len() == 1)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::String(v) if self.is_scalar() => v.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match &self.data {
            Data::String(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view; floats are accepted only when every value is integral
    /// and representable as an `i64`.
    pub fn to_i64s(&self) -> Option<Vec<i64>> {
        match &self.data {
            Data::Integer(v) => Some(v.clone()),
            Data::Boolean(v) => Some(v.iter().map(|b| *b as i64).collect()),
            Data::Float(v) => v.iter().map(|f| float_to_i64(*f)).collect(),
            Data::String(_) => None,
        }
    }

    pub fn to_f64s(&self) -> Option<Vec<f64>> {
        match &self.data {
            Data::Integer(v) => Some(v.iter().map(|i| *i as f64).collect()),
            Data::Float(v) => Some(v.clone()),
            Data::Boolean(v) => Some(v.iter().map(|b| if *b { 1.0 } else { 0.0 }).collect()),
            Data::String(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        if !self.is_scalar() {
            return None;
        }
        self.to_i64s().and_then(|v| v.first().copied())
    }

    pub fn as_f64(&self) -> Option<f64> {
        if !self.is_scalar() {
            return None;
        }
        self.to_f64s().and_then(|v| v.first().copied())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.data {
            Data::Boolean(v) if self.is_scalar() => v.first().copied(),
            _ => self.as_i64().map(|i| i != 0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "{}", s),
            None => write!(f, "<{} {:?}>", self.data.type_name(), self.shape),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(Vec::new(), Data::String(vec![s.to_string()]))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new(Vec::new(), Data::String(vec![s]))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::new(Vec::new(), Data::Integer(vec![i]))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::new(Vec::new(), Data::Float(vec![f]))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::new(Vec::new(), Data::Boolean(vec![b]))
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::vector(Data::Integer(v))
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::vector(Data::Float(v))
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::vector(Data::String(v.into_iter().map(String::from).collect()))
    }
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn float_to_i64(f: f64) -> Option<i64> {
    let in_range = (i64::MIN as f64..i64::MAX as f64).contains(&f);
    (in_range && f.fract() == 0.0).then_some(f as i64)
}
