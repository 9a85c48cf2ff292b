#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Long,
    Double,
    LongArray(usize),
    DoubleArray(usize),
}

impl ValueType {
    /// Number of 64-bit slots one node occupies for this type.
    pub fn width(&self) -> usize {
        match self {
            ValueType::Long | ValueType::Double => 1,
            ValueType::LongArray(width) | ValueType::DoubleArray(width) => *width,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Long(i64),
    Double(f64),
    LongArray(Vec<i64>),
    DoubleArray(Vec<f64>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::LongArray(values) => ValueType::LongArray(values.len()),
            Value::DoubleArray(values) => ValueType::DoubleArray(values.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value_type: ValueType,
}

/// The per-node values a computation declares up front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSchema {
    fields: Vec<Field>,
}

impl NodeSchema {
    pub fn new() -> Self {
        NodeSchema { fields: Vec::new() }
    }

    pub fn add(mut self, key: &str, value_type: ValueType) -> Self {
        assert!(
            self.fields.iter().all(|field| field.key != key),
            "duplicate node value key `{}`",
            key
        );
        self.fields.push(Field {
            key: key.to_string(),
            value_type,
        });
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(ValueType::Double.width(), 1);
        assert_eq!(ValueType::LongArray(4).width(), 4);
        assert_eq!(Value::DoubleArray(vec![1.0, 2.0]).value_type(), ValueType::DoubleArray(2));
    }

    #[test]
    #[should_panic(expected = "duplicate node value key")]
    fn duplicate_keys_panic() {
        NodeSchema::new()
            .add("rank", ValueType::Double)
            .add("rank", ValueType::Long);
    }
}
