use crate::error::try_alloc;
use crate::schema::{NodeSchema, Value, ValueType};
use crate::PregelError;

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use rustc_hash::FxHashMap;

enum Column {
    Long(Box<[AtomicI64]>),
    Double(Box<[AtomicU64]>),
}

struct Property {
    key: String,
    value_type: ValueType,
    column: Column,
}

/// Flat per-node storage for the values declared in a [`NodeSchema`].
///
/// Every field is one contiguous array of `node_count * width` 64-bit slots. Slots are atomics
/// with relaxed ordering, so workers can write their own nodes through a shared reference;
/// cross-thread visibility is established by the superstep barrier.
pub struct NodeValueStore {
    node_count: usize,
    properties: Vec<Property>,
    index: FxHashMap<String, usize>,
}

impl NodeValueStore {
    pub fn new(schema: &NodeSchema, node_count: usize) -> Result<Self, PregelError> {
        let mut properties = Vec::with_capacity(schema.fields().len());
        let mut index = FxHashMap::default();

        for field in schema.fields() {
            let len = node_count
                .checked_mul(field.value_type.width())
                .unwrap_or(usize::MAX);
            let column = match field.value_type {
                ValueType::Long | ValueType::LongArray(_) => Column::Long(
                    try_alloc("node values", node_count, len, || AtomicI64::new(0))?
                        .into_boxed_slice(),
                ),
                ValueType::Double | ValueType::DoubleArray(_) => Column::Double(
                    try_alloc("node values", node_count, len, || {
                        AtomicU64::new(0_f64.to_bits())
                    })?
                    .into_boxed_slice(),
                ),
            };

            index.insert(field.key.clone(), properties.len());
            properties.push(Property {
                key: field.key.clone(),
                value_type: field.value_type,
                column,
            });
        }

        Ok(NodeValueStore {
            node_count,
            properties,
            index,
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn value_type(&self, key: &str) -> Option<ValueType> {
        self.index
            .get(key)
            .map(|&i| self.properties[i].value_type)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.key.as_str())
    }

    fn property(&self, key: &str, node: usize) -> &Property {
        assert!(
            node < self.node_count,
            "node id {} out of range for {} nodes",
            node,
            self.node_count
        );
        match self.index.get(key) {
            Some(&i) => &self.properties[i],
            None => panic!("unknown node value key `{}`", key),
        }
    }

    fn longs(
        &self,
        key: &str,
        node: usize,
        expected: fn(ValueType) -> bool,
    ) -> (&[AtomicI64], usize) {
        let property = self.property(key, node);
        match (&property.column, expected(property.value_type)) {
            (Column::Long(data), true) => (&data[..], property.value_type.width()),
            _ => panic!("node value `{}` has type {:?}", key, property.value_type),
        }
    }

    fn doubles(
        &self,
        key: &str,
        node: usize,
        expected: fn(ValueType) -> bool,
    ) -> (&[AtomicU64], usize) {
        let property = self.property(key, node);
        match (&property.column, expected(property.value_type)) {
            (Column::Double(data), true) => (&data[..], property.value_type.width()),
            _ => panic!("node value `{}` has type {:?}", key, property.value_type),
        }
    }

    pub fn long_value(&self, key: &str, node: usize) -> i64 {
        let (data, _) = self.longs(key, node, |t| t == ValueType::Long);
        data[node].load(Ordering::Relaxed)
    }

    pub fn set_long(&self, key: &str, node: usize, value: i64) {
        let (data, _) = self.longs(key, node, |t| t == ValueType::Long);
        data[node].store(value, Ordering::Relaxed);
    }

    pub fn double_value(&self, key: &str, node: usize) -> f64 {
        let (data, _) = self.doubles(key, node, |t| t == ValueType::Double);
        f64::from_bits(data[node].load(Ordering::Relaxed))
    }

    pub fn set_double(&self, key: &str, node: usize, value: f64) {
        let (data, _) = self.doubles(key, node, |t| t == ValueType::Double);
        data[node].store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn long_array_value(&self, key: &str, node: usize) -> Vec<i64> {
        let (data, width) = self.longs(key, node, |t| matches!(t, ValueType::LongArray(_)));
        data[node * width..(node + 1) * width]
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect()
    }

    pub fn set_long_array(&self, key: &str, node: usize, values: &[i64]) {
        let (data, width) = self.longs(key, node, |t| matches!(t, ValueType::LongArray(_)));
        assert_eq!(values.len(), width, "array length mismatch for `{}`", key);
        for (slot, value) in data[node * width..(node + 1) * width].iter().zip(values) {
            slot.store(*value, Ordering::Relaxed);
        }
    }

    pub fn double_array_value(&self, key: &str, node: usize) -> Vec<f64> {
        let (data, width) = self.doubles(key, node, |t| matches!(t, ValueType::DoubleArray(_)));
        data[node * width..(node + 1) * width]
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn set_double_array(&self, key: &str, node: usize, values: &[f64]) {
        let (data, width) = self.doubles(key, node, |t| matches!(t, ValueType::DoubleArray(_)));
        assert_eq!(values.len(), width, "array length mismatch for `{}`", key);
        for (slot, value) in data[node * width..(node + 1) * width].iter().zip(values) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn get(&self, node: usize, key: &str) -> Value {
        match self.property(key, node).value_type {
            ValueType::Long => Value::Long(self.long_value(key, node)),
            ValueType::Double => Value::Double(self.double_value(key, node)),
            ValueType::LongArray(_) => Value::LongArray(self.long_array_value(key, node)),
            ValueType::DoubleArray(_) => Value::DoubleArray(self.double_array_value(key, node)),
        }
    }

    pub fn set(&self, node: usize, key: &str, value: Value) {
        match value {
            Value::Long(v) => self.set_long(key, node, v),
            Value::Double(v) => self.set_double(key, node, v),
            Value::LongArray(v) => self.set_long_array(key, node, &v),
            Value::DoubleArray(v) => self.set_double_array(key, node, &v),
        }
    }

    /// Copies out a whole scalar long column.
    pub fn long_values(&self, key: &str) -> Vec<i64> {
        (0..self.node_count)
            .map(|node| self.long_value(key, node))
            .collect()
    }

    /// Copies out a whole scalar double column.
    pub fn double_values(&self, key: &str) -> Vec<f64> {
        (0..self.node_count)
            .map(|node| self.double_value(key, node))
            .collect()
    }
}

impl std::fmt::Debug for NodeValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeValueStore")
            .field("node_count", &self.node_count)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
