use crate::combine::Combine;

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// A named global value every node can contribute to during a superstep.
///
/// Contributions of superstep `i` are folded with `combiner` and become readable in superstep
/// `i + 1` and in the master computation that runs right after superstep `i`.
#[derive(Clone)]
pub struct Aggregator {
    key: String,
    combiner: Arc<dyn Combine<f64>>,
}

impl Aggregator {
    pub fn new<C: Combine<f64> + 'static>(key: &str, combiner: C) -> Self {
        Aggregator {
            key: key.to_string(),
            combiner: Arc::new(combiner),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator").field("key", &self.key).finish()
    }
}

pub(crate) struct Aggregators {
    aggregators: Vec<Aggregator>,
    index: FxHashMap<String, usize>,
    current: Mutex<Vec<Option<f64>>>,
    previous: Vec<Option<f64>>,
}

impl Aggregators {
    pub(crate) fn new(aggregators: Vec<Aggregator>) -> Self {
        let mut index = FxHashMap::default();
        for (i, aggregator) in aggregators.iter().enumerate() {
            let duplicate = index.insert(aggregator.key.clone(), i);
            assert!(duplicate.is_none(), "duplicate aggregator `{}`", aggregator.key);
        }

        let n = aggregators.len();
        Aggregators {
            aggregators,
            index,
            current: Mutex::new(vec![None; n]),
            previous: vec![None; n],
        }
    }

    pub(crate) fn local_values(&self) -> Vec<Option<f64>> {
        vec![None; self.aggregators.len()]
    }

    pub(crate) fn fold(&self, local: &mut [Option<f64>], key: &str, value: f64) {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => panic!("unknown aggregator `{}`", key),
        };
        local[i] = Some(match local[i] {
            Some(acc) => self.aggregators[i].combiner.combine(acc, value),
            None => value,
        });
    }

    /// Merges one partition's contributions into the superstep total.
    pub(crate) fn merge(&self, local: Vec<Option<f64>>) {
        if local.iter().all(Option::is_none) {
            return;
        }

        let mut current = self.current.lock();
        for (i, value) in local.into_iter().enumerate() {
            if let Some(value) = value {
                current[i] = Some(match current[i] {
                    Some(acc) => self.aggregators[i].combiner.combine(acc, value),
                    None => value,
                });
            }
        }
    }

    /// Publishes the totals of the finished superstep and starts collecting afresh.
    pub(crate) fn advance(&mut self) {
        let fresh = vec![None; self.aggregators.len()];
        self.previous = std::mem::replace(self.current.get_mut(), fresh);
    }

    pub(crate) fn value(&self, key: &str) -> Option<f64> {
        self.index.get(key).and_then(|&i| self.previous[i])
    }

    pub(crate) fn values(&self) -> FxHashMap<String, f64> {
        self.aggregators
            .iter()
            .zip(&self.previous)
            .filter_map(|(aggregator, value)| value.map(|v| (aggregator.key.clone(), v)))
            .collect()
    }
}
