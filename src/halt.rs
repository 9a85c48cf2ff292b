use crate::error::try_alloc;
use crate::PregelError;

use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = 64;

/// One bit per node, set when the node voted to halt.
pub struct HaltBits {
    node_count: usize,
    words: Box<[AtomicU64]>,
}

impl HaltBits {
    pub fn new(node_count: usize) -> Result<Self, PregelError> {
        let words = try_alloc(
            "halt bits",
            node_count,
            node_count.div_ceil(WORD_BITS),
            || AtomicU64::new(0),
        )?;

        Ok(HaltBits {
            node_count,
            words: words.into_boxed_slice(),
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    fn locate(&self, node: usize) -> (&AtomicU64, u64) {
        assert!(
            node < self.node_count,
            "node id {} out of range for {} nodes",
            node,
            self.node_count
        );
        (&self.words[node / WORD_BITS], 1_u64 << (node % WORD_BITS))
    }

    pub fn set_halted(&self, node: usize) {
        let (word, mask) = self.locate(node);
        word.fetch_or(mask, Ordering::Relaxed);
    }

    pub fn clear_halted(&self, node: usize) {
        let (word, mask) = self.locate(node);
        word.fetch_and(!mask, Ordering::Relaxed);
    }

    pub fn is_halted(&self, node: usize) -> bool {
        let (word, mask) = self.locate(node);
        word.load(Ordering::Relaxed) & mask != 0
    }

    /// Whether every node has voted to halt.
    ///
    /// Takes `&mut self` so the check can only happen while no worker holds the bits, that is
    /// strictly between supersteps.
    pub fn all_halted(&mut self) -> bool {
        let full_words = self.node_count / WORD_BITS;
        let rest = self.node_count % WORD_BITS;

        if !self.words[..full_words]
            .iter_mut()
            .all(|word| *word.get_mut() == u64::MAX)
        {
            return false;
        }

        rest == 0 || *self.words[full_words].get_mut() == (1_u64 << rest) - 1
    }

    pub fn halted_count(&mut self) -> usize {
        self.words
            .iter_mut()
            .map(|word| word.get_mut().count_ones() as usize)
            .sum()
    }

    pub fn clear_all(&mut self) {
        for word in self.words.iter_mut() {
            *word.get_mut() = 0;
        }
    }
}
