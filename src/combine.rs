use std::ops::Add;

/// Associative reduction applied to messages (or aggregated values) sharing a target.
pub trait Combine<M>: Send + Sync {
    fn combine(&self, a: M, b: M) -> M;
}

impl<M, F> Combine<M> for F
where
    F: Fn(M, M) -> M + Send + Sync,
{
    fn combine(&self, a: M, b: M) -> M {
        self(a, b)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SumCombiner;

impl<M: Add<Output = M>> Combine<M> for SumCombiner {
    fn combine(&self, a: M, b: M) -> M {
        a + b
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinCombiner;

impl<M: PartialOrd> Combine<M> for MinCombiner {
    fn combine(&self, a: M, b: M) -> M {
        if b < a {
            b
        } else {
            a
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxCombiner;

impl<M: PartialOrd> Combine<M> for MaxCombiner {
    fn combine(&self, a: M, b: M) -> M {
        if b > a {
            b
        } else {
            a
        }
    }
}
