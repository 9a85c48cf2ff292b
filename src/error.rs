use std::collections::TryReserveError;

#[derive(thiserror::Error, Debug)]
pub enum PregelError {
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Failed to allocate {what} for {node_count} nodes")]
    Allocation {
        what: &'static str,
        node_count: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("Failed to build the worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed edge at line {line}: {content:?}")]
    MalformedEdge { line: usize, content: String },
}

/// Allocates a vector of `len` elements, reporting allocation failure instead of aborting.
pub(crate) fn try_alloc<T>(
    what: &'static str,
    node_count: usize,
    len: usize,
    init: impl FnMut() -> T,
) -> Result<Vec<T>, PregelError> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|source| PregelError::Allocation {
            what,
            node_count,
            source,
        })?;
    values.resize_with(len, init);
    Ok(values)
}
