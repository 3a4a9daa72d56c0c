use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Precondition violations surfaced by the engine.
///
/// Nothing here is an I/O failure: every variant means the caller broke a
/// contract, so none of them are retried or repaired internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Batch size of zero or no batches to run.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot schedule a batch from an empty pool")]
    EmptyPool,

    #[error("Duplicate item ID: {0}")]
    DuplicateItemId(String),

    #[error("Unknown item ID: {0}")]
    UnknownItemId(String),

    /// The scheduler was invoked after the final batch was submitted.
    #[error("All {total} batches have already been submitted")]
    SessionComplete { total: usize },

    /// Final results were requested while batches remain.
    #[error("Session incomplete: {submitted} of {total} batches submitted")]
    SessionIncomplete { submitted: usize, total: usize },

    #[error("No batch is live; call next_batch() before submitting")]
    NoLiveBatch,

    #[error("Selected item {0} is not part of the current batch")]
    SelectionOutsideBatch(String),

    #[error("Invalid tier bands: {0}")]
    InvalidTierBands(String),
}
