//! DataSink trait - writer collaborator interface
//!
//! Sinks receive merged rows as `Frame`s whose columns are already in output
//! order. A one-shot write is a single `write` followed by `close`; streaming
//! runs call `write` once per file.

use crate::{ContractError, Frame};

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append rows; the first call also emits the header
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &Frame) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
