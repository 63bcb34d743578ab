//! MemorySink - collects batches in memory

use std::sync::{Arc, Mutex};

use contracts::{ContractError, DataSink, Frame};

/// Sink that appends every batch to a shared frame.
///
/// Clones share the same buffer, so a clone kept by the caller can read what a sink
/// running on another task wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    name: String,
    frame: Arc<Mutex<Frame>>,
    batches: Arc<Mutex<usize>>,
    closed: Arc<Mutex<bool>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Copy of everything written so far
    pub fn frame(&self) -> Frame {
        match self.frame.lock() {
            Ok(frame) => frame.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of `write` calls received
    pub fn batches(&self) -> usize {
        self.batches.lock().map(|b| *b).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.lock().map(|c| *c).unwrap_or_default()
    }

    fn poisoned(&self) -> ContractError {
        ContractError::sink_write(&self.name, "buffer lock poisoned")
    }
}

impl DataSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, batch: &Frame) -> Result<(), ContractError> {
        self.frame
            .lock()
            .map_err(|_| self.poisoned())?
            .append(batch.clone());
        *self.batches.lock().map_err(|_| self.poisoned())? += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        *self.closed.lock().map_err(|_| self.poisoned())? = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Column;

    #[tokio::test]
    async fn test_clones_share_buffer() {
        let observer = MemorySink::new("memory");
        let mut sink = observer.clone();

        sink.write(&Frame::from_columns(vec![Column::from_f64("P1", &[1.0])]))
            .await
            .unwrap();
        sink.write(&Frame::from_columns(vec![Column::from_f64("P1", &[2.0, 3.0])]))
            .await
            .unwrap();
        sink.close().await.unwrap();

        assert_eq!(observer.batches(), 2);
        assert!(observer.is_closed());
        assert_eq!(
            observer.frame().column("P1").unwrap().to_f64(),
            vec![1.0, 2.0, 3.0]
        );
    }
}
