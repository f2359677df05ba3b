//! Persistence collaborator and the sinks shipped with the core.

use std::io::Write;

use crate::batch::RuleBatch;
use crate::error::BoxError;

/// Receives one finished batch per imported year.
///
/// A batch is only ever delivered whole; failed years never reach the sink.
pub trait RuleSink {
    fn store(&mut self, batch: RuleBatch) -> Result<(), BoxError>;
}

/// Keeps every stored batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<RuleBatch>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleSink for MemorySink {
    fn store(&mut self, batch: RuleBatch) -> Result<(), BoxError> {
        self.batches.push(batch);
        Ok(())
    }
}

/// Writes each batch as a pretty-printed JSON document followed by a newline.
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RuleSink for JsonSink<W> {
    fn store(&mut self, batch: RuleBatch) -> Result<(), BoxError> {
        serde_json::to_writer_pretty(&mut self.writer, &batch)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
