use super::Record;
use anyhow::Result;

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);

    /// Persists the records written so far.
    ///
    /// The trainer calls this method on every exit path of the training loop.
    fn flush(&mut self) -> Result<()>;
}
