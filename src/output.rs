//! Line-at-a-time output.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Line-buffered sink: every line is written in one go and flushed.
pub struct LineWriter<W> {
    inner: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
        }
    }

    pub async fn write_line(&mut self, line: &[u8]) -> Result<(), OutputError> {
        self.inner.write_all(line).await?;
        self.inner.flush().await?;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<W, OutputError> {
        self.inner.flush().await?;
        Ok(self.inner.into_inner())
    }
}
