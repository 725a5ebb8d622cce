//! Trait abstraction for HID endpoint writes to enable testing

use async_trait::async_trait;
use std::io;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Trait for HID endpoint I/O operations
#[async_trait]
pub trait HidPortIO: Send {
    /// Write one complete report to the endpoint
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Wrapper around a `/dev/hidgN` character device that implements HidPortIO
#[derive(Debug)]
pub struct TokioHidPort {
    file: File,
}

impl TokioHidPort {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Open a gadget endpoint for writing
    pub async fn open(path: &str) -> io::Result<Self> {
        let file = OpenOptions::new().write(true).open(path).await?;
        Ok(Self::new(file))
    }
}

#[async_trait]
impl HidPortIO for TokioHidPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.file.flush().await
    }
}
