//! Line-delimited JSON transport for bus messages

use std::future::Future;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use crate::error::{ConnectionError, Result};

use super::client::BusClient;
use super::messages::BusMessage;

/// Transport trait for exchanging bus messages
pub trait Transport: Send {
    /// Write one message
    ///
    /// # Errors
    /// Returns error if the write fails or the transport is closed
    fn write(&mut self, message: &BusMessage) -> impl Future<Output = Result<()>> + Send;

    /// Start reading messages
    ///
    /// Spawns a background reader. The receiver closes when the input ends.
    /// Lines that fail to parse are reported as errors without ending the stream.
    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<BusMessage>>;

    /// Flush and close the output side
    ///
    /// # Errors
    /// Returns error if closing fails
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Newline-delimited JSON over any async reader/writer pair
pub struct LineTransport<R, W> {
    reader: Option<R>,
    writer: Option<W>,
    max_line_bytes: usize,
    reader_task: Option<JoinHandle<()>>,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a transport over `reader` and `writer`
    pub fn new(reader: R, writer: W, max_line_bytes: usize) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            max_line_bytes,
            reader_task: None,
        }
    }
}

impl LineTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Transport over the process stdin/stdout
    #[must_use]
    pub fn stdio(max_line_bytes: usize) -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), max_line_bytes)
    }
}

impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, message: &BusMessage) -> Result<()> {
        let line = BusClient::serialize_message(message)?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ConnectionError::bus("Transport output is closed"))?;

        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ConnectionError::bus(format!("Failed to write message: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| ConnectionError::bus(format!("Failed to flush message: {e}")))?;
        Ok(())
    }

    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<BusMessage>> {
        let (tx, rx) = mpsc::unbounded_channel();

        let Some(reader) = self.reader.take() else {
            let _ = tx.send(Err(ConnectionError::bus("Transport input already taken")));
            return rx;
        };
        let max_line_bytes = self.max_line_bytes;

        let task = tokio::spawn(async move {
            let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_bytes));

            let mut resume_after_error = false;

            loop {
                let Some(line) = lines.next().await else {
                    // The framed reader yields one None after a decode error
                    // and resumes on the next poll
                    if std::mem::take(&mut resume_after_error) {
                        continue;
                    }
                    break;
                };

                let parsed = match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => BusClient::deserialize_message(line.trim()),
                    Err(LinesCodecError::MaxLineLengthExceeded) => {
                        resume_after_error = true;
                        Err(ConnectionError::validation(format!(
                            "Bus message exceeded maximum size of {max_line_bytes} bytes"
                        )))
                    }
                    Err(LinesCodecError::Io(e)) => {
                        let _ = tx.send(Err(ConnectionError::Io(e)));
                        break;
                    }
                };

                if tx.send(parsed).is_err() {
                    // Receiver dropped, stop reading
                    break;
                }
            }
        });

        self.reader_task = Some(task);
        rx
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .shutdown()
                .await
                .map_err(|e| ConnectionError::bus(format!("Failed to close output: {e}")))?;
        }
        Ok(())
    }
}

impl<R, W> Drop for LineTransport<R, W> {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}
