//! Blocking reader over remote file content.

use std::io::{self, Read};
use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use futures::StreamExt;
use rusty_bags_storage::{ByteStream, StorageError};

use crate::error::VfsError;
use crate::executor::AsyncExecutor;

/// `std::io::Read` over a blob storage byte stream.
///
/// Each refill runs on the background executor and pulls chunks until at
/// least `min_fetch` bytes are buffered or the stream ends.
pub struct ContentReader {
    executor: Arc<AsyncExecutor>,
    stream: Option<ByteStream>,
    buffer: Bytes,
    min_fetch: usize,
    location: String,
}

/// One refill: the stream (if not exhausted) and the bytes pulled from it.
type Refill = (Option<ByteStream>, Result<Bytes, StorageError>);

impl ContentReader {
    pub(crate) fn new(
        executor: Arc<AsyncExecutor>,
        stream: ByteStream,
        min_fetch: usize,
        location: String,
    ) -> Self {
        Self {
            executor,
            stream: Some(stream),
            buffer: Bytes::new(),
            min_fetch: min_fetch.max(1),
            location,
        }
    }

    /// Read the rest of the content into memory.
    pub fn read_to_vec(mut self) -> Result<Vec<u8>, VfsError> {
        let mut data: Vec<u8> = Vec::new();
        self.read_to_end(&mut data)?;
        Ok(data)
    }

    fn refill(&mut self) -> io::Result<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        let min_fetch: usize = self.min_fetch;

        let (stream, chunk): Refill = self
            .executor
            .block_on(async move {
                let mut stream: ByteStream = stream;
                let mut collected: BytesMut = BytesMut::new();

                while collected.len() < min_fetch {
                    match stream.next().await {
                        Some(Ok(chunk)) => collected.extend_from_slice(&chunk),
                        Some(Err(e)) => return (None, Err(e)),
                        None => return (None, Ok(collected.freeze())),
                    }
                }
                (Some(stream), Ok(collected.freeze()))
            })
            .map_err(VfsError::from)?;

        self.stream = stream;
        self.buffer = chunk.map_err(|e| VfsError::backend(self.location.clone(), e))?;
        Ok(())
    }
}

impl Read for ContentReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.buffer.is_empty() {
            if self.stream.is_none() {
                return Ok(0);
            }
            self.refill()?;
        }

        let n: usize = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer[..n]);
        self.buffer.advance(n);
        Ok(n)
    }
}

impl std::fmt::Debug for ContentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentReader")
            .field("location", &self.location)
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.stream.is_none())
            .finish()
    }
}
