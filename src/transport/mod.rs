//! Transport seam.
//!
//! The dispatch core only needs "send one message on this connection".
//! Handshake, authentication and reading replies belong to whoever opened
//! the socket.

pub mod codec;

use async_trait::async_trait;
use std::fmt;
use tokio::io::AsyncWrite;

/// One open duplex channel to the controller, seen from the write side.
///
/// `send` takes `&mut self`: a transport is not safe for concurrent writes,
/// and [`Connection`](crate::dispatch::Connection) serializes access to it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Write one complete message.
    async fn send(&mut self, message: &str) -> std::io::Result<()>;
}

/// Newline-delimited JSON over any async writer (TCP stream, stdout, pipe).
pub struct LineTransport<W> {
    writer: W,
    frames_written: u64,
}

impl<W> LineTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> fmt::Debug for LineTransport<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineTransport")
            .field("frames_written", &self.frames_written)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<W> Transport for LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &str) -> std::io::Result<()> {
        codec::write_message(&mut self.writer, message).await?;
        self.frames_written += 1;
        Ok(())
    }
}
