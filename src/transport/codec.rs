//! Line codec for the wire protocol.
//!
//! Frame format:
//! ```text
//! ┌──────────────────────────────┬────┐
//! │   UTF-8 JSON (no newlines)   │ \n │
//! └──────────────────────────────┴────┘
//! ```
//! serde_json never emits a raw newline, so one line is exactly one message.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt};

/// Frame delimiter.
pub const DELIMITER: u8 = b'\n';

/// Write one message and flush.
///
/// The frame is assembled first so it reaches the writer in a single
/// `write_all`.
pub async fn write_message<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    message: &str,
) -> std::io::Result<()> {
    if message.as_bytes().contains(&DELIMITER) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "message contains a frame delimiter",
        ));
    }
    let mut frame = Vec::with_capacity(message.len() + 1);
    frame.extend_from_slice(message.as_bytes());
    frame.push(DELIMITER);
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one message from the stream.
///
/// Returns `None` on clean EOF. `max_message_bytes` caps the accepted
/// payload size (delimiter excluded); at most `max_message_bytes + 1` bytes
/// are buffered before an over-long frame is rejected.
pub async fn read_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_message_bytes: usize,
) -> std::io::Result<Option<String>> {
    let limit = (max_message_bytes as u64).saturating_add(1);
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(limit)
        .read_until(DELIMITER, &mut buf)
        .await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&DELIMITER) {
        buf.pop();
    } else if buf.len() as u64 >= limit {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Frame too large: over {} bytes", max_message_bytes),
        ));
    } else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stream ended inside a frame",
        ));
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
