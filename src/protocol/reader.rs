//! Bounded line reader
//!
//! Frames inbound bytes into lines with a hard ceiling on how much of one
//! line is ever buffered. A line over the ceiling is reported once and the
//! rest of it is discarded up to the next newline.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

use crate::error::Result;

/// Longest UTF-8 encoding of one `char`.
const MAX_UTF8_BYTES: usize = 4;

/// One framed inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    /// Line text without its `\n` or `\r\n`.
    Text(String),
    /// The line exceeded the byte ceiling and was dropped.
    TooLong,
}

/// Reads `\n`-terminated lines from `R` without unbounded buffering.
///
/// `next_line` is cancel-safe: partial input stays in the internal buffer.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    buffer: BytesMut,
    codec: LinesCodec,
    eof: bool,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Ceiling of `max_bytes` per line.
    pub fn new(reader: R, max_bytes: usize) -> Self {
        Self {
            reader,
            buffer: BytesMut::new(),
            codec: LinesCodec::new_with_max_length(max_bytes),
            eof: false,
        }
    }

    /// Ceiling large enough for any line of `max_chars` characters.
    pub fn for_chars(reader: R, max_chars: usize) -> Self {
        Self::new(reader, max_chars.saturating_mul(MAX_UTF8_BYTES))
    }

    /// Next line, or `None` once the peer has closed and the buffer is drained.
    pub async fn next_line(&mut self) -> Result<Option<InboundLine>> {
        loop {
            let decoded = if self.eof {
                self.codec.decode_eof(&mut self.buffer)
            } else {
                self.codec.decode(&mut self.buffer)
            };

            match decoded {
                Ok(Some(line)) => return Ok(Some(InboundLine::Text(line))),
                Ok(None) if self.eof => return Ok(None),
                Ok(None) => {}
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    return Ok(Some(InboundLine::TooLong));
                }
                Err(LinesCodecError::Io(e)) => return Err(e.into()),
            }

            if self.reader.read_buf(&mut self.buffer).await? == 0 {
                self.eof = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn frames_lines_and_strips_endings() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut lines = LineReader::new(server, 32);

        client.write_all(b"alice\r\nhello\n").await.unwrap();
        drop(client);

        assert_eq!(
            lines.next_line().await.unwrap(),
            Some(InboundLine::Text("alice".to_string()))
        );
        assert_eq!(
            lines.next_line().await.unwrap(),
            Some(InboundLine::Text("hello".to_string()))
        );
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unterminated_tail_is_returned_at_eof() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut lines = LineReader::new(server, 32);

        client.write_all(b"bye").await.unwrap();
        drop(client);

        assert_eq!(
            lines.next_line().await.unwrap(),
            Some(InboundLine::Text("bye".to_string()))
        );
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn oversized_line_is_reported_without_waiting_for_newline() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut lines = LineReader::new(server, 16);

        // No newline and the peer stays open: the reader must not keep buffering.
        client.write_all(&[b'x'; 512]).await.unwrap();

        assert_eq!(lines.next_line().await.unwrap(), Some(InboundLine::TooLong));
        assert!(lines.buffer.len() <= 1024);
    }

    #[tokio::test]
    async fn reading_resumes_after_the_oversized_line() {
        let (mut client, server) = tokio::io::duplex(4096);
        let mut lines = LineReader::new(server, 16);

        client.write_all(&[b'x'; 2000]).await.unwrap();
        client.write_all(b"\nshort\n").await.unwrap();
        drop(client);

        assert_eq!(lines.next_line().await.unwrap(), Some(InboundLine::TooLong));
        assert_eq!(
            lines.next_line().await.unwrap(),
            Some(InboundLine::Text("short".to_string()))
        );
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[test]
    fn char_ceiling_covers_multibyte_text() {
        let (_client, server) = tokio::io::duplex(8);
        let lines = LineReader::for_chars(server, 10);
        assert_eq!(lines.codec.max_length(), 40);
    }
}
