use log::{debug, info};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::{ChatError, Result};
use crate::protocol::{HandshakeOutcome, ProtocolConfig};

/// Client side of one chat connection.
pub struct ChatConnection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl ChatConnection {
    pub async fn open(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to {}", addr);

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(read_half).lines(),
            writer: write_half,
        })
    }

    /// Sends `username` and classifies the server's reply.
    pub async fn handshake(
        &mut self,
        username: &str,
        protocol: &ProtocolConfig,
    ) -> Result<HandshakeOutcome> {
        self.send_line(username).await?;

        let reply = self
            .next_line()
            .await?
            .ok_or(ChatError::ConnectionClosed)?;
        debug!("Handshake reply: {}", reply);

        Ok(protocol.classify(&reply))
    }

    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');

        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next line from the server, `None` once it has closed the connection.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    /// Forwards `input` lines to the server and server lines to `output`
    /// until either side reaches end of stream.
    pub async fn relay<R, W>(mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut input = BufReader::new(input).lines();

        loop {
            tokio::select! {
                incoming = self.lines.next_line() => match incoming? {
                    Some(line) => {
                        output.write_all(line.as_bytes()).await?;
                        output.write_all(b"\n").await?;
                        output.flush().await?;
                    }
                    None => {
                        info!("Server closed the connection");
                        break;
                    }
                },
                typed = input.next_line() => match typed? {
                    Some(line) => self.send_line(&line).await?,
                    None => {
                        debug!("Input closed, leaving chat");
                        self.writer.shutdown().await?;
                        break;
                    }
                },
            }
        }

        Ok(())
    }
}
