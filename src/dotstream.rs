/*
 * dotstream.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte, a cross-platform email client.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Dot-stuffing codec (RFC 5321 §4.5.2 / RFC 977) for payloads interleaved
//! with the control channel: SMTP DATA, NNTP ARTICLE/POST/IHAVE/XOVER/LIST.
//!
//! [`DotStreamWriter`] is the teacher's `DotStuffer` (see
//! `protocol/smtp/dot_stuffer.rs`) generalized into something that owns the
//! transport and can `close()` it back to the control channel.
//! [`DotStreamReader`] is its read-side mirror, line-oriented because the
//! unstuffing rule (`..` at line start → `.`) only makes sense per line.

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Reads a dot-terminated payload off a control stream, unstuffing leading
/// `..` to `.` and stopping at a lone `.` line. After [`DotStreamReader::read_line`]
/// returns `Ok(None)` the control channel is available again; the reader
/// holds only a `&mut` borrow so there's nothing further to release.
pub struct DotStreamReader<'a, R> {
    reader: &'a mut BufReader<R>,
    done: bool,
}

impl<'a, R> DotStreamReader<'a, R>
where
    R: tokio::io::AsyncRead + Unpin,
{
    pub fn new(reader: &'a mut BufReader<R>) -> Self {
        Self { reader, done: false }
    }

    /// Read one unstuffed payload line (without the trailing CRLF), or
    /// `None` once the lone `.` terminator has been consumed.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        if self.done {
            return Ok(None);
        }
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf).await?;
        if n == 0 {
            self.done = true;
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed mid-payload",
            ));
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        if buf == "." {
            self.done = true;
            return Ok(None);
        }
        let line = if let Some(rest) = buf.strip_prefix("..") {
            format!(".{rest}")
        } else {
            buf
        };
        Ok(Some(line))
    }

    /// Drain the remaining payload into one string, joining lines with `\n`.
    pub async fn read_to_string(&mut self) -> std::io::Result<String> {
        let mut out = String::new();
        while let Some(line) = self.read_line().await? {
            if !out.is_empty() {
                out.push_str("\r\n");
            }
            out.push_str(&line);
        }
        Ok(out)
    }
}

/// Dot-stuffing state machine for the write side: any line starting with
/// `.` gets an extra `.` prepended on the wire, CRs/LFs are normalized to
/// CRLF (NETASCII), and `close()` emits the `\r\n.\r\n` terminator.
#[derive(Clone, Copy, PartialEq)]
enum StuffState {
    LineStart,
    Normal,
    SawCr,
}

/// Write half of the dot-stuffing codec. Borrows the underlying writer so
/// `close()` can hand the control channel straight back to the caller
/// without closing the socket.
pub struct DotStreamWriter<'a, W> {
    writer: &'a mut W,
    state: StuffState,
    wrote_any: bool,
    closed: bool,
}

impl<'a, W> DotStreamWriter<'a, W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            state: StuffState::LineStart,
            wrote_any: false,
            closed: false,
        }
    }

    /// Write a chunk of payload bytes, stuffing and CRLF-normalizing as needed.
    pub async fn write(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        let mut out = Vec::with_capacity(chunk.len() + 4);
        let mut start = 0usize;
        for (i, &b) in chunk.iter().enumerate() {
            match self.state {
                StuffState::LineStart => {
                    if b == b'.' {
                        out.extend_from_slice(&chunk[start..i]);
                        out.push(b'.');
                        start = i;
                    }
                    self.state = if b == b'\r' { StuffState::SawCr } else { StuffState::Normal };
                }
                StuffState::Normal => {
                    if b == b'\r' {
                        self.state = StuffState::SawCr;
                    } else if b == b'\n' {
                        // bare LF: insert a CR before it.
                        out.extend_from_slice(&chunk[start..i]);
                        out.push(b'\r');
                        start = i;
                        self.state = StuffState::LineStart;
                    }
                }
                StuffState::SawCr => {
                    self.state = if b == b'\n' {
                        StuffState::LineStart
                    } else if b == b'\r' {
                        StuffState::SawCr
                    } else {
                        // CR not followed by LF: insert one.
                        out.extend_from_slice(&chunk[start..i]);
                        out.push(b'\n');
                        start = i;
                        StuffState::Normal
                    };
                }
            }
        }
        if start < chunk.len() {
            self.wrote_any = true;
            out.extend_from_slice(&chunk[start..]);
        }
        if !out.is_empty() {
            self.writer.write_all(&out).await?;
        }
        Ok(())
    }

    /// Emit the `\r\n.\r\n` terminator (normalizing any partial final line
    /// first) and flush. Does NOT close the underlying socket.
    pub async fn close(mut self) -> std::io::Result<()> {
        self.close_mut().await
    }

    async fn close_mut(&mut self) -> std::io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let terminator: &[u8] = match self.state {
            StuffState::LineStart if self.wrote_any => b".\r\n",
            StuffState::SawCr => b"\n.\r\n",
            _ => b"\r\n.\r\n",
        };
        self.writer.write_all(terminator).await?;
        self.writer.flush().await?;
        self.state = StuffState::LineStart;
        self.wrote_any = false;
        Ok(())
    }
}

impl<'a, W> Drop for DotStreamWriter<'a, W> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!("DotStreamWriter dropped without calling close(); payload was not terminated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn reader_unstuffs_and_stops_at_lone_dot() {
        let (mut client, mut server) = duplex(256);
        tokio::spawn(async move {
            server.write_all(b"Hi.\r\n..bar\r\n.\r\n").await.unwrap();
        });
        let mut buf = BufReader::new(&mut client);
        let mut reader = DotStreamReader::new(&mut buf);
        assert_eq!(reader.read_line().await.unwrap(), Some("Hi.".to_string()));
        assert_eq!(reader.read_line().await.unwrap(), Some(".bar".to_string()));
        assert_eq!(reader.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn writer_stuffs_leading_dot_and_terminates() {
        let (mut client, mut server) = duplex(256);
        let collected = tokio::spawn(async move {
            let mut out = Vec::new();
            server.read_to_end(&mut out).await.unwrap();
            out
        });
        {
            let mut writer = DotStreamWriter::new(&mut client);
            writer.write(b"Hi.\r\n.bar").await.unwrap();
            writer.close().await.unwrap();
        }
        drop(client);
        let out = collected.await.unwrap();
        assert_eq!(out, b"Hi.\r\n..bar\r\n.\r\n");
    }

    #[tokio::test]
    async fn round_trip_is_right_inverse() {
        let payload = b"Line one\r\n.leading dot\r\nLine three";
        let (mut client, mut server) = duplex(512);
        let collected = tokio::spawn(async move {
            let mut out = Vec::new();
            server.read_to_end(&mut out).await.unwrap();
            out
        });
        {
            let mut writer = DotStreamWriter::new(&mut client);
            writer.write(payload).await.unwrap();
            writer.close().await.unwrap();
        }
        drop(client);
        let wire = collected.await.unwrap();

        let (mut rclient, mut rserver) = duplex(512);
        tokio::spawn(async move {
            rserver.write_all(&wire).await.unwrap();
        });
        let mut buf = BufReader::new(&mut rclient);
        let mut reader = DotStreamReader::new(&mut buf);
        let decoded = reader.read_to_string().await.unwrap();
        assert_eq!(decoded, "Line one\r\n.leading dot\r\nLine three");
    }

    #[tokio::test]
    async fn empty_message_terminates_with_bare_crlf_dot() {
        let (mut client, mut server) = duplex(64);
        let collected = tokio::spawn(async move {
            let mut out = Vec::new();
            server.read_to_end(&mut out).await.unwrap();
            out
        });
        {
            let writer = DotStreamWriter::new(&mut client);
            writer.close().await.unwrap();
        }
        drop(client);
        let out = collected.await.unwrap();
        assert_eq!(out, b"\r\n.\r\n");
    }
}
