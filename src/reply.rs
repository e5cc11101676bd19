/*
 * reply.rs
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

//! Reply-framing substrate shared by the SMTP and NNTP engines: read
//! line-framed, code-prefixed responses off an `AsyncRead`, classify the
//! leading three-digit code, and write commands as `verb[ ]args\r\n`.
//!
//! SMTP multi-line replies (`250-text` continuations) and NNTP single-line
//! replies both funnel through [`ReplyChannel::read_reply`]; the dot-stuffed
//! payload phases (HELP text, article bodies, LIST output) are handled
//! separately by [`crate::dotstream`] once the caller has seen the 2xx/3xx
//! that introduces them.

use crate::error::FramingError;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// A three-digit reply code (100–599).
///
/// Classification is a pure function of the integer: exactly one of
/// [`ReplyCode::is_informational`], [`ReplyCode::is_positive_completion`],
/// [`ReplyCode::is_positive_intermediate`], [`ReplyCode::is_negative_transient`],
/// [`ReplyCode::is_negative_permanent`] is true for any valid code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(pub u16);

impl ReplyCode {
    pub fn is_informational(self) -> bool {
        (100..200).contains(&self.0)
    }

    pub fn is_positive_completion(self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_positive_intermediate(self) -> bool {
        (300..400).contains(&self.0)
    }

    pub fn is_negative_transient(self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_negative_permanent(self) -> bool {
        (500..600).contains(&self.0)
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete multi-line coded reply: the code, the text of each line (code
/// prefix and continuation marker stripped), and the raw bytes as seen on
/// the wire (CRLFs included) for diagnostics.
#[derive(Debug, Clone)]
pub struct ReplyEnvelope {
    pub code: ReplyCode,
    pub lines: Vec<String>,
    pub raw_text: String,
}

impl ReplyEnvelope {
    /// The last line's text — what callers usually mean by "the message".
    pub fn message(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or("")
    }
}

/// Which continuation rule applies when reading a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `DDD-text` continues; `DDD text` or bare `DDD` terminates. Used by SMTP.
    MultiLine,
    /// A single line always terminates the reply. Used by NNTP; multi-line
    /// payloads that follow a 2xx/3xx are read separately via dot-stream.
    SingleLine,
}

/// Read-and-write half of a protocol connection: parses replies per
/// [`Framing`], tracks the last reply for post-hoc inspection, and writes
/// commands with the `verb[ ]args` framing rule a caller selects per call.
pub struct ReplyChannel<R, W> {
    reader: BufReader<R>,
    writer: W,
    framing: Framing,
    service_closing_code: u16,
    last_reply: Option<ReplyEnvelope>,
}

impl<R, W> ReplyChannel<R, W>
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, framing: Framing, service_closing_code: u16) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            framing,
            service_closing_code,
            last_reply: None,
        }
    }

    /// Send `verb args\r\n`, or `verbargs\r\n` when `glue` is true (the SMTP
    /// `MAIL FROM:`/`RCPT TO:` framing constraint: no space between the
    /// colon-terminated verb and the path).
    pub async fn send_command(
        &mut self,
        verb: &str,
        args: Option<&str>,
        glue: bool,
    ) -> Result<(), FramingError> {
        let line = match args {
            None => verb.to_string(),
            Some(a) if glue => format!("{verb}{a}"),
            Some(a) => format!("{verb} {a}"),
        };
        tracing::debug!(command = %line, "sending command");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_line_raw(&mut self) -> Result<String, FramingError> {
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf).await?;
        if n == 0 {
            return Err(FramingError::ConnectionClosed);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(buf)
    }

    fn parse_code(line: &str) -> Result<(u16, bool, &str), FramingError> {
        if line.len() < 3 {
            return Err(FramingError::Malformed(format!(
                "reply shorter than three characters: {line:?}"
            )));
        }
        let code: u16 = line[..3]
            .parse()
            .map_err(|_| FramingError::Malformed(format!("non-numeric reply code: {line:?}")))?;
        let continuation = line.as_bytes().get(3) == Some(&b'-');
        let text = if line.len() > 4 { &line[4..] } else { "" };
        Ok((code, continuation, text))
    }

    /// Read one reply, applying the channel's [`Framing`] rule. Returns
    /// [`FramingError::ServerClosing`] (rather than a bare success) when the
    /// code equals this protocol's "service unavailable/discontinued" code,
    /// so callers that need to discriminate still see it as a framing error.
    pub async fn read_reply(&mut self) -> Result<ReplyEnvelope, FramingError> {
        let mut lines = Vec::new();
        let mut raw = String::new();
        let first = self.read_line_raw().await?;
        raw.push_str(&first);
        raw.push_str("\r\n");
        let (code, mut continuation, text) = Self::parse_code(&first)?;
        lines.push(text.to_string());

        if self.framing == Framing::MultiLine {
            while continuation {
                let line = self.read_line_raw().await?;
                raw.push_str(&line);
                raw.push_str("\r\n");
                let (_next_code, cont, text) = Self::parse_code(&line)?;
                lines.push(text.to_string());
                continuation = cont;
            }
        }

        let envelope = ReplyEnvelope {
            code: ReplyCode(code),
            lines,
            raw_text: raw,
        };
        tracing::debug!(code = code, message = envelope.message(), "received reply");
        self.last_reply = Some(envelope.clone());

        if code == self.service_closing_code {
            return Err(FramingError::ServerClosing {
                code,
                text: envelope.message().to_string(),
            });
        }
        Ok(envelope)
    }

    pub fn last_reply_code(&self) -> Option<ReplyCode> {
        self.last_reply.as_ref().map(|r| r.code)
    }

    pub fn last_reply_lines(&self) -> &[String] {
        self.last_reply.as_ref().map(|r| r.lines.as_slice()).unwrap_or(&[])
    }

    pub fn last_reply_text(&self) -> &str {
        self.last_reply.as_ref().map(|r| r.raw_text.as_str()).unwrap_or("")
    }

    /// Split into the raw reader/writer halves, e.g. to hand the transport
    /// over to a dot-stream reader/writer for a DATA/ARTICLE/POST payload.
    pub fn into_parts(self) -> (BufReader<R>, W) {
        (self.reader, self.writer)
    }

    pub fn reader_mut(&mut self) -> &mut BufReader<R> {
        &mut self.reader
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    async fn write_all(w: &mut (impl AsyncWrite + Unpin), s: &str) {
        w.write_all(s.as_bytes()).await.unwrap();
        w.flush().await.unwrap();
    }

    #[tokio::test]
    async fn single_line_reply_classifies() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut chan = ReplyChannel::new(r, w, Framing::SingleLine, 400);
        write_all(&mut server, "211 104 1 104 alt.example\r\n").await;
        let reply = chan.read_reply().await.unwrap();
        assert_eq!(reply.code.value(), 211);
        assert!(reply.code.is_positive_completion());
        assert_eq!(reply.lines, vec!["104 1 104 alt.example".to_string()]);
    }

    #[tokio::test]
    async fn multiline_smtp_reply_collects_all_lines() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut chan = ReplyChannel::new(r, w, Framing::MultiLine, 421);
        write_all(
            &mut server,
            "250-relay.example Hello\r\n250-SIZE 10485760\r\n250 AUTH PLAIN LOGIN\r\n",
        )
        .await;
        let reply = chan.read_reply().await.unwrap();
        assert_eq!(reply.code.value(), 250);
        assert_eq!(
            reply.lines,
            vec![
                "relay.example Hello".to_string(),
                "SIZE 10485760".to_string(),
                "AUTH PLAIN LOGIN".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn three_char_reply_is_well_formed() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut chan = ReplyChannel::new(r, w, Framing::SingleLine, 400);
        write_all(&mut server, "123\r\n").await;
        let reply = chan.read_reply().await.unwrap();
        assert_eq!(reply.code.value(), 123);
        assert_eq!(reply.lines, vec!["".to_string()]);
    }

    #[tokio::test]
    async fn short_reply_is_malformed() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut chan = ReplyChannel::new(r, w, Framing::SingleLine, 400);
        write_all(&mut server, "12\r\n").await;
        let err = chan.read_reply().await.unwrap_err();
        assert!(matches!(err, FramingError::Malformed(_)));
    }

    #[tokio::test]
    async fn service_closing_code_surfaces_distinctly() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut chan = ReplyChannel::new(r, w, Framing::SingleLine, 400);
        write_all(&mut server, "400 service discontinued\r\n").await;
        let err = chan.read_reply().await.unwrap_err();
        assert!(matches!(err, FramingError::ServerClosing { code: 400, .. }));
    }

    #[tokio::test]
    async fn mail_from_has_no_space_after_colon() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut chan = ReplyChannel::new(r, w, Framing::MultiLine, 421);
        chan.send_command("MAIL FROM:", Some("<a@ex>"), true).await.unwrap();
        let mut buf = vec![0u8; 64];
        let n = tokio::io::AsyncReadExt::read(&mut server, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"MAIL FROM:<a@ex>\r\n");
    }
}
