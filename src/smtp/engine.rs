/*
 * engine.rs
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

//! The SMTP command/reply engine: EHLO/HELO, MAIL/RCPT/DATA, AUTH, STARTTLS,
//! and the trivial command wrappers (RSET/VRFY/EXPN/NOOP/…), all built atop
//! [`ReplyChannel`] and [`DotStreamWriter`].

use crate::dotstream::DotStreamWriter;
use crate::error::SmtpError;
use crate::reply::{Framing, ReplyChannel, ReplyCode, ReplyEnvelope};
use crate::sasl::{self, SaslFirst, SaslMechanism};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use super::codes;

/// An SMTP session over an already-connected transport. Generic over the
/// reader/writer halves so the same engine drives plain and TLS-upgraded
/// connections identically.
pub struct SmtpEngine<R, W> {
    channel: ReplyChannel<R, W>,
    data_open: bool,
}

impl<R, W> SmtpEngine<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            channel: ReplyChannel::new(reader, writer, Framing::MultiLine, codes::SERVICE_NOT_AVAILABLE),
            data_open: false,
        }
    }

    /// Read the server's opening greeting. A non-2xx greeting means the
    /// session never became ready; the caller should disconnect.
    pub async fn connect_handshake(&mut self) -> Result<ReplyEnvelope, SmtpError> {
        Ok(self.channel.read_reply().await?)
    }

    async fn command(&mut self, verb: &str, args: Option<&str>, glue: bool) -> Result<ReplyEnvelope, SmtpError> {
        self.channel.send_command(verb, args, glue).await?;
        Ok(self.channel.read_reply().await?)
    }

    /// HELO, returning the classified code.
    pub async fn helo(&mut self, host: &str) -> Result<ReplyCode, SmtpError> {
        Ok(self.command("HELO", Some(host), false).await?.code)
    }

    /// EHLO. Capability lines (STARTTLS, AUTH …, SIZE …) live in the
    /// returned envelope's `lines`.
    pub async fn ehlo(&mut self, host: &str) -> Result<ReplyEnvelope, SmtpError> {
        self.command("EHLO", Some(host), false).await
    }

    /// Alias for [`SmtpEngine::ehlo`] matching the ESMTP login terminology.
    pub async fn elogin(&mut self, host: &str) -> Result<ReplyEnvelope, SmtpError> {
        self.ehlo(host).await
    }

    /// `MAIL FROM:<reverse-path>`, no space after the colon.
    pub async fn mail(&mut self, reverse_path: &str) -> Result<bool, SmtpError> {
        let r = self.command("MAIL FROM:", Some(reverse_path), true).await?;
        Ok(r.code.is_positive_completion())
    }

    /// `RCPT TO:<forward-path>`, no space after the colon.
    pub async fn rcpt(&mut self, forward_path: &str) -> Result<bool, SmtpError> {
        let r = self.command("RCPT TO:", Some(forward_path), true).await?;
        Ok(r.code.is_positive_completion() || r.code.value() == 251 || r.code.value() == 252)
    }

    /// Convenience wrapper that wraps a bare address in angle brackets.
    pub async fn set_sender(&mut self, address: &str) -> Result<bool, SmtpError> {
        self.mail(&format!("<{address}>")).await
    }

    /// Convenience wrapper that wraps a bare address in angle brackets.
    pub async fn add_recipient(&mut self, address: &str) -> Result<bool, SmtpError> {
        self.rcpt(&format!("<{address}>")).await
    }

    /// Issue DATA. On positive-intermediate (354), returns a writer handing
    /// the stream over to the caller; otherwise the session stays in the
    /// command phase and no writer is returned (ProtocolDenied → `Ok(None)`).
    pub async fn data(&mut self) -> Result<Option<DotStreamWriter<'_, W>>, SmtpError> {
        if self.data_open {
            return Err(SmtpError::StreamAlreadyOpen);
        }
        let r = self.command("DATA", None, false).await?;
        if r.code.is_positive_intermediate() {
            self.data_open = true;
            Ok(Some(DotStreamWriter::new(self.channel.writer_mut())))
        } else {
            Ok(None)
        }
    }

    /// Pull the final reply after the caller has closed a handed-over
    /// DATA writer. Returns whether the message was accepted.
    pub async fn complete_pending_command(&mut self) -> Result<bool, SmtpError> {
        self.data_open = false;
        let r = self.channel.read_reply().await?;
        Ok(r.code.is_positive_completion())
    }

    pub async fn rset(&mut self) -> Result<bool, SmtpError> {
        Ok(self.command("RSET", None, false).await?.code.is_positive_completion())
    }

    pub async fn vrfy(&mut self, user: &str) -> Result<ReplyEnvelope, SmtpError> {
        self.command("VRFY", Some(user), false).await
    }

    pub async fn expn(&mut self, list: &str) -> Result<ReplyEnvelope, SmtpError> {
        self.command("EXPN", Some(list), false).await
    }

    pub async fn noop(&mut self) -> Result<bool, SmtpError> {
        Ok(self.command("NOOP", None, false).await?.code.is_positive_completion())
    }

    pub async fn send(&mut self, reverse_path: &str) -> Result<bool, SmtpError> {
        let r = self.command("SEND FROM:", Some(reverse_path), true).await?;
        Ok(r.code.is_positive_completion())
    }

    pub async fn soml(&mut self, reverse_path: &str) -> Result<bool, SmtpError> {
        let r = self.command("SOML FROM:", Some(reverse_path), true).await?;
        Ok(r.code.is_positive_completion())
    }

    pub async fn saml(&mut self, reverse_path: &str) -> Result<bool, SmtpError> {
        let r = self.command("SAML FROM:", Some(reverse_path), true).await?;
        Ok(r.code.is_positive_completion())
    }

    pub async fn turn(&mut self) -> Result<bool, SmtpError> {
        Ok(self.command("TURN", None, false).await?.code.is_positive_completion())
    }

    pub async fn help(&mut self, command: Option<&str>) -> Result<ReplyEnvelope, SmtpError> {
        self.command("HELP", command, false).await
    }

    pub async fn quit(&mut self) -> Result<bool, SmtpError> {
        Ok(self.command("QUIT", None, false).await?.code.is_positive_completion())
    }

    /// `STARTTLS`. On success the caller must take the streams apart with
    /// [`SmtpEngine::into_parts`], upgrade them via the `net` module's
    /// [`crate::net::PlainStream::upgrade_to_tls`], and build a fresh engine
    /// over the resulting TLS stream.
    pub async fn exec_tls(&mut self) -> Result<bool, SmtpError> {
        Ok(self.command("STARTTLS", None, false).await?.code.is_positive_completion())
    }

    /// `AUTH <mechanism>` followed by the relevant challenge/response round
    /// trip. Returns true iff the final reply is positive-completion; XOAUTH
    /// is also accepted on a positive-intermediate reply since that
    /// mechanism hands off completion to an external flow.
    pub async fn auth(&mut self, mechanism: SaslMechanism, authcid: &str, password: &str) -> Result<bool, SmtpError> {
        let first = sasl::initial_client_response(mechanism, "", authcid, password)
            .map_err(|e| SmtpError::Auth(e.to_string()))?;

        let (initial_arg, awaiting_challenge) = match &first {
            SaslFirst::Done(bytes) => (Some(sasl::encode_base64(bytes)), false),
            SaslFirst::AwaitChallenge(bytes) if bytes.is_empty() => (None, true),
            SaslFirst::AwaitChallenge(bytes) => (Some(sasl::encode_base64(bytes)), true),
        };

        let cmd_args = match &initial_arg {
            Some(b64) => format!("{} {b64}", mechanism.name()),
            None => mechanism.name().to_string(),
        };
        let mut r = self.command("AUTH", Some(&cmd_args), false).await?;

        if mechanism == SaslMechanism::XOAuth && !awaiting_challenge {
            return Ok(r.code.is_positive_completion() || r.code.is_positive_intermediate());
        }

        loop {
            if r.code.value() == codes::AUTH_SUCCESSFUL {
                return Ok(true);
            }
            if r.code.value() != codes::AUTH_CONTINUE {
                return Ok(false);
            }
            let challenge = r.message().to_string();
            let response = sasl::respond_to_challenge(mechanism, &challenge, authcid, password)
                .map_err(|e| SmtpError::Auth(e.to_string()))?;
            let reply_b64 = sasl::encode_base64(&response);
            self.channel.send_command(&reply_b64, None, false).await?;
            r = self.channel.read_reply().await?;
        }
    }

    /// Send a message body with no envelope setup beyond what the caller has
    /// already issued (MAIL/RCPT), via DATA.
    pub async fn send_short_message(&mut self, body: &[u8]) -> Result<bool, SmtpError> {
        let Some(mut writer) = self.data().await? else {
            return Ok(false);
        };
        writer.write(body).await?;
        writer.close().await?;
        self.complete_pending_command().await
    }

    /// Compose MAIL, one RCPT per recipient, and DATA into a single call.
    pub async fn send_simple_message(
        &mut self,
        sender: &str,
        recipients: &[&str],
        body: &[u8],
    ) -> Result<bool, SmtpError> {
        if !self.set_sender(sender).await? {
            return Ok(false);
        }
        for recipient in recipients {
            if !self.add_recipient(recipient).await? {
                return Ok(false);
            }
        }
        self.send_short_message(body).await
    }

    /// Parse the `X.Y.Z` enhanced status code leading the last reply's
    /// message, if present (RFC 3463).
    pub fn enhanced_reply_code(&self) -> Option<(u16, u16, u16)> {
        let text = self.channel.last_reply_text();
        let message = text.lines().last()?;
        let body = message.get(4..)?;
        let mut parts = body.split_whitespace().next()?.splitn(3, '.');
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        Some((x, y, z))
    }

    pub fn last_reply_code(&self) -> Option<ReplyCode> {
        self.channel.last_reply_code()
    }

    pub fn last_reply_lines(&self) -> &[String] {
        self.channel.last_reply_lines()
    }

    pub fn last_reply_text(&self) -> &str {
        self.channel.last_reply_text()
    }

    /// Split into the raw reader/writer halves, e.g. to upgrade to TLS after
    /// a successful STARTTLS.
    pub fn into_parts(self) -> (BufReader<R>, W) {
        self.channel.into_parts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn basic_send_produces_expected_wire_sequence() {
        let (client, mut server) = duplex(4096);
        let (r, w) = tokio::io::split(client);
        let mut engine = SmtpEngine::new(r, w);

        let collected = tokio::spawn(async move {
            let mut out = Vec::new();
            loop {
                let mut buf = [0u8; 256];
                let n = server.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                out.extend_from_slice(&buf[..n]);
                if out.ends_with(b"QUIT\r\n") {
                    server.write_all(b"221 bye\r\n").await.unwrap();
                    break;
                }
                if out.ends_with(b"HELO relay.example\r\n") {
                    server.write_all(b"250 Hello\r\n").await.unwrap();
                } else if out.ends_with(b"MAIL FROM:<a@ex>\r\n") {
                    server.write_all(b"250 OK\r\n").await.unwrap();
                } else if out.ends_with(b"RCPT TO:<b@ex>\r\n") {
                    server.write_all(b"250 OK\r\n").await.unwrap();
                } else if out.ends_with(b"DATA\r\n") {
                    server.write_all(b"354 go\r\n").await.unwrap();
                } else if out.ends_with(b"\r\n.\r\n") {
                    server.write_all(b"250 queued\r\n").await.unwrap();
                }
            }
            out
        });

        assert_eq!(engine.helo("relay.example").await.unwrap().value(), 250);
        assert!(engine.set_sender("a@ex").await.unwrap());
        assert!(engine.add_recipient("b@ex").await.unwrap());
        assert!(engine.send_short_message(b"Hi.\r\n.bar").await.unwrap());
        assert!(engine.quit().await.unwrap());

        let wire = collected.await.unwrap();
        assert_eq!(
            wire,
            b"HELO relay.example\r\nMAIL FROM:<a@ex>\r\nRCPT TO:<b@ex>\r\nDATA\r\nHi.\r\n..bar\r\n\r\n.\r\nQUIT\r\n"
        );
    }

    #[tokio::test]
    async fn ehlo_exposes_capability_lines() {
        let (client, mut server) = duplex(1024);
        let (r, w) = tokio::io::split(client);
        let mut engine = SmtpEngine::new(r, w);
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            let _ = server.read(&mut buf).await.unwrap();
            server
                .write_all(b"250-relay.example Hello\r\n250-SIZE 10485760\r\n250 AUTH PLAIN LOGIN\r\n")
                .await
                .unwrap();
        });
        let r = engine.ehlo("relay.example").await.unwrap();
        assert_eq!(r.code.value(), 250);
        assert_eq!(r.lines.len(), 3);
        assert_eq!(r.lines[2], "AUTH PLAIN LOGIN");
    }

    #[tokio::test]
    async fn cram_md5_auth_sends_expected_challenge_response() {
        use base64::Engine as _;

        let (client, mut server) = duplex(1024);
        let (r, w) = tokio::io::split(client);
        let mut engine = SmtpEngine::new(r, w);

        let server_task = tokio::spawn(async move {
            let mut buf = vec![0u8; 512];
            let n = server.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"AUTH CRAM-MD5\r\n");
            server
                .write_all(b"334 PDEyMzQ1QGV4PgE=\r\n")
                .await
                .unwrap();
            let n = server.read(&mut buf).await.unwrap();
            server.write_all(b"235 Authenticated\r\n").await.unwrap();
            String::from_utf8_lossy(&buf[..n]).trim_end().to_string()
        });

        let ok = engine
            .auth(SaslMechanism::CramMd5, "user", "secret")
            .await
            .unwrap();
        assert!(ok);
        let sent = server_task.await.unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(&sent).unwrap();
        let response = String::from_utf8(decoded).unwrap();
        // HMAC-MD5(key="secret", msg="<12345@ex>\x01") hex-encoded, per the
        // scenario's literal challenge bytes.
        let digest = crate::sasl::respond_to_challenge(
            SaslMechanism::CramMd5,
            "PDEyMzQ1QGV4PgE=",
            "user",
            "secret",
        )
        .unwrap();
        assert_eq!(response.as_bytes(), digest.as_slice());
    }
}
