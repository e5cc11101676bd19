/*
 * error.rs
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

//! Error taxonomy shared by the reply-framing substrate and the protocol engines.
//!
//! Mirrors the abstract kinds in the design: a transport failure tears the
//! connection down, a "service unavailable/discontinued" reply is a distinct
//! but still-transport-shaped failure, and a malformed reply leaves the
//! connection in an indeterminate state. Negative command replies are never
//! represented here — engines surface those as `Ok(false)` / `Ok(None)`.

use thiserror::Error;

/// Failures from the shared reply-framing / dot-stream substrate.
#[derive(Error, Debug)]
pub enum FramingError {
    /// The underlying transport broke; the connection is unusable.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection outside of a legitimate quit cycle.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The just-parsed reply carried the protocol's "service unavailable /
    /// discontinued" code (421 for SMTP, 400 for NNTP).
    #[error("server is closing the connection: {code} {text}")]
    ServerClosing { code: u16, text: String },

    /// The framing rules were violated: missing/non-numeric code, or a
    /// reply shorter than three characters.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl FramingError {
    /// True for any variant that leaves the connection unusable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FramingError::Malformed(_))
    }
}

/// SMTP engine errors. `Io`/`ConnectionClosed`/`ServiceUnavailable`/`Malformed`
/// are the same shapes as [`FramingError`], widened with an `Auth` variant for
/// SASL failures.
#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("server is closing the connection: {code} {text}")]
    ServiceUnavailable { code: u16, text: String },

    #[error("malformed reply: {0}")]
    Malformed(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("a handed-over stream (DATA) is already open on this connection")]
    StreamAlreadyOpen,
}

impl From<FramingError> for SmtpError {
    fn from(e: FramingError) -> Self {
        match e {
            FramingError::Io(e) => SmtpError::Io(e),
            FramingError::ConnectionClosed => SmtpError::ConnectionClosed,
            FramingError::ServerClosing { code, text } => {
                SmtpError::ServiceUnavailable { code, text }
            }
            FramingError::Malformed(s) => SmtpError::Malformed(s),
        }
    }
}

/// NNTP engine errors. Same shape as [`SmtpError`] minus auth-as-exception
/// (NNTP's AUTHINFO failures are reported as `Ok(false)` per §7).
#[derive(Error, Debug)]
pub enum NntpError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("server is closing the connection: {code} {text}")]
    ServiceDiscontinued { code: u16, text: String },

    #[error("malformed reply: {0}")]
    Malformed(String),

    #[error("a handed-over stream (ARTICLE/POST/IHAVE) is already open on this connection")]
    StreamAlreadyOpen,
}

impl From<FramingError> for NntpError {
    fn from(e: FramingError) -> Self {
        match e {
            FramingError::Io(e) => NntpError::Io(e),
            FramingError::ConnectionClosed => NntpError::ConnectionClosed,
            FramingError::ServerClosing { code, text } => {
                NntpError::ServiceDiscontinued { code, text }
            }
            FramingError::Malformed(s) => NntpError::Malformed(s),
        }
    }
}

/// Telnet errors: transport failure, or an invalid option-handler registration.
#[derive(Error, Debug)]
pub enum TelnetError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// `addOptionHandler`/`deleteOptionHandler` misuse: out-of-range code, or
    /// a handler already registered for this option.
    #[error("invalid telnet option: {0}")]
    InvalidOption(u16),
}

/// SASL mechanism failures (challenge decoding, unsupported mechanism, …).
#[derive(Error, Debug)]
pub enum SaslError {
    #[error("{0}")]
    Invalid(String),
}

impl SaslError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
