/*
 * lib.rs
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

//! Client-side implementations of three classic text-based Internet
//! protocols — SMTP (RFC 821/5321, ESMTP, STARTTLS, AUTH), NNTP (RFC 977
//! and the RFC 2980 extensions), and Telnet (RFC 854 option negotiation) —
//! built on a shared line-framed, code-prefixed, dot-terminated reply
//! substrate over `tokio`.
//!
//! [`smtp::SmtpEngine`] and [`nntp::NntpEngine`] are generic over any
//! `AsyncRead + AsyncWrite` transport, so the same engine type drives a
//! plain `TcpStream` or a TLS-upgraded one interchangeably; see [`net`]
//! for the STARTTLS/implicit-TLS collaborator this crate assumes.

pub mod config;
pub mod dotstream;
pub mod error;
pub mod net;
pub mod nntp;
pub mod reply;
pub mod sasl;
pub mod smtp;
pub mod telnet;

pub use dotstream::{DotStreamReader, DotStreamWriter};
pub use nntp::NntpEngine;
pub use reply::{Framing, ReplyChannel, ReplyCode, ReplyEnvelope};
pub use smtp::SmtpEngine;
