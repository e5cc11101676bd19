/*
 * mechanism.rs
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

//! SASL mechanism names and metadata.

/// Supported SASL mechanisms (client-side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaslMechanism {
    /// PLAIN (RFC 4616).
    Plain,
    /// Legacy LOGIN.
    Login,
    /// CRAM-MD5 (RFC 2195) – challenge-response.
    CramMd5,
    /// XOAUTH – OAuth bearer token, single-shot, no challenge rounds.
    XOAuth,
}

impl SaslMechanism {
    pub fn name(&self) -> &'static str {
        match self {
            SaslMechanism::Plain => "PLAIN",
            SaslMechanism::Login => "LOGIN",
            SaslMechanism::CramMd5 => "CRAM-MD5",
            SaslMechanism::XOAuth => "XOAUTH",
        }
    }

    /// True for mechanisms that exchange one or more server challenges
    /// before the exchange completes (as opposed to a single initial response).
    pub fn is_challenge_response(&self) -> bool {
        matches!(self, SaslMechanism::CramMd5 | SaslMechanism::Login)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "PLAIN" => Some(SaslMechanism::Plain),
            "LOGIN" => Some(SaslMechanism::Login),
            "CRAM-MD5" => Some(SaslMechanism::CramMd5),
            "XOAUTH" => Some(SaslMechanism::XOAuth),
            _ => None,
        }
    }
}

impl std::fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
