/*
 * config.rs
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

//! Small option-bag config structs, one per client, each with sensible
//! RFC-default `Default` impls rather than a builder-macro crate.

/// SMTP plain-connection defaults.
#[derive(Debug, Clone)]
pub struct SmtpClientConfig {
    pub encoding: &'static str,
    pub port: u16,
}

impl Default for SmtpClientConfig {
    fn default() -> Self {
        Self {
            encoding: "ISO-8859-1",
            port: 25,
        }
    }
}

/// SMTP-over-TLS connection defaults. `ctx`/`keyManager`/`trustManager` in
/// the source this is modeled on collapse to "use the process-wide
/// `rustls::ClientConfig`" built in [`crate::net`] — a pre-configured TLS
/// context is an out-of-scope collaborator here, not a field this struct
/// carries.
#[derive(Debug, Clone)]
pub struct SmtpsClientConfig {
    pub protocol: &'static str,
    pub implicit: bool,
    pub hostname_verification: bool,
    pub enabled_protocols: Vec<String>,
    pub enabled_cipher_suites: Vec<String>,
}

impl Default for SmtpsClientConfig {
    fn default() -> Self {
        Self {
            protocol: "TLS",
            implicit: false,
            hostname_verification: true,
            enabled_protocols: Vec::new(),
            enabled_cipher_suites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NntpClientConfig {
    pub port: u16,
}

impl Default for NntpClientConfig {
    fn default() -> Self {
        Self { port: 119 }
    }
}

#[derive(Debug, Clone)]
pub struct TelnetClientConfig {
    pub port: u16,
    pub terminal_type: String,
    pub ring_capacity: usize,
}

impl Default for TelnetClientConfig {
    fn default() -> Self {
        Self {
            port: 23,
            terminal_type: "VT100".to_string(),
            ring_capacity: crate::telnet::client::DEFAULT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rfc_assigned_ports() {
        assert_eq!(SmtpClientConfig::default().port, 25);
        assert_eq!(NntpClientConfig::default().port, 119);
        assert_eq!(TelnetClientConfig::default().port, 23);
    }
}
