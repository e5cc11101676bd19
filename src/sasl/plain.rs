/*
 * plain.rs
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

//! PLAIN SASL (RFC 4616).

use crate::error::SaslError;

/// Build the PLAIN initial response: NUL authzid NUL authcid NUL password (UTF-8).
/// The caller base64-encodes this for the wire (e.g. SMTP `AUTH PLAIN <base64>`).
pub fn initial_response_plain(authzid: &str, authcid: &str, password: &str) -> Result<Vec<u8>, SaslError> {
    Ok(format!("\0{authzid}\0{authcid}\0{password}").into_bytes())
}

/// Parse PLAIN credentials (authzid NUL authcid NUL password), for tests and
/// for symmetry with the server-side reading the same wire format.
#[allow(dead_code)]
pub fn parse_plain_credentials(credentials: &[u8]) -> Result<(String, String, String), SaslError> {
    let mut first = None;
    let mut second = None;
    for (i, &b) in credentials.iter().enumerate() {
        if b == 0 {
            if first.is_none() {
                first = Some(i);
            } else {
                second = Some(i);
                break;
            }
        }
    }
    let (f, s) = first
        .and_then(|f| second.map(|s| (f, s)))
        .ok_or_else(|| SaslError::invalid("invalid PLAIN credentials format"))?;
    let authzid = String::from_utf8(credentials[..f].to_vec())
        .map_err(|_| SaslError::invalid("invalid PLAIN credentials format"))?;
    let authcid = String::from_utf8(credentials[f + 1..s].to_vec())
        .map_err(|_| SaslError::invalid("invalid PLAIN credentials format"))?;
    let password = String::from_utf8(credentials[s + 1..].to_vec())
        .map_err(|_| SaslError::invalid("invalid PLAIN credentials format"))?;
    Ok((authzid, authcid, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_parse() {
        let encoded = initial_response_plain("", "user@example.com", "hunter2").unwrap();
        let (authzid, authcid, password) = parse_plain_credentials(&encoded).unwrap();
        assert_eq!(authzid, "");
        assert_eq!(authcid, "user@example.com");
        assert_eq!(password, "hunter2");
    }
}
