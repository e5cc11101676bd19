/*
 * cram_md5.rs
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

//! CRAM-MD5 (RFC 2195): the server sends a base64 challenge string, the
//! client responds with `authcid HMAC-MD5(password, challenge)` in hex.

use crate::error::SaslError;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use md5::Md5;

type HmacMd5 = Hmac<Md5>;

/// Build the response to a CRAM-MD5 challenge.
pub fn respond_to_challenge(challenge_b64: &str, authcid: &str, password: &str) -> Result<Vec<u8>, SaslError> {
    let challenge = base64::engine::general_purpose::STANDARD
        .decode(challenge_b64.trim())
        .map_err(|_| SaslError::invalid("invalid base64 in CRAM-MD5 challenge"))?;
    let mut mac = HmacMd5::new_from_slice(password.as_bytes())
        .map_err(|_| SaslError::invalid("HMAC key setup failed"))?;
    mac.update(&challenge);
    let digest = mac.finalize().into_bytes();
    let hex_digest = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    Ok(format!("{authcid} {hex_digest}").into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 2195 §3 worked example: shared secret "tanstaaftanstaaf",
    // challenge "<1896.697170952@postoffice.reston.mci.net>".
    #[test]
    fn matches_rfc2195_worked_example() {
        let challenge = base64::engine::general_purpose::STANDARD
            .encode("<1896.697170952@postoffice.reston.mci.net>");
        let response = respond_to_challenge(&challenge, "tim", "tanstaaftanstaaf").unwrap();
        assert_eq!(
            response,
            b"tim b913a602c7eda7a495b4e6e7334d3890".to_vec()
        );
    }
}
