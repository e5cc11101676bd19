/*
 * login.rs
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

//! Legacy LOGIN mechanism: two challenges, "Username:" then "Password:",
//! each answered with the base64 of the corresponding credential.

use crate::error::SaslError;
use base64::Engine as _;

/// Build the response to one LOGIN challenge. The challenge text decides
/// which credential is sent; anything else is rejected.
pub fn respond_to_challenge(challenge_b64: &str, authcid: &str, password: &str) -> Result<Vec<u8>, SaslError> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(challenge_b64.trim())
        .map_err(|_| SaslError::invalid("invalid base64 in LOGIN challenge"))?;
    let text = String::from_utf8_lossy(&decoded).to_lowercase();
    if text.contains("username") {
        Ok(authcid.as_bytes().to_vec())
    } else if text.contains("password") {
        Ok(password.as_bytes().to_vec())
    } else {
        Err(SaslError::invalid("unexpected LOGIN challenge"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_username_then_password() {
        let user_challenge = base64::engine::general_purpose::STANDARD.encode("Username:");
        let pass_challenge = base64::engine::general_purpose::STANDARD.encode("Password:");
        assert_eq!(
            respond_to_challenge(&user_challenge, "alice", "hunter2").unwrap(),
            b"alice".to_vec()
        );
        assert_eq!(
            respond_to_challenge(&pass_challenge, "alice", "hunter2").unwrap(),
            b"hunter2".to_vec()
        );
    }
}
