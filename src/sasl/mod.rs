/*
 * mod.rs
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

//! SASL client mechanisms shared by the SMTP and NNTP `auth` operations:
//! PLAIN, LOGIN, CRAM-MD5, XOAUTH. No server side, no realm negotiation.

mod cram_md5;
mod login;
mod mechanism;
mod plain;
mod xoauth;

pub use mechanism::SaslMechanism;
pub use plain::initial_response_plain;
pub use xoauth::xoauth_initial_response;

use crate::error::SaslError;
use base64::Engine as _;

/// Result of the first client step: either the exchange is already complete
/// (PLAIN, XOAUTH), or the server will reply with a 334 challenge next.
#[derive(Debug)]
pub enum SaslFirst {
    /// Send this base64 payload as the initial response; nothing more to do.
    Done(Vec<u8>),
    /// Send this base64 payload, then feed each subsequent challenge to
    /// [`respond_to_challenge`].
    AwaitChallenge(Vec<u8>),
}

/// Build the initial client response for the given mechanism. For LOGIN the
/// initial response is empty (the server leads with "Username:"); for
/// CRAM-MD5 there is no initial response at all, only a bare `AUTH CRAM-MD5`.
pub fn initial_client_response(
    mechanism: SaslMechanism,
    authzid: &str,
    authcid: &str,
    password: &str,
) -> Result<SaslFirst, SaslError> {
    match mechanism {
        SaslMechanism::Plain => {
            let bytes = initial_response_plain(authzid, authcid, password)?;
            Ok(SaslFirst::Done(bytes))
        }
        SaslMechanism::Login => Ok(SaslFirst::AwaitChallenge(Vec::new())),
        SaslMechanism::CramMd5 => Ok(SaslFirst::AwaitChallenge(Vec::new())),
        SaslMechanism::XOAuth => {
            let bytes = xoauth_initial_response(authcid, password);
            Ok(SaslFirst::Done(bytes))
        }
    }
}

/// Respond to one base64-encoded server challenge (the text of a 334 reply).
pub fn respond_to_challenge(
    mechanism: SaslMechanism,
    challenge_b64: &str,
    authcid: &str,
    password: &str,
) -> Result<Vec<u8>, SaslError> {
    match mechanism {
        SaslMechanism::CramMd5 => cram_md5::respond_to_challenge(challenge_b64, authcid, password),
        SaslMechanism::Login => login::respond_to_challenge(challenge_b64, authcid, password),
        SaslMechanism::Plain | SaslMechanism::XOAuth => {
            Err(SaslError::invalid("PLAIN/XOAUTH do not expect a server challenge"))
        }
    }
}

/// Base64-encode a SASL payload for the wire (`AUTH <mech> <base64>` / the
/// bare reply to a 334 challenge).
pub fn encode_base64(payload: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_initial_response_is_done() {
        let first = initial_client_response(SaslMechanism::Plain, "", "user", "pw").unwrap();
        assert!(matches!(first, SaslFirst::Done(_)));
    }

    #[test]
    fn login_and_cram_md5_await_a_challenge() {
        assert!(matches!(
            initial_client_response(SaslMechanism::Login, "", "user", "pw").unwrap(),
            SaslFirst::AwaitChallenge(_)
        ));
        assert!(matches!(
            initial_client_response(SaslMechanism::CramMd5, "", "user", "pw").unwrap(),
            SaslFirst::AwaitChallenge(_)
        ));
    }
}
