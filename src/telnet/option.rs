/*
 * option.rs
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

//! Telnet option codes (RFC 854/855 assignments) and the per-option
//! negotiation state the negotiator tracks.

/// Well-known option codes (RFC 854/855 and the handful of extensions this
/// crate names explicitly; everything else is still a valid `u8`).
pub mod codes {
    pub const BINARY: u8 = 0;
    pub const ECHO: u8 = 1;
    pub const SUPPRESS_GO_AHEAD: u8 = 3;
    pub const STATUS: u8 = 5;
    pub const TIMING_MARK: u8 = 6;
    pub const TERMINAL_TYPE: u8 = 24;
    pub const END_OF_RECORD: u8 = 25;
    pub const NAWS: u8 = 31;
    pub const TERMINAL_SPEED: u8 = 32;
    pub const LINEMODE: u8 = 34;
    pub const NEW_ENVIRON: u8 = 39;
    pub const EXTENDED_OPTIONS_LIST: u8 = 255;
}

/// Name for a known option, or `"UNASSIGNED"` for any slot this table
/// doesn't carry an entry for (the source's option-name table has gaps
/// above ~49; unknown slots are reported this way rather than panicking).
pub fn option_name(code: u8) -> &'static str {
    use codes::*;
    match code {
        BINARY => "BINARY",
        ECHO => "ECHO",
        SUPPRESS_GO_AHEAD => "SUPPRESS-GO-AHEAD",
        STATUS => "STATUS",
        TIMING_MARK => "TIMING-MARK",
        TERMINAL_TYPE => "TERMINAL-TYPE",
        END_OF_RECORD => "END-OF-RECORD",
        NAWS => "NAWS",
        TERMINAL_SPEED => "TERMINAL-SPEED",
        LINEMODE => "LINEMODE",
        NEW_ENVIRON => "NEW-ENVIRON",
        EXTENDED_OPTIONS_LIST => "EXTENDED-OPTIONS-LIST",
        _ => "UNASSIGNED",
    }
}

/// Per-option negotiation state. `will_response`/`do_response` correlate a
/// locally-initiated WILL/DO with the peer's eventual DO/WILL (or
/// DONT/WONT) reply; a collapsed handshake can require decrementing twice,
/// which is why these are plain counters rather than booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelnetOptionState {
    /// We currently have this option enabled locally (we WILL).
    pub will: bool,
    /// The peer currently has this option enabled (we sent DO, they WILL).
    pub do_: bool,
    pub want_will: bool,
    pub want_do: bool,
    pub will_response: u32,
    pub do_response: u32,
}

/// A user-pluggable per-option handler. Once registered the negotiator owns
/// it exclusively; it is replaceable only when the option isn't mid-handshake.
pub trait TelnetOptionHandler: Send {
    fn option_code(&self) -> u8;

    /// Whether to request WILL for this option as soon as the connection
    /// is established.
    fn init_local(&self) -> bool {
        false
    }
    /// Whether to request DO for this option as soon as the connection
    /// is established.
    fn init_remote(&self) -> bool {
        false
    }
    /// Policy: accept an unsolicited/peer-driven request that we enable
    /// this option locally (an incoming DO we didn't request).
    fn accept_local(&self) -> bool {
        false
    }
    /// Policy: accept an unsolicited peer WILL (the peer offering to
    /// enable the option on their end).
    fn accept_remote(&self) -> bool {
        false
    }

    fn set_will(&mut self, will: bool) {
        let _ = will;
    }
    fn set_do(&mut self, do_: bool) {
        let _ = do_;
    }

    /// Called once our local WILL has been acknowledged; any returned bytes
    /// are sent as `SB <option> <bytes> SE`.
    fn start_subnegotiation_local(&mut self) -> Option<Vec<u8>> {
        None
    }
    /// Called once the peer's WILL has been acknowledged by our DO.
    fn start_subnegotiation_remote(&mut self) -> Option<Vec<u8>> {
        None
    }
    /// Respond to an inbound `SB <option> <data> SE` addressed to this
    /// handler (TERMINAL_TYPE is answered by the negotiator itself and
    /// never reaches a handler).
    fn answer_subnegotiation(&mut self, data: &[u8]) -> Option<Vec<u8>> {
        let _ = data;
        None
    }
}
