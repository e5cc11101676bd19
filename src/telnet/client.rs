/*
 * client.rs
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

//! Wires the negotiator and the demux reader together into a usable Telnet
//! client. The negotiator is moved into a single background task that owns
//! the write half exclusively; both negotiation replies and the caller's
//! outbound data writes are funneled through it over two channels, so the
//! "every send/receive critical section holds the same per-connection lock"
//! requirement falls out of there being exactly one writer, not a shared
//! mutex the caller could forget to take.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};

use crate::error::TelnetError;

use super::demux::{encode_output_bytes, SpySink, TelnetDemuxReader, DEFAULT_RING_CAPACITY};
use super::negotiator::{OptionEvent, TelnetNegotiator};
use super::option::TelnetOptionHandler;

enum Outbound {
    Data(Vec<u8>, oneshot::Sender<Result<(), TelnetError>>),
}

/// A connected Telnet client: clean data in, clean data out, with option
/// negotiation and subnegotiation handled transparently in the background.
pub struct TelnetClient {
    demux: TelnetDemuxReader,
    outbound: mpsc::Sender<Outbound>,
    negotiator_handle: tokio::task::JoinHandle<()>,
    binary: bool,
}

impl TelnetClient {
    /// Build a client over an already-connected `reader`/`writer` pair.
    /// Register option handlers on `negotiator` before calling this; once
    /// moved in, it is owned exclusively by the background event loop.
    pub fn new<R, W>(
        reader: R,
        negotiator: TelnetNegotiator<W>,
        ring_capacity: usize,
        spy: Option<Box<dyn SpySink>>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (events_tx, mut events_rx) = mpsc::channel::<OptionEvent>(64);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(64);
        let demux = TelnetDemuxReader::spawn(reader, events_tx, ring_capacity, spy);

        let negotiator_handle = tokio::spawn(async move {
            let mut negotiator = negotiator;
            loop {
                tokio::select! {
                    event = events_rx.recv() => {
                        match event {
                            Some(event) => {
                                if negotiator.handle_event(event).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                    msg = outbound_rx.recv() => {
                        match msg {
                            Some(Outbound::Data(bytes, resp)) => {
                                let result = negotiator.write_data(&bytes).await;
                                let _ = resp.send(result);
                            }
                            None => break,
                        }
                    }
                    else => break,
                }
            }
        });

        Self {
            demux,
            outbound: outbound_tx,
            negotiator_handle,
            binary: false,
        }
    }

    pub async fn read(&mut self) -> std::io::Result<Option<u8>> {
        self.demux.read().await
    }

    pub fn set_binary(&mut self, binary: bool) {
        self.binary = binary;
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<(), TelnetError> {
        let encoded = encode_output_bytes(data, self.binary);
        let (tx, rx) = oneshot::channel();
        self.outbound
            .send(Outbound::Data(encoded, tx))
            .await
            .map_err(|_| TelnetError::Io(std::io::Error::other("negotiator task gone")))?;
        rx.await
            .map_err(|_| TelnetError::Io(std::io::Error::other("negotiator task gone")))?
    }

    pub fn available(&self) -> usize {
        self.demux.available()
    }

    /// Send IAC AYT and wait up to `timeout` for the peer to respond with
    /// any non-negotiation byte.
    pub async fn send_ayt(&mut self, timeout: Duration) -> Result<bool, TelnetError> {
        self.demux.arm_ayt();
        let (tx, rx) = oneshot::channel();
        self.outbound
            .send(Outbound::Data(vec![255, 246], tx)) // IAC AYT, sent raw (not data-encoded)
            .await
            .map_err(|_| TelnetError::Io(std::io::Error::other("negotiator task gone")))?;
        rx.await
            .map_err(|_| TelnetError::Io(std::io::Error::other("negotiator task gone")))??;
        Ok(self.demux.wait_ayt(timeout).await)
    }

    pub fn abort(&self) {
        self.negotiator_handle.abort();
    }
}

pub const DEFAULT_CAPACITY: usize = DEFAULT_RING_CAPACITY;

/// A handler for options with no subnegotiation: offers/accepts WILL/DO
/// per fixed policy flags decided at construction (the common case for
/// ECHO/SUPPRESS_GO_AHEAD-style options).
pub struct SimpleOptionHandler {
    code: u8,
    init_local: bool,
    init_remote: bool,
    accept_local: bool,
    accept_remote: bool,
    will: bool,
    do_: bool,
}

impl SimpleOptionHandler {
    pub fn new(code: u8, init_local: bool, init_remote: bool) -> Self {
        Self {
            code,
            init_local,
            init_remote,
            accept_local: init_local,
            accept_remote: init_remote,
            will: false,
            do_: false,
        }
    }

    pub fn is_will(&self) -> bool {
        self.will
    }

    pub fn is_do(&self) -> bool {
        self.do_
    }
}

impl TelnetOptionHandler for SimpleOptionHandler {
    fn option_code(&self) -> u8 {
        self.code
    }
    fn init_local(&self) -> bool {
        self.init_local
    }
    fn init_remote(&self) -> bool {
        self.init_remote
    }
    fn accept_local(&self) -> bool {
        self.accept_local
    }
    fn accept_remote(&self) -> bool {
        self.accept_remote
    }
    fn set_will(&mut self, will: bool) {
        self.will = will;
    }
    fn set_do(&mut self, do_: bool) {
        self.do_ = do_;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telnet::option::codes;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    /// End-to-end scenario: client sends WILL ECHO, server (peer) answers
    /// DO, then re-sends a duplicate unsolicited DO which must be absorbed
    /// without a second WILL going out.
    #[tokio::test]
    async fn will_echo_handshake_absorbs_duplicate_will() {
        let (mut peer, local) = duplex(256);
        let (lr, lw) = tokio::io::split(local);
        let mut negotiator = TelnetNegotiator::new(lw, Some("VT100".to_string()));
        negotiator
            .add_option_handler(Box::new(SimpleOptionHandler::new(codes::ECHO, true, false)), false)
            .await
            .unwrap();
        negotiator.request_will(codes::ECHO).await.unwrap();

        let mut buf = [0u8; 16];
        let n = peer.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[255, 251, codes::ECHO]); // IAC WILL ECHO

        let client = TelnetClient::new(lr, negotiator, 64, None);

        peer.write_all(&[255, 253, codes::ECHO]).await.unwrap(); // IAC DO ECHO
        peer.write_all(&[255, 253, codes::ECHO]).await.unwrap(); // duplicate DO

        // A duplicate unsolicited DO must not trigger another outbound
        // WILL: nothing further should arrive within a short window.
        let mut rest = [0u8; 16];
        let outcome = tokio::time::timeout(Duration::from_millis(50), peer.read(&mut rest)).await;
        assert!(outcome.is_err(), "unexpected extra bytes from duplicate DO handling");

        client.abort();
    }
}
