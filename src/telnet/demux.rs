/*
 * demux.rs
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

//! The byte-stream half of Telnet: a background task that scans raw input
//! for IAC sequences, forwards plain data bytes into a bounded ring, and
//! publishes negotiation bytes as [`OptionEvent`]s for
//! [`super::negotiator::TelnetNegotiator`] to consume.
//!
//! The original's wait/notify pattern on a shared int array becomes a
//! `tokio::sync::mpsc` bounded channel: single producer (this task), single
//! consumer (`TelnetDemuxReader::read`), with the channel itself providing
//! the backpressure and wakeups the design calls for. The array's original
//! capacity (2049) is kept as the default ring size.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Notify};

use super::negotiator::OptionEvent;

pub const DEFAULT_RING_CAPACITY: usize = 2049;

const IAC: u8 = 255;
const WILL: u8 = 251;
const WONT: u8 = 252;
const DO: u8 = 253;
const DONT: u8 = 254;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteState {
    Data,
    Cr,
    Iac,
    Will,
    Wont,
    Do,
    Dont,
    Sb,
    IacSb,
}

/// A single item pulled off the demuxed data stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemuxItem {
    Byte(u8),
    /// The underlying connection hit an I/O error; surfaced exactly once,
    /// then draining of any already-queued bytes continues.
    Error(String),
}

/// An optional sink that receives every raw byte the demux task observes,
/// for session transcription. Write failures silently disable the sink.
pub trait SpySink: Send {
    fn observe(&mut self, byte: u8);
}

struct DemuxState {
    byte_state: ByteState,
    sub_option: u8,
    sub_option_set: bool,
    sub_buffer: Vec<u8>,
    binary: bool,
}

impl DemuxState {
    fn new() -> Self {
        Self {
            byte_state: ByteState::Data,
            sub_option: 0,
            sub_option_set: false,
            sub_buffer: Vec::new(),
            binary: false,
        }
    }
}

/// Owns the raw input; runs the IAC-aware byte scanner as a background
/// task and exposes a clean data byte stream plus an AYT rendezvous.
pub struct TelnetDemuxReader {
    data_rx: mpsc::Receiver<DemuxItem>,
    ayt_pending: Arc<AtomicBool>,
    ayt_notify: Arc<Notify>,
}

impl TelnetDemuxReader {
    /// Spawn the background scanner over `reader`, forwarding negotiation
    /// bytes to `events` and data bytes into a ring of `ring_capacity`.
    pub fn spawn<R>(
        mut reader: R,
        events: mpsc::Sender<OptionEvent>,
        ring_capacity: usize,
        mut spy: Option<Box<dyn SpySink>>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (data_tx, data_rx) = mpsc::channel(ring_capacity.max(1));
        let ayt_pending = Arc::new(AtomicBool::new(false));
        let ayt_notify = Arc::new(Notify::new());
        let task_pending = ayt_pending.clone();
        let task_notify = ayt_notify.clone();

        tokio::spawn(async move {
            let mut st = DemuxState::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        let _ = data_tx.send(DemuxItem::Error(e.to_string())).await;
                        break;
                    }
                };
                for &byte in &buf[..n] {
                    if let Some(sink) = spy.as_mut() {
                        sink.observe(byte);
                    }
                    if let Some(data_byte) =
                        Self::step(&mut st, byte, &events, &task_pending, &task_notify).await
                    {
                        if data_tx.send(DemuxItem::Byte(data_byte)).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            data_rx,
            ayt_pending,
            ayt_notify,
        }
    }

    /// Advance the byte state machine by one byte. Returns `Some(byte)` for
    /// a byte that belongs in the clean data stream.
    async fn step(
        st: &mut DemuxState,
        byte: u8,
        events: &mpsc::Sender<OptionEvent>,
        ayt_pending: &Arc<AtomicBool>,
        ayt_notify: &Arc<Notify>,
    ) -> Option<u8> {
        match st.byte_state {
            ByteState::Data => {
                if byte == IAC {
                    st.byte_state = ByteState::Iac;
                    None
                } else if byte == b'\r' && !st.binary {
                    st.byte_state = ByteState::Cr;
                    None
                } else {
                    if ayt_pending.swap(false, Ordering::SeqCst) {
                        ayt_notify.notify_waiters();
                    }
                    Some(byte)
                }
            }
            ByteState::Cr => {
                st.byte_state = ByteState::Data;
                if byte == 0 {
                    None
                } else {
                    Some(byte)
                }
            }
            ByteState::Iac => {
                st.byte_state = match byte {
                    WILL => ByteState::Will,
                    WONT => ByteState::Wont,
                    DO => ByteState::Do,
                    DONT => ByteState::Dont,
                    SB => {
                        st.sub_buffer.clear();
                        st.sub_option_set = false;
                        ByteState::Sb
                    }
                    IAC => {
                        ByteState::Data
                    }
                    _ => ByteState::Data,
                };
                if byte == IAC {
                    Some(IAC)
                } else {
                    if ayt_pending.swap(false, Ordering::SeqCst) {
                        ayt_notify.notify_waiters();
                    }
                    None
                }
            }
            ByteState::Will => {
                st.byte_state = ByteState::Data;
                let _ = events.send(OptionEvent::Will(byte)).await;
                None
            }
            ByteState::Wont => {
                st.byte_state = ByteState::Data;
                let _ = events.send(OptionEvent::Wont(byte)).await;
                None
            }
            ByteState::Do => {
                st.byte_state = ByteState::Data;
                let _ = events.send(OptionEvent::Do(byte)).await;
                None
            }
            ByteState::Dont => {
                st.byte_state = ByteState::Data;
                let _ = events.send(OptionEvent::Dont(byte)).await;
                None
            }
            ByteState::Sb => {
                if !st.sub_option_set {
                    st.sub_option = byte;
                    st.sub_option_set = true;
                } else if byte == IAC {
                    st.byte_state = ByteState::IacSb;
                } else if st.sub_buffer.len() < 256 {
                    st.sub_buffer.push(byte);
                }
                None
            }
            ByteState::IacSb => {
                if byte == SE {
                    st.byte_state = ByteState::Data;
                    let data = std::mem::take(&mut st.sub_buffer);
                    let _ = events
                        .send(OptionEvent::Subnegotiation {
                            option: st.sub_option,
                            data,
                        })
                        .await;
                } else {
                    // Escaped IAC inside the suboption payload.
                    if st.sub_buffer.len() < 256 {
                        st.sub_buffer.push(byte);
                    }
                    st.byte_state = ByteState::Sb;
                }
                None
            }
        }
    }

    /// Read one demuxed byte, or `None` on a clean EOF.
    pub async fn read(&mut self) -> std::io::Result<Option<u8>> {
        match self.data_rx.recv().await {
            None => Ok(None),
            Some(DemuxItem::Byte(b)) => Ok(Some(b)),
            Some(DemuxItem::Error(msg)) => Err(std::io::Error::other(msg)),
        }
    }

    pub fn available(&self) -> usize {
        self.data_rx.len()
    }

    /// Called by the negotiator's AYT sender just before writing IAC AYT.
    pub fn arm_ayt(&self) {
        self.ayt_pending.store(true, Ordering::SeqCst);
    }

    /// Wait up to `timeout` for any non-negotiation byte to arrive after
    /// arming, signalling the peer is alive. Returns `true` on notification.
    pub async fn wait_ayt(&self, timeout: std::time::Duration) -> bool {
        tokio::time::timeout(timeout, self.ayt_notify.notified())
            .await
            .is_ok()
    }
}

/// Write-side framing: when BINARY is not active, doubles every IAC in
/// data, maps a bare `\r` to `\r\0`, and emits `\r\n` for a `\n` following
/// a `\r` that the caller already wrote raw.
pub struct TelnetOutputStream<W> {
    writer: W,
    binary: bool,
}

/// Apply the write-side IAC-doubling/CR-padding transform described above.
/// A pure function so [`TelnetOutputStream`] and a single-writer client
/// that routes data writes through the negotiator's locked writer can
/// share the same encoding.
pub fn encode_output_bytes(data: &[u8], binary: bool) -> Vec<u8> {
    if binary {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    let mut chars = data.iter().peekable();
    while let Some(&b) = chars.next() {
        match b {
            IAC => {
                out.push(IAC);
                out.push(IAC);
            }
            b'\r' => {
                out.push(b'\r');
                if chars.peek() == Some(&&b'\n') {
                    out.push(b'\n');
                    chars.next();
                } else {
                    out.push(0);
                }
            }
            other => out.push(other),
        }
    }
    out
}

impl<W> TelnetOutputStream<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self { writer, binary: false }
    }

    pub fn set_binary(&mut self, binary: bool) {
        self.binary = binary;
    }

    pub async fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        let out = encode_output_bytes(data, self.binary);
        self.writer.write_all(&out).await?;
        self.writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn data_bytes_pass_through_and_iac_is_scanned_out() {
        let (mut server, client) = duplex(256);
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let mut demux = TelnetDemuxReader::spawn(client, events_tx, 64, None);
        server.write_all(b"hi").await.unwrap();
        server.write_all(&[IAC, WILL, super::super::option::codes::ECHO]).await.unwrap();
        server.write_all(b"!").await.unwrap();
        assert_eq!(demux.read().await.unwrap(), Some(b'h'));
        assert_eq!(demux.read().await.unwrap(), Some(b'i'));
        let ev = events_rx.recv().await.unwrap();
        assert_eq!(ev, OptionEvent::Will(super::super::option::codes::ECHO));
        assert_eq!(demux.read().await.unwrap(), Some(b'!'));
    }

    #[tokio::test]
    async fn doubled_iac_in_data_yields_single_byte() {
        let (mut server, client) = duplex(256);
        let (events_tx, _events_rx) = mpsc::channel(16);
        let mut demux = TelnetDemuxReader::spawn(client, events_tx, 64, None);
        server.write_all(&[IAC, IAC]).await.unwrap();
        assert_eq!(demux.read().await.unwrap(), Some(IAC));
    }

    #[tokio::test]
    async fn eof_drains_then_returns_none() {
        let (server, client) = duplex(256);
        let (events_tx, _events_rx) = mpsc::channel(16);
        let mut demux = TelnetDemuxReader::spawn(client, events_tx, 64, None);
        drop(server);
        assert_eq!(demux.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn output_stream_doubles_iac_and_pads_bare_cr() {
        let (mut client, mut server) = duplex(256);
        {
            let mut out = TelnetOutputStream::new(&mut client);
            out.write(&[b'a', IAC, b'\r', b'\r', b'\n']).await.unwrap();
        }
        drop(client);
        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut server, &mut buf).await.unwrap();
        assert_eq!(buf, vec![b'a', IAC, IAC, b'\r', 0, b'\r', b'\n']);
    }
}
