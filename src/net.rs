/*
 * net.rs
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

//! TLS connection helpers: wrap `TcpStream` with rustls, for both implicit
//! TLS (connect straight into a handshake, e.g. SMTPS 465) and STARTTLS
//! (upgrade an already-open plain stream after the protocol says go ahead).
//!
//! This is the concrete instance of the §4.7 `TLSWrapper` collaborator: the
//! protocol engines never touch rustls directly, they call
//! `PlainStream::upgrade_to_tls` and replace their reader/writer.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tokio_rustls::rustls::client::ClientConfig;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::RootCertStore;
use tokio_rustls::TlsConnector;

/// Build a root certificate store: platform native certs first, falling
/// back to the bundled Mozilla roots if none are found.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = root_store.add(cert);
        }
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

fn default_client_config() -> Arc<ClientConfig> {
    let config = ClientConfig::builder()
        .with_root_certificates(build_root_store())
        .with_no_client_auth();
    Arc::new(config)
}

static DEFAULT_CONNECTOR: std::sync::OnceLock<TlsConnector> = std::sync::OnceLock::new();

fn default_connector() -> &'static TlsConnector {
    DEFAULT_CONNECTOR.get_or_init(|| TlsConnector::from(default_client_config()))
}

/// An established TLS stream (wraps tokio-rustls's client `TlsStream` over a `TcpStream`).
pub struct TlsStreamWrapper {
    inner: TokioTlsStream<TcpStream>,
}

impl TlsStreamWrapper {
    /// Connect with implicit TLS (e.g. SMTPS 465, NNTPS 563): TCP connect
    /// then an immediate handshake, before any protocol bytes are exchanged.
    pub async fn connect_implicit_tls(host: &str, port: u16) -> io::Result<Self> {
        let addr = format!("{host}:{port}");
        let tcp = TcpStream::connect(&addr).await?;
        let server_name = server_name(host)?;
        let tls = default_connector()
            .connect(server_name, tcp)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
        Ok(Self { inner: tls })
    }
}

fn server_name(host: &str) -> io::Result<ServerName<'static>> {
    let host_static: &'static str = Box::leak(host.to_string().into_boxed_str());
    host_static
        .try_into()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))
}

impl AsyncRead for TlsStreamWrapper {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for TlsStreamWrapper {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// A plain TCP stream, pending a possible STARTTLS upgrade (SMTP 587, NNTP 119/433).
pub struct PlainStream {
    inner: TcpStream,
}

impl PlainStream {
    /// Connect without TLS; call [`PlainStream::upgrade_to_tls`] once the
    /// server has agreed to STARTTLS.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let addr = format!("{host}:{port}");
        let tcp = TcpStream::connect(&addr).await?;
        Ok(Self { inner: tcp })
    }

    /// Upgrade this plain stream to TLS, consuming it and reusing the same
    /// TCP connection (the STARTTLS contract: no new socket, no re-handshake
    /// of the transport).
    pub async fn upgrade_to_tls(self, host: &str) -> io::Result<TlsStreamWrapper> {
        let server_name = server_name(host)?;
        let tls = default_connector()
            .connect(server_name, self.inner)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
        Ok(TlsStreamWrapper { inner: tls })
    }
}

impl AsyncRead for PlainStream {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for PlainStream {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// Connect with implicit TLS (e.g. SMTPS 465, NNTPS 563).
pub async fn connect_implicit_tls(host: &str, port: u16) -> io::Result<TlsStreamWrapper> {
    TlsStreamWrapper::connect_implicit_tls(host, port).await
}

/// Connect plain, for protocols that negotiate TLS with STARTTLS.
pub async fn connect_plain(host: &str, port: u16) -> io::Result<PlainStream> {
    PlainStream::connect(host, port).await
}
