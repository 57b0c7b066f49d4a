// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Byte stream setup for RouterOS API connections

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Error, Result};

/// Well-known RouterOS API port
pub const DEFAULT_SERVICE: &str = "8728";

/// Blocking byte stream a [`Connection`](super::Connection) runs on
pub trait Transport: Read + Write {
    /// Releases the underlying stream
    ///
    /// # Errors
    ///
    /// Returns the error reported while closing.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // Peer already went away, nothing left to release
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Resolves `node` and `service` and connects to the first reachable address
///
/// `service` must be a numeric port. Deadlines are applied to the socket when
/// given; the protocol layer itself never times out.
///
/// # Errors
///
/// Returns [`Error::Config`] for a non-numeric service, otherwise the last
/// connect error.
pub fn open_stream(
    node: &str,
    service: Option<&str>,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
) -> Result<TcpStream> {
    let service = service.unwrap_or(DEFAULT_SERVICE);
    let port: u16 = service.parse().map_err(|_| {
        Error::Config(format!(
            "Unsupported service '{service}': expected a port number"
        ))
    })?;
    let addrs = (node, port).to_socket_addrs()?;
    let stream = connect_any(node, addrs, connect_timeout)?;
    configure(&stream, io_timeout)?;
    Ok(stream)
}

/// Connects to an address of the form `host:port`
///
/// # Errors
///
/// Returns the resolution error or the last connect error.
pub fn open_address(
    address: &str,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
) -> Result<TcpStream> {
    let addrs = address.to_socket_addrs()?;
    let stream = connect_any(address, addrs, connect_timeout)?;
    configure(&stream, io_timeout)?;
    Ok(stream)
}

fn connect_any(
    target: &str,
    addrs: impl Iterator<Item = SocketAddr>,
    connect_timeout: Option<Duration>,
) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in addrs {
        tracing::trace!("Attempting TCP connection to: {}", addr);
        let result = match connect_timeout {
            Some(t) => TcpStream::connect_timeout(&addr, t),
            None => TcpStream::connect(addr),
        };
        match result {
            Ok(stream) => {
                tracing::trace!("TCP connection established to: {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("Connection to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }
    let err = last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses resolved for {target}"),
        )
    });
    Err(err.into())
}

fn configure(stream: &TcpStream, io_timeout: Option<Duration>) -> Result<()> {
    stream.set_nodelay(true)?;
    stream.set_read_timeout(io_timeout)?;
    stream.set_write_timeout(io_timeout)?;
    Ok(())
}
