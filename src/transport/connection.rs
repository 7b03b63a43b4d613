//! Socket primitives for the SMTP transport.

use std::{
    io::{self, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

use super::TransportError;

/// TLS connection options.
#[derive(Clone, Debug)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    /// Verify the server certificate against `domain`.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            insecure_skip_verify: false,
        }
    }

    fn connector(&self) -> Result<TlsConnector, TransportError> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder
            .build()
            .map_err(|err| TransportError::Tls(err.to_string()))
    }
}

/// Active connection to the mail server.
pub(super) enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl ActiveConnection {
    /// Open a TCP connection, trying every resolved address in turn.
    pub(super) fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<Self> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    return Ok(Self::PlainTcp(stream));
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses resolved for {host}:{port}"),
            )
        }))
    }

    /// Wrap a plain connection in TLS. Socket timeouts carry over.
    pub(super) fn into_tls(self, options: &TlsOptions) -> Result<Self, TransportError> {
        match self {
            Self::PlainTcp(stream) => {
                let stream = options
                    .connector()?
                    .connect(&options.domain, stream)
                    .map_err(|err| TransportError::Tls(err.to_string()))?;
                Ok(Self::Tls(Box::new(stream)))
            }
            Self::Tls(_) => Err(TransportError::Protocol(
                "connection is already encrypted".into(),
            )),
        }
    }
}

impl Read for ActiveConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::PlainTcp(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ActiveConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::PlainTcp(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::PlainTcp(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}
