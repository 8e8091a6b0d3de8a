//! Byte stream under the SMTP client, plaintext or TLS.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::debug;

/// Longest reply line accepted from a server (RFC 5321 allows 512 octets).
const MAX_LINE_LENGTH: usize = 4096;

/// Any transport the client can speak SMTP over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

type BoxedStream = Box<dyn AsyncStream>;

/// SMTP stream, before or after the TLS upgrade.
pub enum SmtpStream {
    /// Plaintext connection.
    Plain(BufReader<BoxedStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<TlsStream<BoxedStream>>>),
}

impl std::fmt::Debug for SmtpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("SmtpStream::Plain"),
            Self::Tls(_) => f.write_str("SmtpStream::Tls"),
        }
    }
}

impl SmtpStream {
    /// Wraps an already-connected plaintext transport.
    pub fn from_io(io: impl AsyncStream + 'static) -> Self {
        Self::Plain(BufReader::new(Box::new(io)))
    }

    /// Returns true once the stream is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one line, without its terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails, the server closed the connection,
    /// or the line is unreasonably long.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        match self {
            Self::Plain(reader) => read_bounded(reader, &mut buf).await?,
            Self::Tls(reader) => read_bounded(&mut **reader, &mut buf).await?,
        }

        let line = String::from_utf8(buf)
            .map_err(|_| Error::Protocol("Reply line is not valid UTF-8".into()))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes and flushes data.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Performs the TLS handshake on a plaintext stream.
    ///
    /// Bytes the server sent ahead of the handshake are discarded with the
    /// plaintext buffer, as RFC 3207 requires.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted, the hostname is
    /// not a valid server name, or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let io = match self {
            Self::Plain(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
        };

        let tls = handshake(hostname, io).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls))))
    }
}

/// Connects to an SMTP server over plain TCP (ports 25 and 587).
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    debug!(hostname, port, "Opening TCP connection");
    let stream = TcpStream::connect((hostname, port)).await?;
    Ok(SmtpStream::from_io(stream))
}

/// Connects to an SMTP server with implicit TLS (port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    debug!(hostname, port, "Opening TLS connection");
    let stream: BoxedStream = Box::new(TcpStream::connect((hostname, port)).await?);
    let tls = handshake(hostname, stream).await?;
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls))))
}

/// Reads up to and including `\n`, never buffering more than
/// `MAX_LINE_LENGTH` bytes.
async fn read_bounded<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_LINE_LENGTH as u64 + 1;
    let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;

    if read == 0 {
        return Err(Error::Protocol("Connection closed by server".into()));
    }
    if buf.len() > MAX_LINE_LENGTH {
        return Err(Error::Protocol(format!(
            "Reply line longer than {MAX_LINE_LENGTH} bytes"
        )));
    }
    Ok(())
}

async fn handshake(hostname: &str, io: BoxedStream) -> Result<TlsStream<BoxedStream>> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

    let tls = create_tls_connector().connect(server_name, io).await?;
    debug!(hostname, "TLS handshake complete");
    Ok(tls)
}

/// Creates a TLS connector trusting the webpki root set.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
