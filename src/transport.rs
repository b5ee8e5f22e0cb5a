use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::error::TransportError;

/// The byte-duplex seam the session engine runs over. Anything that
/// reads and writes bytes qualifies: a plain TCP stream, a TLS wrapper
/// supplied by the host, or an in-memory duplex in tests.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> Transport for T {}

/// Dials `addr` (`host:port`) and returns a TCP transport with Nagle
/// disabled, the usual choice for FIX traffic.
pub async fn dial(addr: &str) -> Result<TcpStream, TransportError> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}
