//! Transport layer for the WR3223 protocol
//!
//! A transport owns one open byte stream to the controller and performs
//! complete request/response exchanges over it. The same framing runs over TCP
//! and serial links, so [`StreamTransport`] is generic over the stream and
//! [`Link`] closes the set of supported streams.
//!
//! Connections are made by a [`Connector`]. The polling cycle asks it for a new
//! transport whenever the previous one was dropped after an I/O failure.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::command::ProtocolCommand;
use crate::config::ConnectionTarget;
use crate::constants::{MAX_RESPONSE_LEN, TCP_TIMEOUT_MS};
use crate::error::{Wr3223Error, Wr3223Result};
use crate::frame;

/// Transport statistics
#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub last_activity: Option<DateTime<Utc>>,
}

impl TransportStats {
    fn touch(&mut self) {
        self.last_activity = Some(Utc::now());
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// One open connection to a controller.
///
/// Every error returned by `read` and `write` is a communication failure except
/// a rejected write, which is reported as `Ok(false)`.
pub trait Wr3223Transport: Send {
    /// Read the raw value of a command.
    fn read(
        &mut self,
        command: ProtocolCommand,
    ) -> impl Future<Output = Wr3223Result<String>> + Send;

    /// Write a value. `Ok(true)` when the controller acknowledged it.
    fn write(
        &mut self,
        command: ProtocolCommand,
        data: &str,
    ) -> impl Future<Output = Wr3223Result<bool>> + Send;

    /// Check if the transport is connected
    fn is_connected(&self) -> bool;

    /// Close the transport
    fn close(&mut self) -> impl Future<Output = Wr3223Result<()>> + Send;

    /// Get transport statistics
    fn get_stats(&self) -> TransportStats;
}

/// Opens transports.
pub trait Connector: Send + Sync {
    type Transport: Wr3223Transport;

    /// Open a new connection.
    fn connect(&self) -> impl Future<Output = Wr3223Result<Self::Transport>> + Send;
}

// ============================================================================
// Stream Transport
// ============================================================================

/// Framed WR3223 exchanges over any async byte stream.
pub struct StreamTransport<S> {
    stream: Option<S>,
    controller_addr: u8,
    timeout: Duration,
    buffer: BytesMut,
    stats: TransportStats,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an open stream.
    pub fn new(stream: S, controller_addr: u8, timeout: Duration) -> Self {
        Self {
            stream: Some(stream),
            controller_addr,
            timeout,
            buffer: BytesMut::with_capacity(MAX_RESPONSE_LEN),
            stats: TransportStats::default(),
        }
    }

    /// Controller bus address used for every request.
    pub fn controller_addr(&self) -> u8 {
        self.controller_addr
    }

    fn stream_mut(&mut self) -> Wr3223Result<&mut S> {
        self.stream
            .as_mut()
            .ok_or_else(|| Wr3223Error::connection("Transport is closed"))
    }

    async fn send_frame(&mut self, frame: &[u8]) -> Wr3223Result<()> {
        let stream = self.stream_mut()?;
        stream.write_all(frame).await?;
        stream.flush().await?;
        self.stats.requests_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        Ok(())
    }

    async fn receive_response(&mut self, command: ProtocolCommand) -> Wr3223Result<String> {
        self.buffer.clear();
        let mut chunk = [0u8; MAX_RESPONSE_LEN];
        loop {
            if let Some(len) = frame::response_len(&self.buffer) {
                self.stats.responses_received += 1;
                return frame::parse_read_response(command, &self.buffer[..len]);
            }
            if self.buffer.len() >= MAX_RESPONSE_LEN {
                return Err(Wr3223Error::protocol(format!(
                    "Response to {} exceeds {} bytes",
                    command, MAX_RESPONSE_LEN
                )));
            }

            let n = self.stream_mut()?.read(&mut chunk).await?;
            if n == 0 {
                return Err(Wr3223Error::connection("Connection closed by peer"));
            }
            self.stats.bytes_received += n as u64;
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    async fn receive_ack(&mut self, command: ProtocolCommand) -> Wr3223Result<bool> {
        let byte = self.stream_mut()?.read_u8().await.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Wr3223Error::connection("Connection closed by peer")
            } else {
                e.into()
            }
        })?;
        self.stats.bytes_received += 1;
        self.stats.responses_received += 1;
        frame::parse_write_ack(command, byte)
    }

    async fn read_exchange(&mut self, command: ProtocolCommand) -> Wr3223Result<String> {
        let request = frame::build_read_request(self.controller_addr, command)?;
        self.send_frame(&request).await?;
        self.receive_response(command).await
    }

    async fn write_exchange(&mut self, command: ProtocolCommand, data: &str) -> Wr3223Result<bool> {
        let request = frame::build_write_request(self.controller_addr, command, data)?;
        self.send_frame(&request).await?;
        self.receive_ack(command).await
    }

    fn record(&mut self, operation: &str, error: Wr3223Error) -> Wr3223Error {
        self.stats.errors += 1;
        if matches!(error, Wr3223Error::Timeout { .. }) {
            self.stats.timeouts += 1;
        }
        warn!("{} failed: {}", operation, error);
        error
    }
}

impl<S> Wr3223Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, command: ProtocolCommand) -> Wr3223Result<String> {
        let limit = self.timeout;
        let result = match timeout(limit, self.read_exchange(command)).await {
            Ok(result) => result,
            Err(_) => Err(Wr3223Error::timeout(
                format!("read {}", command),
                limit.as_millis() as u64,
            )),
        };
        self.stats.touch();
        match result {
            Ok(value) => {
                debug!("Read {} = {:?}", command, value);
                Ok(value)
            }
            Err(e) => Err(self.record(&format!("Read {}", command), e)),
        }
    }

    async fn write(&mut self, command: ProtocolCommand, data: &str) -> Wr3223Result<bool> {
        let limit = self.timeout;
        let result = match timeout(limit, self.write_exchange(command, data)).await {
            Ok(result) => result,
            Err(_) => Err(Wr3223Error::timeout(
                format!("write {}", command),
                limit.as_millis() as u64,
            )),
        };
        self.stats.touch();
        match result {
            Ok(accepted) => {
                debug!("Write {}={} accepted={}", command, data, accepted);
                Ok(accepted)
            }
            Err(e) => Err(self.record(&format!("Write {}", command), e)),
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) -> Wr3223Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
            info!("Connection to controller {} closed", self.controller_addr);
        }
        Ok(())
    }

    fn get_stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

// ============================================================================
// Link
// ============================================================================

/// The byte streams a controller can be reached over.
pub enum Link {
    Tcp(TcpStream),
    #[cfg(feature = "serial")]
    Serial(tokio_serial::SerialStream),
}

impl AsyncRead for Link {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Link::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(feature = "serial")]
            Link::Serial(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Link {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Link::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            #[cfg(feature = "serial")]
            Link::Serial(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Link::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            #[cfg(feature = "serial")]
            Link::Serial(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Link::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            #[cfg(feature = "serial")]
            Link::Serial(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Transport over a [`Link`].
pub type LinkTransport = StreamTransport<Link>;

/// Connects to the configured TCP endpoint or serial port.
#[derive(Debug, Clone)]
pub struct LinkConnector {
    target: ConnectionTarget,
    controller_addr: u8,
}

impl LinkConnector {
    pub fn new(target: ConnectionTarget, controller_addr: u8) -> Self {
        Self {
            target,
            controller_addr,
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    async fn connect_tcp(&self, host: &str, port: u16) -> Wr3223Result<LinkTransport> {
        let limit = Duration::from_millis(TCP_TIMEOUT_MS);
        let stream = timeout(limit, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Wr3223Error::timeout(format!("connect {}:{}", host, port), TCP_TIMEOUT_MS))?
            .map_err(|e| Wr3223Error::connection(format!("Failed to connect to {}:{}: {}", host, port, e)))?;
        info!("Connected to {}:{}", host, port);
        Ok(StreamTransport::new(Link::Tcp(stream), self.controller_addr, limit))
    }

    #[cfg(feature = "serial")]
    fn open_serial(&self, port: &str, baud_rate: u32) -> Wr3223Result<LinkTransport> {
        use crate::constants::SERIAL_TIMEOUT_MS;
        use tokio_serial::{DataBits, ErrorKind, Parity, SerialStream, StopBits};

        let limit = Duration::from_millis(SERIAL_TIMEOUT_MS);
        let builder = tokio_serial::new(port, baud_rate)
            .data_bits(DataBits::Seven)
            .stop_bits(StopBits::One)
            .parity(Parity::Even)
            .timeout(limit);

        let stream = SerialStream::open(&builder).map_err(|e| match e.kind {
            ErrorKind::NoDevice | ErrorKind::InvalidInput => {
                Wr3223Error::configuration(format!("Serial port {}: {}", port, e))
            }
            _ => Wr3223Error::connection(format!("Failed to open {}: {}", port, e)),
        })?;
        info!("Opened serial port {} at {} baud", port, baud_rate);
        Ok(StreamTransport::new(Link::Serial(stream), self.controller_addr, limit))
    }

    #[cfg(not(feature = "serial"))]
    fn open_serial(&self, port: &str, _baud_rate: u32) -> Wr3223Result<LinkTransport> {
        Err(Wr3223Error::configuration(format!(
            "Serial port {} configured but serial support is not compiled in",
            port
        )))
    }
}

impl Connector for LinkConnector {
    type Transport = LinkTransport;

    async fn connect(&self) -> Wr3223Result<LinkTransport> {
        frame::encode_address(self.controller_addr)?;
        match &self.target {
            ConnectionTarget::Tcp { host, port } => self.connect_tcp(host, *port).await,
            ConnectionTarget::Serial { port, baud_rate } => self.open_serial(port, *baud_rate),
        }
    }
}
