use log::{debug, warn};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::Transport;
use crate::error::ScopeError;

/// Raw socket server port of the MDO4000 series
pub const DEFAULT_PORT: u16 = 4000;

const TERMINATOR: u8 = b'\n';
const CHUNK_SIZE: usize = 64 * 1024;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// True once `data` holds a PNG through its `IEND` chunk (plus CRC), with or
/// without a trailing terminator.
fn png_complete(data: &[u8]) -> bool {
    if !data.starts_with(PNG_SIGNATURE) {
        return false;
    }
    let body = data.strip_suffix(&[TERMINATOR]).unwrap_or(data);
    body.len() >= PNG_SIGNATURE.len() + 12 && body[body.len() - 8..body.len() - 4] == *b"IEND"
}

/// Timeouts for the instrument socket.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use rusty_mdo::ConnectionConfig;
///
/// let config = ConnectionConfig {
///     connect_timeout: Duration::from_secs(2),
///     ..ConnectionConfig::default()
/// };
/// assert_eq!(config.read_timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing the TCP connection
    pub connect_timeout: Duration,
    /// Timeout for reading replies, screen captures need several seconds
    pub read_timeout: Duration,
    /// Timeout for writing commands
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Builder for [`TcpTransport`].
///
/// ```no_run
/// use std::time::Duration;
/// use rusty_mdo::TcpTransport;
///
/// let transport = TcpTransport::builder()
///     .address("192.168.1.50")
///     .port(4000)
///     .connect_timeout(Duration::from_secs(2))
///     .build()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Default)]
pub struct TcpTransportBuilder {
    address: Option<String>,
    port: Option<u16>,
    config: ConnectionConfig,
}

impl TcpTransportBuilder {
    /// Set the instrument host name or IP address
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.address = Some(addr.into());
        self
    }

    /// Set the socket server port, 4000 when omitted
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Replace all timeouts at once
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the timeout for establishing the connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the timeout for replies and raw transfers
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the timeout for sending commands
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Resolve the address and open the socket
    pub fn build(self) -> Result<TcpTransport, ScopeError> {
        let address = self
            .address
            .ok_or_else(|| ScopeError::InvalidAddress("address must be specified".to_string()))?;
        let port = self.port.unwrap_or(DEFAULT_PORT);

        let socket_addr: SocketAddr = (address.as_str(), port)
            .to_socket_addrs()
            .map_err(|_| ScopeError::InvalidAddress(address.clone()))?
            .next()
            .ok_or_else(|| ScopeError::InvalidAddress(address.clone()))?;

        debug!("Connecting to instrument at {socket_addr}");

        let stream =
            TcpStream::connect_timeout(&socket_addr, self.config.connect_timeout).map_err(|e| {
                warn!("Failed to connect to {socket_addr}: {e}");
                if e.kind() == std::io::ErrorKind::TimedOut {
                    ScopeError::Timeout
                } else {
                    ScopeError::Io {
                        source: e,
                        context: format!("Failed to connect to {socket_addr}"),
                    }
                }
            })?;

        stream.set_read_timeout(Some(self.config.read_timeout))?;
        stream.set_write_timeout(Some(self.config.write_timeout))?;
        stream.set_nodelay(true)?;

        debug!("Connected to {socket_addr}");

        Ok(TcpTransport {
            reader: BufReader::new(stream),
            config: self.config,
        })
    }
}

/// SCPI over a plain TCP socket, newline terminated
pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    config: ConnectionConfig,
}

impl TcpTransport {
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::default()
    }

    /// Connect with default timeouts
    pub fn connect(addr: &str, port: u16) -> Result<Self, ScopeError> {
        Self::builder().address(addr).port(port).build()
    }

    /// Timeouts currently in effect
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ScopeError> {
        let mut line = Vec::new();
        let n = self
            .reader
            .read_until(TERMINATOR, &mut line)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => ScopeError::Timeout,
                _ => ScopeError::Io {
                    source: e,
                    context: "Reading reply".to_string(),
                },
            })?;
        if n == 0 {
            return Err(ScopeError::Io {
                source: std::io::ErrorKind::UnexpectedEof.into(),
                context: "Instrument closed the connection".to_string(),
            });
        }
        Ok(line)
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, command: &str) -> Result<(), ScopeError> {
        let mut message = Vec::with_capacity(command.len() + 1);
        message.extend_from_slice(command.as_bytes());
        message.push(TERMINATOR);
        self.reader
            .get_mut()
            .write_all(&message)
            .map_err(|e| ScopeError::Io {
                source: e,
                context: format!("Writing {command:?}"),
            })
    }

    fn query(&mut self, command: &str) -> Result<String, ScopeError> {
        self.write(command)?;
        let line = self.read_line()?;
        String::from_utf8(line).map_err(|e| ScopeError::Parse {
            command: command.to_string(),
            reply: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    fn read_raw(&mut self, max_bytes: Option<usize>) -> Result<Vec<u8>, ScopeError> {
        let Some(limit) = max_bytes else {
            return self.read_line();
        };

        let mut data = Vec::new();
        let mut chunk = vec![0u8; CHUNK_SIZE.min(limit.max(1))];
        while data.len() < limit {
            let want = chunk.len().min(limit - data.len());
            match self.reader.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => {
                    data.extend_from_slice(&chunk[..n]);
                    if png_complete(&data) {
                        break;
                    }
                }
                // The instrument does not announce binary transfer sizes, a
                // quiet socket after some data marks the end.
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                    ) =>
                {
                    if data.is_empty() {
                        return Err(ScopeError::Timeout);
                    }
                    break;
                }
                Err(e) => {
                    return Err(ScopeError::Io {
                        source: e,
                        context: "Reading raw data".to_string(),
                    });
                }
            }
        }
        debug!("Raw read finished with {} bytes", data.len());
        Ok(data)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        self.reader.get_ref().set_read_timeout(Some(timeout))?;
        self.config.read_timeout = timeout;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn serve_once<F>(handler: F) -> (u16, thread::JoinHandle<()>)
    where
        F: FnOnce(TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handler(stream);
        });
        (port, handle)
    }

    #[test]
    fn test_builder_requires_address() {
        let result = TcpTransport::builder().port(4000).build();
        assert!(matches!(result, Err(ScopeError::InvalidAddress(_))));
    }

    #[test]
    fn test_query_reads_one_line() {
        let (port, handle) = serve_once(|stream| {
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "*IDN?\n");
            let mut stream = stream;
            stream.write_all(b"TEKTRONIX,MDO4104B-6,C0,FV\n").unwrap();
        });

        let mut transport = TcpTransport::connect("127.0.0.1", port).unwrap();
        let reply = transport.query("*IDN?").unwrap();
        assert_eq!(reply, "TEKTRONIX,MDO4104B-6,C0,FV\n");
        handle.join().unwrap();
    }

    /// Block until the client sends its closing line
    fn wait_for_line(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        line
    }

    #[test]
    fn test_read_raw_stops_at_limit() {
        let (port, handle) = serve_once(|mut stream| {
            stream.write_all(&[7u8; 100]).unwrap();
            assert_eq!(wait_for_line(&stream), "done\n");
        });

        let mut transport = TcpTransport::connect("127.0.0.1", port).unwrap();
        let data = transport.read_raw(Some(64)).unwrap();
        assert_eq!(data, vec![7u8; 64]);
        transport.write("done").unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_read_raw_ends_on_close() {
        let (port, handle) = serve_once(|mut stream| {
            stream.write_all(b"\x89PNG\r\n\x1a\nrest").unwrap();
        });

        let mut transport = TcpTransport::builder()
            .address("127.0.0.1")
            .port(port)
            .read_timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        handle.join().unwrap();
        let data = transport.read_raw(Some(1024 * 1024)).unwrap();
        assert_eq!(data, b"\x89PNG\r\n\x1a\nrest".to_vec());
    }

    #[test]
    fn test_read_raw_stops_after_png_end() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(b"\x00\x00\x00\x0dIHDRxxxxxxxxxxxxxCRC!");
        png.extend_from_slice(b"\x00\x00\x00\x00IEND\xae\x42\x60\x82");
        let payload = png.clone();

        let (port, handle) = serve_once(move |mut stream| {
            stream.write_all(&payload).unwrap();
            assert_eq!(wait_for_line(&stream), "done\n");
        });

        let mut transport = TcpTransport::builder()
            .address("127.0.0.1")
            .port(port)
            .read_timeout(Duration::from_secs(20))
            .build()
            .unwrap();
        let started = std::time::Instant::now();
        let data = transport.read_raw(Some(1024 * 1024)).unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(data, png);
        transport.write("done").unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_png_complete() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(b"\x00\x00\x00\x00IEND\xae\x42\x60\x82");
        assert!(png_complete(&png));
        assert!(!png_complete(&png[..png.len() - 1]));
        png.push(b'\n');
        assert!(png_complete(&png));
        assert!(!png_complete(b"1,2,3,IEND1234"));
    }

    #[test]
    fn test_read_raw_without_limit_reads_one_message() {
        let (port, handle) = serve_once(|mut stream| {
            stream.write_all(b"1,2,3\n4,5\n").unwrap();
            assert_eq!(wait_for_line(&stream), "done\n");
        });

        let mut transport = TcpTransport::connect("127.0.0.1", port).unwrap();
        assert_eq!(transport.read_raw(None).unwrap(), b"1,2,3\n");
        assert_eq!(transport.read_raw(None).unwrap(), b"4,5\n");
        transport.write("done").unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_set_timeout_applies_to_reads() {
        let (port, handle) = serve_once(|stream| {
            assert_eq!(wait_for_line(&stream), "done\n");
        });

        let mut transport = TcpTransport::connect("127.0.0.1", port).unwrap();
        assert_eq!(transport.config().read_timeout, Duration::from_secs(10));

        transport.set_timeout(Duration::from_millis(200)).unwrap();
        assert_eq!(transport.config().read_timeout, Duration::from_millis(200));
        let started = std::time::Instant::now();
        assert!(matches!(transport.read_raw(None), Err(ScopeError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(5));

        transport.write("done").unwrap();
        handle.join().unwrap();
    }
}
