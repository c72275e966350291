use log::debug;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::ScopeError;
use crate::transport::{TcpTransport, Transport};
use crate::types::Identity;

pub mod capture;
pub mod channels;
pub mod horizontal;
pub mod measurement;
pub mod rf;

pub use capture::{parse_ascii_curve, WaveformCapture, WaveformRequest};

/// Timeout applied at construction, long enough for a hardcopy transfer
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Where and how captures are stored
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    /// Directory for timestamp-named files when no path is given
    pub output_dir: PathBuf,
    /// Upper bound for a screen image transfer
    pub image_buffer_bytes: usize,
    /// Last point requested with `DATa:STOP`, larger than any record on purpose
    pub record_length: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            image_buffer_bytes: 1024 * 1024,
            record_length: 20_000,
        }
    }
}

/// Builder for [`TekScope`]
#[derive(Debug, Clone)]
pub struct TekScopeBuilder {
    timeout: Duration,
    debug: bool,
    capture: CaptureSettings,
}

impl Default for TekScopeBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            debug: false,
            capture: CaptureSettings::default(),
        }
    }
}

impl TekScopeBuilder {
    /// Builder with the 10 s timeout, debug logging off and default captures
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read timeout applied to the transport on build
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Log every command and reply at debug level
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Replace all capture settings
    pub fn capture(mut self, capture: CaptureSettings) -> Self {
        self.capture = capture;
        self
    }

    /// Set the directory for timestamp-named captures
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture.output_dir = dir.into();
        self
    }

    /// Apply the timeout to `transport` and wrap it in a session
    pub fn build<T: Transport>(self, mut transport: T) -> Result<TekScope<T>, ScopeError> {
        transport.set_timeout(self.timeout)?;
        Ok(TekScope {
            transport,
            timeout: self.timeout,
            debug: self.debug,
            capture: self.capture,
        })
    }
}

/// Session with a Tektronix MDO oscilloscope.
///
/// `TekScope` turns method calls into SCPI command strings and parses the
/// scalar replies. It owns the transport; every call takes `&mut self` and
/// runs a strictly ordered sequence of writes and queries. Inputs are
/// validated before the first write, so a rejected call leaves the
/// instrument untouched.
///
/// # Examples
///
/// ```
/// use rusty_mdo::{MockTransport, TekScope};
///
/// let mock = MockTransport::new().with_reply("HOR:SCA?", "1.0E-3");
/// let mut scope = TekScope::new(mock)?;
/// assert_eq!(scope.get_horizontal_scale()?, 1.0e-3);
/// # Ok::<(), rusty_mdo::ScopeError>(())
/// ```
///
/// Over the network:
///
/// ```no_run
/// use rusty_mdo::{TcpTransport, TekScope};
///
/// let transport = TcpTransport::connect("192.168.1.50", 4000)?;
/// let mut scope = TekScope::builder().debug(true).build(transport)?;
/// println!("{:?}", scope.identify()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TekScope<T: Transport> {
    transport: T,
    timeout: Duration,
    debug: bool,
    capture: CaptureSettings,
}

impl TekScope<TcpTransport> {
    /// Builder for a session. Works for any transport passed to
    /// [`TekScopeBuilder::build`].
    pub fn builder() -> TekScopeBuilder {
        TekScopeBuilder::new()
    }

    /// Open a TCP session using the connection and capture settings of `config`
    pub fn connect(config: &AppConfig) -> Result<Self, ScopeError> {
        let transport = TcpTransport::builder()
            .address(&config.connection.host)
            .port(config.connection.port)
            .connect_timeout(Duration::from_millis(config.connection.connect_timeout_ms))
            .build()?;
        Self::builder()
            .timeout(Duration::from_millis(config.connection.timeout_ms))
            .debug(config.connection.debug)
            .capture(config.capture.settings())
            .build(transport)
    }
}

impl<T: Transport> TekScope<T> {
    /// Session with the default 10 s timeout and debug logging off
    pub fn new(transport: T) -> Result<Self, ScopeError> {
        TekScopeBuilder::new().build(transport)
    }

    /// Toggle per-command debug logging
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn capture_settings(&self) -> &CaptureSettings {
        &self.capture
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// End the session and hand back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Query `*IDN?`
    pub fn identify(&mut self) -> Result<Identity, ScopeError> {
        let reply = self.ask("*IDN?")?;
        Ok(Identity::parse(&reply))
    }

    pub(crate) fn send(&mut self, command: &str) -> Result<(), ScopeError> {
        if self.debug {
            debug!("-> {command}");
        }
        self.transport.write(command)
    }

    /// Query and strip the trailing terminator
    pub(crate) fn ask(&mut self, command: &str) -> Result<String, ScopeError> {
        let reply = self.transport.query(command)?;
        let reply = reply.trim_end().to_string();
        if self.debug {
            debug!("{command} <- {reply}");
        }
        Ok(reply)
    }

    pub(crate) fn ask_f64(&mut self, command: &str) -> Result<f64, ScopeError> {
        let reply = self.ask(command)?;
        parse_number(command, &reply)
    }

    pub(crate) fn read_raw(&mut self, max_bytes: Option<usize>) -> Result<Vec<u8>, ScopeError> {
        let data = self.transport.read_raw(max_bytes)?;
        if self.debug {
            debug!("<- {} raw bytes", data.len());
        }
        Ok(data)
    }
}

/// Drop a leading `:HEADER` token from a reply sent with `HEADer 1`
pub(crate) fn strip_header(reply: &str) -> &str {
    let reply = reply.trim();
    if reply.starts_with(':') {
        reply
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim_start())
            .unwrap_or("")
    } else {
        reply
    }
}

pub(crate) fn parse_number(command: &str, reply: &str) -> Result<f64, ScopeError> {
    strip_header(reply).parse().map_err(|_| ScopeError::Parse {
        command: command.to_string(),
        reply: reply.to_string(),
    })
}

/// Format like C's `%e`: six decimals and an exponent of at least two digits
pub(crate) fn scientific(value: f64) -> String {
    let formatted = format!("{value:.6e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

/// Strip the quotes the instrument puts around string replies
pub(crate) fn unquote(reply: &str) -> String {
    let reply = reply.trim();
    let inner = reply
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(reply);
    inner.replace("\"\"", "\"")
}

/// IEEE 488.2 string argument: quoted, embedded quotes doubled
pub(crate) fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
