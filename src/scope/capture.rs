use chrono::Local;
use log::info;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::rf::rf_display_gain;
use super::{strip_header, TekScope};
use crate::error::ScopeError;
use crate::transport::Transport;
use crate::types::{BackColor, DataSource};

/// Parameters of a curve transfer to a text file
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformRequest {
    /// Target file, `.txt` is appended when missing. `None` picks a
    /// timestamped name in the capture directory.
    pub path: Option<PathBuf>,
    pub source: DataSource,
    /// Bytes per sample, 1 or 2
    pub width: u8,
    /// Append to an existing file instead of replacing it
    pub append: bool,
    /// Written between the existing content and the new payload when appending
    pub boundary: String,
}

impl Default for WaveformRequest {
    fn default() -> Self {
        Self {
            path: None,
            source: DataSource::RfNormal,
            width: 2,
            append: false,
            boundary: String::new(),
        }
    }
}

impl WaveformRequest {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn width(mut self, width: u8) -> Self {
        self.width = width;
        self
    }

    pub fn append(mut self, boundary: impl Into<String>) -> Self {
        self.append = true;
        self.boundary = boundary.into();
        self
    }
}

/// Result of [`TekScope::get_channel_waveform_data`]
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformCapture {
    pub path: PathBuf,
    /// Size of the curve payload, boundary excluded
    pub bytes: usize,
    /// Display gain derived from the RF reference level, RF sources only
    pub rf_gain: Option<f64>,
}

/// Curve data fetched without touching the filesystem
#[derive(Debug, Clone, PartialEq)]
pub struct RawCurve {
    /// Seconds (or Hz for RF) between samples, from `WFMOutpre:XINcr?`
    pub x_increment: f64,
    pub data: Vec<u8>,
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    if path.to_string_lossy().ends_with(suffix) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> ScopeError {
    let context = format!("Writing {}", path.display());
    move |source| ScopeError::Io { source, context }
}

/// Parse a comma separated ASCII curve (`DATa:ENCdg ASCIi`) into samples
pub fn parse_ascii_curve(data: &[u8]) -> Result<Vec<f64>, ScopeError> {
    let text = String::from_utf8_lossy(data);
    let body = strip_header(&text);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    body.split(',')
        .map(|sample| {
            sample.trim().parse::<f64>().map_err(|_| ScopeError::Parse {
                command: "CURVe?".to_string(),
                reply: sample.to_string(),
            })
        })
        .collect()
}

impl<T: Transport> TekScope<T> {
    /// Save a PNG screenshot and return its size in bytes.
    ///
    /// Without a path the file lands in the capture directory as
    /// `tek_<timestamp>.png`; a path not ending in `.png` gets the suffix
    /// appended.
    pub fn get_screen_image(
        &mut self,
        path: Option<&Path>,
        backcolor: BackColor,
    ) -> Result<usize, ScopeError> {
        match backcolor {
            BackColor::White => self.send("SAVe:IMAGe:INKSaver ON")?,
            BackColor::Black => self.send("SAVe:IMAGe:INKSaver OFF")?,
        }
        self.send("SAVe:IMAGe:FILEFormat PNG")?;
        self.send("HARDCopy STARt")?;
        let image = self.read_raw(Some(self.capture.image_buffer_bytes))?;

        let path = match path {
            Some(path) => with_suffix(path, ".png"),
            None => self
                .capture
                .output_dir
                .join(format!("tek_{}.png", timestamp())),
        };
        std::fs::write(&path, &image).map_err(write_error(&path))?;

        info!("Saved {} byte screen image to {}", image.len(), path.display());
        Ok(image.len())
    }

    /// Transfer the curve of `request.source` as ASCII into a text file.
    ///
    /// For RF sources the reference level is read to derive the display
    /// gain reported in [`WaveformCapture::rf_gain`].
    pub fn get_channel_waveform_data(
        &mut self,
        request: &WaveformRequest,
    ) -> Result<WaveformCapture, ScopeError> {
        if !(1..=2).contains(&request.width) {
            return Err(ScopeError::InvalidArgument(format!(
                "data width {} (expected 1 or 2)",
                request.width
            )));
        }

        self.send(&format!("DATa:SOUrce {}", request.source))?;
        self.send(&format!("DATa:WIDth {}", request.width))?;
        self.send("DATa:STARt 1")?;
        self.send(&format!("DATa:STOP {}", self.capture.record_length))?;
        self.send("DATa:ENCdg ASCIi")?;
        self.send("HEADer 1")?;
        self.send("VERBose ON")?;
        // the preamble must be read before CURVe? is accepted
        self.ask("WFMOutpre?")?;
        self.send("HEADer 0")?;

        let rf_gain = if request.source.is_rf() {
            let reference_level = self.get_rf_reference_level()?;
            let gain = rf_display_gain(reference_level);
            info!("RF reference level {reference_level} dB, display gain {gain}");
            Some(gain)
        } else {
            None
        };

        self.send("CURVe?")?;
        let curve = self.read_raw(None)?;

        let path = match &request.path {
            Some(path) => with_suffix(path, ".txt"),
            None => self
                .capture
                .output_dir
                .join(format!("tek_wfm_data_{}.txt", timestamp())),
        };

        let appending = request.append && path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(appending)
            .truncate(!appending)
            .open(&path)
            .map_err(write_error(&path))?;
        if appending {
            file.write_all(request.boundary.as_bytes())
                .map_err(write_error(&path))?;
        }
        file.write_all(&curve).map_err(write_error(&path))?;

        info!(
            "{} {} curve bytes from {} to {}",
            if appending { "Appended" } else { "Wrote" },
            curve.len(),
            request.source,
            path.display()
        );

        Ok(WaveformCapture {
            path,
            bytes: curve.len(),
            rf_gain,
        })
    }

    /// Fetch the ASCII curve of `source` at two bytes per sample
    pub fn fetch_curve(&mut self, source: DataSource) -> Result<RawCurve, ScopeError> {
        self.send(&format!("DATa:SOUrce {source}"))?;
        self.send("DATa:ENCdg ASCIi")?;
        self.send("DATa:WIDth 2")?;
        self.send("HEADer 0")?;
        let x_increment = self.ask_f64("WFMOutpre:XINcr?")?;
        self.send("CURVe?")?;
        let data = self.read_raw(None)?;
        Ok(RawCurve { x_increment, data })
    }
}
