use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScopeError;

/// Analog input channel of a four channel MDO
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnalogChannel {
    Ch1 = 1,
    Ch2 = 2,
    Ch3 = 3,
    Ch4 = 4,
}

impl AnalogChannel {
    pub const ALL: [AnalogChannel; 4] = [
        AnalogChannel::Ch1,
        AnalogChannel::Ch2,
        AnalogChannel::Ch3,
        AnalogChannel::Ch4,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }
}

impl From<AnalogChannel> for u8 {
    fn from(channel: AnalogChannel) -> Self {
        channel as u8
    }
}

impl TryFrom<u8> for AnalogChannel {
    type Error = ScopeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AnalogChannel::Ch1),
            2 => Ok(AnalogChannel::Ch2),
            3 => Ok(AnalogChannel::Ch3),
            4 => Ok(AnalogChannel::Ch4),
            _ => Err(ScopeError::InvalidChannel(format!(
                "analog channel {value} (expected 1-4)"
            ))),
        }
    }
}

impl fmt::Display for AnalogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH{}", self.number())
    }
}

/// Digital input D0-D15
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DigitalChannel(u8);

impl DigitalChannel {
    pub const COUNT: u8 = 16;

    pub fn new(number: u8) -> Result<Self, ScopeError> {
        if number < Self::COUNT {
            Ok(Self(number))
        } else {
            Err(ScopeError::InvalidChannel(format!(
                "digital channel {number} (expected 0-15)"
            )))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = DigitalChannel> {
        (0..Self::COUNT).map(DigitalChannel)
    }
}

impl TryFrom<u8> for DigitalChannel {
    type Error = ScopeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for DigitalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// Analog bandwidth limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bandwidth {
    /// 20 MHz limit
    Limit20MHz,
    /// 250 MHz limit
    Limit250MHz,
    /// Full instrument bandwidth
    Full,
}

impl Bandwidth {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Bandwidth::Limit20MHz => "20E6",
            Bandwidth::Limit250MHz => "250E6",
            Bandwidth::Full => "FULl",
        }
    }

    /// Interpret a `CHx:BANdwidth?` reply.
    ///
    /// The instrument answers with the bandwidth in Hz. Anything that is not
    /// one of the two limit filters is reported as [`Bandwidth::Full`].
    pub fn from_reply(reply: &str) -> Option<Self> {
        let reply = reply.trim();
        if reply.eq_ignore_ascii_case("FULL") {
            return Some(Bandwidth::Full);
        }
        let hz: f64 = reply.parse().ok()?;
        if (hz - 20e6).abs() < 1.0 {
            Some(Bandwidth::Limit20MHz)
        } else if (hz - 250e6).abs() < 1.0 {
            Some(Bandwidth::Limit250MHz)
        } else {
            Some(Bandwidth::Full)
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Input coupling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coupling {
    Ac,
    Dc,
    DcReject,
}

impl Coupling {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Coupling::Ac => "AC",
            Coupling::Dc => "DC",
            Coupling::DcReject => "DCREJect",
        }
    }

    pub fn from_reply(reply: &str) -> Option<Self> {
        let reply = reply.trim().to_ascii_uppercase();
        if reply.starts_with("DCREJ") {
            Some(Coupling::DcReject)
        } else if reply == "DC" {
            Some(Coupling::Dc)
        } else if reply == "AC" {
            Some(Coupling::Ac)
        } else {
            None
        }
    }
}

impl fmt::Display for Coupling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Vertical setup of one analog channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogChannelConfig {
    pub label: String,
    /// Volts per division
    pub scale: f64,
    /// Offset in volts, center line is 0 V
    pub offset: f64,
    pub bandwidth: Bandwidth,
    pub coupling: Coupling,
}

impl AnalogChannelConfig {
    pub fn new(
        label: impl Into<String>,
        scale: f64,
        offset: f64,
        bandwidth: Bandwidth,
        coupling: Coupling,
    ) -> Self {
        Self {
            label: label.into(),
            scale,
            offset,
            bandwidth,
            coupling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl MathOperator {
    pub fn symbol(self) -> char {
        match self {
            MathOperator::Add => '+',
            MathOperator::Subtract => '-',
            MathOperator::Multiply => '*',
            MathOperator::Divide => '/',
        }
    }
}

impl TryFrom<char> for MathOperator {
    type Error = ScopeError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '+' => Ok(MathOperator::Add),
            '-' => Ok(MathOperator::Subtract),
            '*' => Ok(MathOperator::Multiply),
            '/' => Ok(MathOperator::Divide),
            other => Err(ScopeError::InvalidArgument(format!(
                "math operator {other:?} (expected + - * /)"
            ))),
        }
    }
}

/// Dual-source math waveform `source1 <op> source2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathChannelConfig {
    pub label: String,
    pub operator: MathOperator,
    pub source1: AnalogChannel,
    pub source2: AnalogChannel,
    pub vertical_scale: f64,
    pub vertical_center: f64,
}

impl MathChannelConfig {
    /// Expression written to `MATH:DEFine`, e.g. `CH1-CH2`
    pub fn expression(&self) -> String {
        format!(
            "{}{}{}",
            self.source1,
            self.operator.symbol(),
            self.source2
        )
    }
}

/// RF spectrum view settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RfConfig {
    /// Reference level in dB
    pub reference_level_db: f64,
    /// Vertical scale in dB/div
    pub scale_db_per_div: f64,
    pub start_hz: f64,
    pub stop_hz: f64,
    /// Resolution bandwidth, always applied in manual RBW mode
    pub rbw_hz: f64,
}

/// Edge trigger and horizontal delay.
///
/// The string fields are sent verbatim (`CH1`, `EDGE`, `RISe`, `AUTO`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub source: String,
    pub trigger_type: String,
    pub level: f64,
    /// Horizontal delay time in seconds
    pub delay: f64,
    pub slope: String,
    pub mode: String,
}

/// Signal source usable by measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Analog(AnalogChannel),
    Digital(DigitalChannel),
    External,
    Line,
    Aux,
}

impl Source {
    /// All 23 sources in instrument order
    pub fn all() -> Vec<Source> {
        AnalogChannel::ALL
            .into_iter()
            .map(Source::Analog)
            .chain(DigitalChannel::all().map(Source::Digital))
            .chain([Source::External, Source::Line, Source::Aux])
            .collect()
    }
}

impl From<AnalogChannel> for Source {
    fn from(channel: AnalogChannel) -> Self {
        Source::Analog(channel)
    }
}

impl From<DigitalChannel> for Source {
    fn from(channel: DigitalChannel) -> Self {
        Source::Digital(channel)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Analog(ch) => write!(f, "{ch}"),
            Source::Digital(ch) => write!(f, "{ch}"),
            Source::External => f.write_str("EXT"),
            Source::Line => f.write_str("LINE"),
            Source::Aux => f.write_str("AUX"),
        }
    }
}

impl FromStr for Source {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let numbered = |prefix: &str| -> Option<u8> {
            upper
                .strip_prefix(prefix)
                .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
                .and_then(|rest| rest.parse().ok())
        };

        match upper.as_str() {
            "EXT" => return Ok(Source::External),
            "LINE" => return Ok(Source::Line),
            "AUX" => return Ok(Source::Aux),
            _ => {}
        }
        if let Some(n) = numbered("CH") {
            return AnalogChannel::try_from(n)
                .map(Source::Analog)
                .map_err(|_| ScopeError::InvalidChannel(s.to_string()));
        }
        if let Some(n) = numbered("D") {
            return DigitalChannel::new(n)
                .map(Source::Digital)
                .map_err(|_| ScopeError::InvalidChannel(s.to_string()));
        }
        Err(ScopeError::InvalidChannel(s.to_string()))
    }
}

/// Source selected with `DATa:SOUrce` for curve transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Analog(AnalogChannel),
    Digital(DigitalChannel),
    Math,
    RfNormal,
}

impl DataSource {
    pub fn is_rf(self) -> bool {
        matches!(self, DataSource::RfNormal)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Analog(ch) => write!(f, "{ch}"),
            DataSource::Digital(ch) => write!(f, "{ch}"),
            DataSource::Math => f.write_str("MATH"),
            DataSource::RfNormal => f.write_str("RF_NORMal"),
        }
    }
}

impl From<AnalogChannel> for DataSource {
    fn from(channel: AnalogChannel) -> Self {
        DataSource::Analog(channel)
    }
}

impl From<DigitalChannel> for DataSource {
    fn from(channel: DigitalChannel) -> Self {
        DataSource::Digital(channel)
    }
}

/// Automated measurement kinds understood by `MEASUrement:...:TYPe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementType {
    Amplitude,
    Area,
    Burst,
    CycleArea,
    CycleMean,
    CycleRms,
    Delay,
    Fall,
    Frequency,
    High,
    Hits,
    Low,
    Maximum,
    Mean,
    Median,
    Minimum,
    NegativeDuty,
    NegativeEdgeCount,
    NegativeOvershoot,
    NegativePulseCount,
    NegativeWidth,
    PeakHits,
    PositiveDuty,
    PositiveEdgeCount,
    Period,
    Phase,
    PeakToPeak,
    PositiveOvershoot,
    PositivePulseCount,
    PositiveWidth,
    Rise,
    Rms,
    Sigma1,
    Sigma2,
    Sigma3,
    StdDev,
    Waveforms,
}

impl MeasurementType {
    pub const ALL: [MeasurementType; 37] = [
        MeasurementType::Amplitude,
        MeasurementType::Area,
        MeasurementType::Burst,
        MeasurementType::CycleArea,
        MeasurementType::CycleMean,
        MeasurementType::CycleRms,
        MeasurementType::Delay,
        MeasurementType::Fall,
        MeasurementType::Frequency,
        MeasurementType::High,
        MeasurementType::Hits,
        MeasurementType::Low,
        MeasurementType::Maximum,
        MeasurementType::Mean,
        MeasurementType::Median,
        MeasurementType::Minimum,
        MeasurementType::NegativeDuty,
        MeasurementType::NegativeEdgeCount,
        MeasurementType::NegativeOvershoot,
        MeasurementType::NegativePulseCount,
        MeasurementType::NegativeWidth,
        MeasurementType::PeakHits,
        MeasurementType::PositiveDuty,
        MeasurementType::PositiveEdgeCount,
        MeasurementType::Period,
        MeasurementType::Phase,
        MeasurementType::PeakToPeak,
        MeasurementType::PositiveOvershoot,
        MeasurementType::PositivePulseCount,
        MeasurementType::PositiveWidth,
        MeasurementType::Rise,
        MeasurementType::Rms,
        MeasurementType::Sigma1,
        MeasurementType::Sigma2,
        MeasurementType::Sigma3,
        MeasurementType::StdDev,
        MeasurementType::Waveforms,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            MeasurementType::Amplitude => "AMPLITUDE",
            MeasurementType::Area => "AREA",
            MeasurementType::Burst => "BURST",
            MeasurementType::CycleArea => "CAREA",
            MeasurementType::CycleMean => "CMEAN",
            MeasurementType::CycleRms => "CRMS",
            MeasurementType::Delay => "DELAY",
            MeasurementType::Fall => "FALL",
            MeasurementType::Frequency => "FREQUENCY",
            MeasurementType::High => "HIGH",
            MeasurementType::Hits => "HITS",
            MeasurementType::Low => "LOW",
            MeasurementType::Maximum => "MAXIMUM",
            MeasurementType::Mean => "MEAN",
            MeasurementType::Median => "MEDIAN",
            MeasurementType::Minimum => "MINIMUM",
            MeasurementType::NegativeDuty => "NDUTY",
            MeasurementType::NegativeEdgeCount => "NEDGECOUNT",
            MeasurementType::NegativeOvershoot => "NOVERSHOOT",
            MeasurementType::NegativePulseCount => "NPULSECOUNT",
            MeasurementType::NegativeWidth => "NWIDTH",
            MeasurementType::PeakHits => "PEAKHITS",
            MeasurementType::PositiveDuty => "PDUTY",
            MeasurementType::PositiveEdgeCount => "PEDGECOUNT",
            MeasurementType::Period => "PERIOD",
            MeasurementType::Phase => "PHASE",
            MeasurementType::PeakToPeak => "PK2PK",
            MeasurementType::PositiveOvershoot => "POVERSHOOT",
            MeasurementType::PositivePulseCount => "PPULSECOUNT",
            MeasurementType::PositiveWidth => "PWIDTH",
            MeasurementType::Rise => "RISE",
            MeasurementType::Rms => "RMS",
            MeasurementType::Sigma1 => "SIGMA1",
            MeasurementType::Sigma2 => "SIGMA2",
            MeasurementType::Sigma3 => "SIGMA3",
            MeasurementType::StdDev => "STDDEV",
            MeasurementType::Waveforms => "WAVEFORMS",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for MeasurementType {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MeasurementType::ALL
            .into_iter()
            .find(|kind| kind.mnemonic().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ScopeError::InvalidMeasurementType(s.to_string()))
    }
}

/// On-screen measurement slot 1-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeasurementSlot(u8);

impl MeasurementSlot {
    pub fn new(slot: u8) -> Result<Self, ScopeError> {
        if (1..=8).contains(&slot) {
            Ok(Self(slot))
        } else {
            Err(ScopeError::InvalidSlot(slot))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MeasurementSlot {
    type Error = ScopeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A validated measurement request.
///
/// Without a slot the measurement is taken immediately and not displayed;
/// with a slot it is installed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub source: Source,
    pub kind: MeasurementType,
    pub slot: Option<MeasurementSlot>,
}

impl Measurement {
    pub fn new(source: Source, kind: MeasurementType) -> Self {
        Self {
            source,
            kind,
            slot: None,
        }
    }

    pub fn with_slot(mut self, slot: MeasurementSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Build a measurement from raw names, e.g. `("CH1", "FREQUENCY", None)`.
    pub fn parse(channel: &str, kind: &str, slot: Option<u8>) -> Result<Self, ScopeError> {
        let kind = kind.parse()?;
        let slot = slot.map(MeasurementSlot::new).transpose()?;
        let source = channel.parse()?;
        Ok(Self { source, kind, slot })
    }
}

/// Screen background used for hardcopies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackColor {
    /// Ink saver on
    #[default]
    White,
    Black,
}

/// Parsed `*IDN?` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl Identity {
    pub fn parse(reply: &str) -> Self {
        let mut fields = reply.trim().splitn(4, ',').map(|f| f.trim().to_string());
        Self {
            manufacturer: fields.next().unwrap_or_default(),
            model: fields.next().unwrap_or_default(),
            serial: fields.next().unwrap_or_default(),
            firmware: fields.next().unwrap_or_default(),
        }
    }

    /// Number of analog inputs, derived from the Tektronix model number.
    ///
    /// The last digit of the numeric part is the channel count
    /// (`MDO4104B-6` -> 4, `MDO3012` -> 2). `None` for unknown models.
    pub fn analog_channel_count(&self) -> Option<usize> {
        if !self.manufacturer.eq_ignore_ascii_case("TEKTRONIX") {
            return None;
        }
        let digits: String = self
            .model
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.len() < 4 {
            return None;
        }
        digits
            .chars()
            .last()
            .and_then(|c| c.to_digit(10))
            .map(|n| n as usize)
            .filter(|&n| n == 2 || n == 4)
    }
}
