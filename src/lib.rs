pub mod config;
pub mod error;
pub mod scope;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{load_config, load_config_or_default, AppConfig};
pub use error::ScopeError;
pub use scope::{
    capture::RawCurve, parse_ascii_curve, rf::rf_display_gain, CaptureSettings, TekScope,
    TekScopeBuilder, WaveformCapture, WaveformRequest,
};
pub use transport::{ConnectionConfig, MockTransport, TcpTransport, TcpTransportBuilder, Transport};
pub use types::{
    AnalogChannel, AnalogChannelConfig, BackColor, Bandwidth, Coupling, DataSource,
    DigitalChannel, Identity, MathChannelConfig, MathOperator, Measurement, MeasurementSlot,
    MeasurementType, RfConfig, Source, TriggerConfig,
};
