use super::TekScope;
use crate::error::ScopeError;
use crate::transport::Transport;
use crate::types::RfConfig;

impl<T: Transport> TekScope<T> {
    /// Turn on the RF frequency-domain trace and apply `rf`.
    ///
    /// Resolution bandwidth is always switched to manual mode first.
    pub fn rf_channel_setup(&mut self, rf: &RfConfig) -> Result<(), ScopeError> {
        self.send("SELect:RF_NORMAL ON")?;
        self.send(&format!("RF:REFLevel {}", rf.reference_level_db))?;
        self.send(&format!("RF:SCAle {}", rf.scale_db_per_div))?;
        self.send(&format!("RF:STARt {}", rf.start_hz))?;
        self.send(&format!("RF:STOP {}", rf.stop_hz))?;
        self.send("RF:RBW:MODe MANual")?;
        self.send(&format!("RF:RBW {}", rf.rbw_hz))
    }

    /// RF reference level in dB
    pub fn get_rf_reference_level(&mut self) -> Result<f64, ScopeError> {
        self.ask_f64("RF:REFLevel?")
    }
}

/// Linear gain that maps RF curve data onto the displayed trace
pub fn rf_display_gain(reference_level_db: f64) -> f64 {
    10f64.powf(-reference_level_db / 10.0)
}
