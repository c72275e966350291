use super::{scientific, TekScope};
use crate::error::ScopeError;
use crate::transport::Transport;
use crate::types::TriggerConfig;

impl<T: Transport> TekScope<T> {
    /// Horizontal scale in seconds per division
    pub fn get_horizontal_scale(&mut self) -> Result<f64, ScopeError> {
        self.ask_f64("HOR:SCA?")
    }

    pub fn set_horizontal_scale(&mut self, seconds_per_div: f64) -> Result<(), ScopeError> {
        self.send(&format!("HOR:SCA {}", scientific(seconds_per_div)))
    }

    /// Read the A trigger edge setup and the horizontal delay
    pub fn get_trigger_setup(&mut self) -> Result<TriggerConfig, ScopeError> {
        Ok(TriggerConfig {
            source: self.ask("TRIG:A:EDGE:SOUrce?")?,
            trigger_type: self.ask("TRIG:A:TYPE?")?,
            level: self.ask_f64("TRIG:A:LEVEL?")?,
            delay: self.ask_f64("HOR:DEL:TIME?")?,
            slope: self.ask("TRIG:A:EDGE:SLOPE?")?,
            mode: self.ask("TRIG:A:MOD?")?,
        })
    }

    pub fn set_trigger_setup(&mut self, trigger: &TriggerConfig) -> Result<(), ScopeError> {
        self.send(&format!("TRIG:A:EDGE:SOUrce {}", trigger.source))?;
        self.send(&format!("TRIG:A:TYPE {}", trigger.trigger_type))?;
        self.send(&format!("TRIG:A:LEVEL {}", trigger.level))?;
        self.send(&format!("HOR:DEL:TIME {}", trigger.delay))?;
        self.send(&format!("TRIG:A:EDGE:SLOPE {}", trigger.slope))?;
        self.send(&format!("TRIG:A:MOD {}", trigger.mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_set_horizontal_scale_uses_exponent_format() {
        let mut scope = TekScope::new(MockTransport::new()).unwrap();
        scope.set_horizontal_scale(1e-3).unwrap();
        assert_eq!(scope.transport().writes(), ["HOR:SCA 1.000000e-03"]);
        assert_eq!(scope.get_horizontal_scale().unwrap(), 1e-3);
    }

    #[test]
    fn test_trigger_round_trip() {
        let mut scope = TekScope::new(MockTransport::new()).unwrap();
        let trigger = TriggerConfig {
            source: "CH1".to_string(),
            trigger_type: "EDGE".to_string(),
            level: 0.25,
            delay: 1e-6,
            slope: "RISe".to_string(),
            mode: "NORMal".to_string(),
        };
        scope.set_trigger_setup(&trigger).unwrap();
        assert_eq!(
            scope.transport().writes(),
            [
                "TRIG:A:EDGE:SOUrce CH1",
                "TRIG:A:TYPE EDGE",
                "TRIG:A:LEVEL 0.25",
                "HOR:DEL:TIME 0.000001",
                "TRIG:A:EDGE:SLOPE RISe",
                "TRIG:A:MOD NORMal",
            ]
        );
        assert_eq!(scope.get_trigger_setup().unwrap(), trigger);
    }

    #[test]
    fn test_trigger_reply_parsing() {
        let mock = MockTransport::new()
            .with_reply("TRIG:A:EDGE:SOUrce?", "CH2")
            .with_reply("TRIG:A:TYPE?", "EDGE")
            .with_reply("TRIG:A:LEVEL?", "1.2000E+00")
            .with_reply("HOR:DEL:TIME?", "-5.0000E-06")
            .with_reply("TRIG:A:EDGE:SLOPE?", "FALL")
            .with_reply("TRIG:A:MOD?", "AUTO");
        let mut scope = TekScope::new(mock).unwrap();
        let trigger = scope.get_trigger_setup().unwrap();
        assert_eq!(trigger.source, "CH2");
        assert_eq!(trigger.level, 1.2);
        assert_eq!(trigger.delay, -5e-6);
        assert_eq!(trigger.mode, "AUTO");
        assert!(scope.transport().writes().is_empty());
    }
}
