use super::TekScope;
use crate::error::ScopeError;
use crate::transport::Transport;
use crate::types::{Measurement, MeasurementSlot, MeasurementType, Source};

impl<T: Transport> TekScope<T> {
    /// Take an immediate measurement without putting it on screen
    pub fn measure_no_display(
        &mut self,
        source: Source,
        kind: MeasurementType,
    ) -> Result<f64, ScopeError> {
        self.send(&format!("MEASU:IMM:SOU1 {source}"))?;
        self.send(&format!("MEASU:IMM:TYPE {kind}"))?;
        self.ask_f64("MEASU:IMM:VAL?")
    }

    /// Install a single-source measurement in an on-screen slot
    pub fn measure_with_display(
        &mut self,
        slot: MeasurementSlot,
        source: Source,
        kind: MeasurementType,
    ) -> Result<(), ScopeError> {
        let n = slot.number();
        self.send(&format!("MEASUrement:MEAS{n}:SOUrce1 {source}"))?;
        self.send(&format!("MEASUrement:MEAS{n}:TYPe {kind}"))?;
        self.send(&format!("MEASUrement:MEAS{n}:STATE ON"))
    }

    /// Current value of a displayed measurement slot
    pub fn measurement_value(&mut self, slot: MeasurementSlot) -> Result<f64, ScopeError> {
        self.ask_f64(&format!("MEASUrement:MEAS{}:VALue?", slot.number()))
    }

    /// Run `measurement`: immediate when it has no slot, on screen otherwise.
    ///
    /// Returns the value only for immediate measurements.
    ///
    /// ```
    /// use rusty_mdo::{Measurement, MockTransport, TekScope};
    ///
    /// let mock = MockTransport::new().with_reply("MEASU:IMM:VAL?", "1.0E6");
    /// let mut scope = TekScope::new(mock)?;
    ///
    /// let frequency = Measurement::parse("CH1", "FREQUENCY", None)?;
    /// assert_eq!(scope.measure(&frequency)?, Some(1.0e6));
    ///
    /// assert!(Measurement::parse("CH1", "LOUDNESS", None).is_err());
    /// # Ok::<(), rusty_mdo::ScopeError>(())
    /// ```
    pub fn measure(&mut self, measurement: &Measurement) -> Result<Option<f64>, ScopeError> {
        match measurement.slot {
            Some(slot) => {
                self.measure_with_display(slot, measurement.source, measurement.kind)?;
                Ok(None)
            }
            None => self
                .measure_no_display(measurement.source, measurement.kind)
                .map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use crate::types::AnalogChannel;

    fn measure_str(
        scope: &mut TekScope<MockTransport>,
        channel: &str,
        kind: &str,
    ) -> Result<f64, ScopeError> {
        let source = channel.parse()?;
        let kind = kind.parse()?;
        scope.measure_no_display(source, kind)
    }

    #[test]
    fn test_measure_no_display() {
        let mock = MockTransport::new().with_reply("MEASU:IMM:VAL?", "9.9999E+05");
        let mut scope = TekScope::new(mock).unwrap();
        let value = scope
            .measure_no_display(AnalogChannel::Ch1.into(), MeasurementType::Frequency)
            .unwrap();
        assert_eq!(value, 9.9999e5);
        assert_eq!(
            scope.transport().writes(),
            ["MEASU:IMM:SOU1 CH1", "MEASU:IMM:TYPE FREQUENCY"]
        );
    }

    #[test]
    fn test_unknown_measurement_type_writes_nothing() {
        let mock = MockTransport::new().with_reply("MEASU:IMM:VAL?", "1");
        let mut scope = TekScope::new(mock).unwrap();
        for bad in ["VOLTS", "frequency2", "HIGH,HITS", "LOW,MAXIMUM", "NOVERSHOO", ""] {
            assert!(matches!(
                measure_str(&mut scope, "CH1", bad),
                Err(ScopeError::InvalidMeasurementType(_))
            ));
        }
        assert!(matches!(
            measure_str(&mut scope, "CH7", "RMS"),
            Err(ScopeError::InvalidChannel(_))
        ));
        assert!(scope.transport().writes().is_empty());
        assert!(scope.transport().queries().is_empty());
    }

    #[test]
    fn test_every_source_and_type_is_accepted() {
        let mock = MockTransport::new().with_reply("MEASU:IMM:VAL?", "0.0");
        let mut scope = TekScope::new(mock).unwrap();
        for source in Source::all() {
            for kind in MeasurementType::ALL {
                measure_str(&mut scope, &source.to_string(), kind.mnemonic()).unwrap();
            }
        }
        assert_eq!(scope.transport().writes().len(), 23 * 37 * 2);
    }

    #[test]
    fn test_measure_with_display() {
        let mut scope = TekScope::new(MockTransport::new()).unwrap();
        let slot = MeasurementSlot::new(3).unwrap();
        scope
            .measure_with_display(slot, "D5".parse().unwrap(), MeasurementType::PositiveDuty)
            .unwrap();
        assert_eq!(
            scope.transport().writes(),
            [
                "MEASUrement:MEAS3:SOUrce1 D5",
                "MEASUrement:MEAS3:TYPe PDUTY",
                "MEASUrement:MEAS3:STATE ON",
            ]
        );
        assert!(scope.transport().queries().is_empty());
    }

    #[test]
    fn test_slot_out_of_range() {
        assert!(matches!(MeasurementSlot::new(0), Err(ScopeError::InvalidSlot(0))));
        assert!(matches!(MeasurementSlot::new(9), Err(ScopeError::InvalidSlot(9))));
    }

    #[test]
    fn test_typed_measurement_builder() {
        let mut scope = TekScope::new(MockTransport::new()).unwrap();
        scope.transport_mut().set_reply("MEASU:IMM:VAL?", "0.25");

        let rms = Measurement::new(AnalogChannel::Ch3.into(), MeasurementType::Rms);
        assert_eq!(rms, Measurement::parse("CH3", "rms", None).unwrap());
        assert_eq!(scope.measure(&rms).unwrap(), Some(0.25));

        let slot = MeasurementSlot::new(2).unwrap();
        let on_screen = rms.with_slot(slot);
        assert_eq!(on_screen.slot, Some(slot));
        assert_eq!(scope.measure(&on_screen).unwrap(), None);
        assert_eq!(
            scope.transport().writes()[2..],
            [
                "MEASUrement:MEAS2:SOUrce1 CH3",
                "MEASUrement:MEAS2:TYPe RMS",
                "MEASUrement:MEAS2:STATE ON",
            ]
        );
    }

    #[test]
    fn test_measure_dispatch_and_readback() {
        let mut scope = TekScope::new(MockTransport::new()).unwrap();
        scope.transport_mut().set_reply("MEASUrement:MEAS8:VALue?", "3.3");

        let on_screen = Measurement::parse("CH4", "PK2PK", Some(8)).unwrap();
        assert_eq!(scope.measure(&on_screen).unwrap(), None);
        assert_eq!(
            scope.measurement_value(on_screen.slot.unwrap()).unwrap(),
            3.3
        );
    }
}
