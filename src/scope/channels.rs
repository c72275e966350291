use log::info;
use std::collections::BTreeMap;

use super::{quoted, unquote, TekScope};
use crate::error::ScopeError;
use crate::transport::Transport;
use crate::types::{
    AnalogChannel, AnalogChannelConfig, Bandwidth, Coupling, DigitalChannel, MathChannelConfig,
};

fn validate_analog(
    analog: &BTreeMap<u8, AnalogChannelConfig>,
) -> Result<Vec<(AnalogChannel, &AnalogChannelConfig)>, ScopeError> {
    analog
        .iter()
        .map(|(&number, config)| Ok((AnalogChannel::try_from(number)?, config)))
        .collect()
}

fn validate_digital(
    digital: &BTreeMap<u8, String>,
) -> Result<Vec<(DigitalChannel, &str)>, ScopeError> {
    digital
        .iter()
        .map(|(&number, label)| Ok((DigitalChannel::new(number)?, label.as_str())))
        .collect()
}

impl<T: Transport> TekScope<T> {
    /// Read back every displayed analog channel, keyed by channel number
    pub fn get_analog_channel_setup(
        &mut self,
    ) -> Result<BTreeMap<u8, AnalogChannelConfig>, ScopeError> {
        let mut setup = BTreeMap::new();
        for channel in AnalogChannel::ALL {
            if self.ask(&format!("sel:{channel}?"))? != "1" {
                continue;
            }
            let label = unquote(&self.ask(&format!("{channel}:LABel?"))?);
            let scale = self.ask_f64(&format!("{channel}:SCAle?"))?;
            let offset = self.ask_f64(&format!("{channel}:OFFSet?"))?;

            let command = format!("{channel}:BANdwidth?");
            let reply = self.ask(&command)?;
            let bandwidth = Bandwidth::from_reply(&reply)
                .ok_or(ScopeError::Parse { command, reply })?;

            let command = format!("{channel}:COUPling?");
            let reply = self.ask(&command)?;
            let coupling =
                Coupling::from_reply(&reply).ok_or(ScopeError::Parse { command, reply })?;

            setup.insert(
                channel.number(),
                AnalogChannelConfig {
                    label,
                    scale,
                    offset,
                    bandwidth,
                    coupling,
                },
            );
        }
        Ok(setup)
    }

    /// Enable and configure the given analog channels (keys 1-4).
    ///
    /// All keys are checked before anything is written.
    pub fn set_analog_channel_setup(
        &mut self,
        analog: &BTreeMap<u8, AnalogChannelConfig>,
    ) -> Result<(), ScopeError> {
        let channels = validate_analog(analog)?;
        for (channel, config) in channels {
            self.write_analog_channel(channel, config)?;
        }
        Ok(())
    }

    /// Read back the labels of all displayed digital channels
    pub fn get_digital_channel_setup(&mut self) -> Result<BTreeMap<u8, String>, ScopeError> {
        let mut setup = BTreeMap::new();
        for channel in DigitalChannel::all() {
            if self.ask(&format!("sel:{channel}?"))? == "1" {
                let label = unquote(&self.ask(&format!("{channel}:LABel?"))?);
                setup.insert(channel.number(), label);
            }
        }
        Ok(setup)
    }

    /// Enable and label the given digital channels (keys 0-15)
    pub fn set_digital_channel_setup(
        &mut self,
        digital: &BTreeMap<u8, String>,
    ) -> Result<(), ScopeError> {
        let channels = validate_digital(digital)?;
        for (channel, label) in channels {
            self.write_digital_channel(channel, label)?;
        }
        Ok(())
    }

    /// Replace the whole channel display.
    ///
    /// Turns off every analog channel, digital channel and the math
    /// waveform, then enables exactly the supplied ones. Fails with
    /// [`ScopeError::ModelMismatch`] before any write when the connected
    /// model has fewer analog inputs than requested.
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use rusty_mdo::{AnalogChannelConfig, Bandwidth, Coupling, MockTransport, TekScope};
    ///
    /// let mock = MockTransport::new().with_reply("*IDN?", "TEKTRONIX,MDO4104B-6,C0,FV");
    /// let mut scope = TekScope::new(mock)?;
    ///
    /// let analog = BTreeMap::from([
    ///     (1, AnalogChannelConfig::new("VSIG_1", 0.5, 0.0, Bandwidth::Limit20MHz, Coupling::Dc)),
    /// ]);
    /// let digital = BTreeMap::from([(0, "dig_sig1".to_string())]);
    /// scope.channel_setup(&analog, &digital, None)?;
    /// # Ok::<(), rusty_mdo::ScopeError>(())
    /// ```
    pub fn channel_setup(
        &mut self,
        analog: &BTreeMap<u8, AnalogChannelConfig>,
        digital: &BTreeMap<u8, String>,
        math: Option<&MathChannelConfig>,
    ) -> Result<(), ScopeError> {
        let identity = self.identify()?;
        if let Some(available) = identity.analog_channel_count() {
            let highest = analog.keys().next_back().copied().unwrap_or(0) as usize;
            if analog.len() > available || highest > available {
                return Err(ScopeError::ModelMismatch {
                    model: identity.model,
                    requested: analog.len().max(highest),
                    available,
                });
            }
        }

        let analog = validate_analog(analog)?;
        let digital = validate_digital(digital)?;

        for channel in AnalogChannel::ALL {
            self.send(&format!("sel:{channel} off"))?;
        }
        for (channel, config) in analog {
            self.write_analog_channel(channel, config)?;
        }

        for channel in DigitalChannel::all() {
            self.send(&format!("sel:{channel} off"))?;
        }
        for (channel, label) in digital {
            self.write_digital_channel(channel, label)?;
        }

        self.send("sel:MATH off")?;
        if let Some(math) = math {
            self.send("sel:MATH on")?;
            self.send(&format!("MATH:LABel {}", quoted(&math.label)))?;
            self.send("MATH:TYPe DUAL")?;
            let expression = math.expression();
            info!("Math waveform defined as {expression}");
            self.send(&format!("MATH:DEFine \"{expression}\""))?;
            self.send(&format!("MATH:VERTical:POSition {}", math.vertical_center))?;
            self.send(&format!("MATH:VERTical:SCAle {}", math.vertical_scale))?;
        }
        Ok(())
    }

    fn write_analog_channel(
        &mut self,
        channel: AnalogChannel,
        config: &AnalogChannelConfig,
    ) -> Result<(), ScopeError> {
        self.send(&format!("sel:{channel} on"))?;
        self.send(&format!("{channel}:LABel {}", quoted(&config.label)))?;
        self.send(&format!("{channel}:SCAle {}", config.scale))?;
        self.send(&format!("{channel}:OFFSet {}", config.offset))?;
        self.send(&format!("{channel}:BANdwidth {}", config.bandwidth))?;
        self.send(&format!("{channel}:COUPling {}", config.coupling))
    }

    fn write_digital_channel(
        &mut self,
        channel: DigitalChannel,
        label: &str,
    ) -> Result<(), ScopeError> {
        self.send(&format!("sel:{channel} on"))?;
        self.send(&format!("{channel}:LABel {}", quoted(label)))
    }
}
