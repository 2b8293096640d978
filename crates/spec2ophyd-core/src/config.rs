//! SPEC config file reader
//!
//! Reads a SPEC `config` file in one pass. Devices go into a [`DeviceTable`];
//! motors and counters are resolved against it right away and collected, in
//! file order, together with the signals they give rise to.

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classify::{classify, LineKind};
use crate::counter::Counter;
use crate::device::{DeviceKind, DeviceTable};
use crate::fields::FieldError;
use crate::motor::Motor;
use crate::signal::Signal;

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config-8idi";

#[derive(Error, Debug)]
pub enum SpecConfigError {
    #[error("Failed to read SPEC config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Malformed device declaration on line {line}: {source}")]
    MalformedDevice {
        line: usize,
        #[source]
        source: FieldError,
    },
}

/// One emit-able record, in file order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Entry {
    Signal(Signal),
    Motor(Motor),
    Counter(Counter),
}

/// Motor or counter line that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedLine {
    pub line_number: usize,
    pub raw: String,
    pub reason: FieldError,
}

/// Parsed SPEC configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpecConfig {
    pub devices: DeviceTable,
    pub collection: Vec<Entry>,
    /// Lines no rule recognized
    pub unhandled: Vec<String>,
    pub rejected: Vec<RejectedLine>,
    /// Scaler prefixes that already have a signal
    #[serde(skip)]
    scalers: HashSet<String>,
}

impl SpecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a SPEC config file
    pub fn from_file(path: &Path) -> Result<Self, SpecConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        info!(
            path = %path.display(),
            devices = config.devices.len(),
            records = config.collection.len(),
            unhandled = config.unhandled.len(),
            rejected = config.rejected.len(),
            "Read SPEC config"
        );
        Ok(config)
    }

    /// Parse SPEC config text
    pub fn parse(content: &str) -> Result<Self, SpecConfigError> {
        let mut config = Self::new();
        // position in `collection` of the motor that MOTPAR lines attach to
        let mut open_motor: Option<usize> = None;

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();

            match classify(line) {
                LineKind::Skip => {}
                LineKind::Device(kind) => {
                    open_motor = None;
                    config.add_device(kind, line, line_number)?;
                }
                LineKind::MotorParameter(text) => {
                    match open_motor.and_then(|i| config.collection.get_mut(i)) {
                        Some(Entry::Motor(motor)) => motor.motpar.push(text.to_string()),
                        _ => {
                            warn!(line = line_number, "MOTPAR line without a preceding motor");
                            config.unhandled.push(line.to_string());
                        }
                    }
                }
                LineKind::Counter => {
                    open_motor = None;
                    config.add_counter(line, line_number);
                }
                LineKind::Motor => {
                    open_motor = config.add_motor(line, line_number);
                }
                LineKind::Unrecognized => {
                    debug!(line = line_number, text = line, "Unhandled line");
                    config.unhandled.push(line.to_string());
                }
            }
        }

        Ok(config)
    }

    fn add_device(
        &mut self,
        kind: DeviceKind,
        line: &str,
        line_number: usize,
    ) -> Result<(), SpecConfigError> {
        let device = self
            .devices
            .declare(kind, line, line_number)
            .map_err(|source| SpecConfigError::MalformedDevice {
                line: line_number,
                source,
            })?;
        debug!(
            kind = %device.kind,
            index = device.index,
            prefix = %device.prefix,
            channels = device.num_channels,
            "Device declared"
        );
        Ok(())
    }

    /// Returns the collection index of the new motor
    fn add_motor(&mut self, line: &str, line_number: usize) -> Option<usize> {
        let mut motor = match Motor::parse(line) {
            Ok(motor) => motor,
            Err(reason) => {
                self.reject(line, line_number, reason);
                return None;
            }
        };
        motor.resolve(&self.devices);
        self.collection.push(Entry::Motor(motor));
        Some(self.collection.len() - 1)
    }

    fn add_counter(&mut self, line: &str, line_number: usize) {
        let mut counter = match Counter::parse(line) {
            Ok(counter) => counter,
            Err(reason) => {
                self.reject(line, line_number, reason);
                return;
            }
        };
        counter.resolve(&self.devices);

        // a counter on a plain PV becomes that PV's signal
        if counter.device().map(|d| d.kind) == Some(DeviceKind::EpicsPv) {
            if let Some(pvname) = counter.pvname() {
                let signal = Signal::from_counter(&counter, pvname);
                self.collection.push(Entry::Signal(signal));
                return;
            }
        }

        if let Some(prefix) = counter.scaler_prefix() {
            if self.scalers.insert(prefix.to_string()) {
                debug!(prefix, "Scaler signal added");
                self.collection
                    .push(Entry::Signal(Signal::scaler(prefix, &counter.raw)));
            }
        }
        self.collection.push(Entry::Counter(counter));
    }

    fn reject(&mut self, line: &str, line_number: usize, reason: FieldError) {
        warn!(line = line_number, %reason, "Skipping unparseable record");
        self.rejected.push(RejectedLine {
            line_number,
            raw: line.to_string(),
            reason,
        });
    }

    pub fn motors(&self) -> impl Iterator<Item = &Motor> {
        self.collection.iter().filter_map(|entry| match entry {
            Entry::Motor(motor) => Some(motor),
            _ => None,
        })
    }

    pub fn counters(&self) -> impl Iterator<Item = &Counter> {
        self.collection.iter().filter_map(|entry| match entry {
            Entry::Counter(counter) => Some(counter),
            _ => None,
        })
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.collection.iter().filter_map(|entry| match entry {
            Entry::Signal(signal) => Some(signal),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalClass;

    const CONFIG: &str = "\
# ID @(#)getinfo.c
VM_EPICS_M1 = 9idcLAX:m58:c0: 8
VM_EPICS_SC = 9idcLAX:scaler1 8
VM_EPICS_PV = 9idcLAX:userCalc1 1
SW_SFTWARE = 1 NONE

# Motor    ctrl steps sign slew base backl accel nada  flags   mne  name
MOT000 = EPICS_M2:0/1   2000  1  2000  200   50  125    0 0x003       m1  m1
MOTPAR:read_mode = 7
MOTPAR:encoder_step_size = 1
MOT001 = NONE   2000  1  2000  200   50  125    0 0x003       dummy  dummy
# Counter   ctrl unit chan scale flags    mne  name
CNT000 = EPICS_SC  0  0 10000000 0x001      sec  seconds
CNT001 = EPICS_SC  0  1 1 0x002      I0  I0
CNT002 = EPICS_PV  0  0 1 0x000      calc  user_calc
";

    #[test]
    fn test_parse_config() {
        let config = SpecConfig::parse(CONFIG).unwrap();
        assert_eq!(config.devices.len(), 3);
        assert_eq!(config.unhandled, vec!["SW_SFTWARE = 1 NONE".to_string()]);
        assert!(config.rejected.is_empty());

        assert_eq!(config.motors().count(), 2);
        assert_eq!(config.counters().count(), 2);
        assert_eq!(config.signals().count(), 2);
        assert_eq!(config.collection.len(), 6);
    }

    #[test]
    fn test_motpar_attaches_to_open_motor() {
        let config = SpecConfig::parse(CONFIG).unwrap();
        let motors: Vec<_> = config.motors().collect();
        assert_eq!(motors[0].motpar, vec!["read_mode = 7", "encoder_step_size = 1"]);
        assert!(motors[1].motpar.is_empty());
    }

    #[test]
    fn test_motpar_without_motor_is_unhandled() {
        let config = SpecConfig::parse(
            "VM_EPICS_SC = 9idcLAX:scaler1 8\n\
             MOTPAR:read_mode = 7\n\
             MOT000 = NONE 0 0 0 0 0 0 0 0x0 foo bar\n\
             CNT000 = NONE 0 0 1 0x0 x x\n\
             MOTPAR:late = 1\n",
        )
        .unwrap();
        assert_eq!(
            config.unhandled,
            vec!["MOTPAR:read_mode = 7".to_string(), "MOTPAR:late = 1".to_string()]
        );
        assert!(config.motors().all(|m| m.motpar.is_empty()));
    }

    #[test]
    fn test_scaler_signal_inserted_once_before_counter() {
        let config = SpecConfig::parse(CONFIG).unwrap();
        let kinds: Vec<_> = config
            .collection
            .iter()
            .map(|entry| match entry {
                Entry::Signal(signal) => signal.mne.as_str(),
                Entry::Motor(motor) => motor.mne.as_str(),
                Entry::Counter(counter) => counter.mne.as_str(),
            })
            .collect();
        assert_eq!(kinds, vec!["m1", "dummy", "scaler1", "sec", "I0", "calc"]);

        let scaler = config.signals().next().unwrap();
        assert_eq!(scaler.class, SignalClass::ScalerCH);
        assert_eq!(scaler.pvname, "9idcLAX:scaler1");
    }

    #[test]
    fn test_second_scaler_card_gets_own_signal() {
        let config = SpecConfig::parse(
            "VM_EPICS_SC = 9idcLAX:scaler1 8\n\
             VM_EPICS_SC = 9idcLAX:scaler2 8\n\
             CNT000 = EPICS_SC 0 0 1 0x0 a a\n\
             CNT001 = EPICS_SC 1 0 1 0x0 b b\n\
             CNT002 = EPICS_SC 0 3 1 0x0 c c\n",
        )
        .unwrap();
        let scalers: Vec<_> = config.signals().map(|s| s.mne.as_str()).collect();
        assert_eq!(scalers, vec!["scaler1", "scaler2"]);
        assert_eq!(config.collection.len(), 5);
    }

    #[test]
    fn test_pv_counter_becomes_signal() {
        let config = SpecConfig::parse(CONFIG).unwrap();
        let calc = config.signals().find(|s| s.mne == "calc").unwrap();
        assert_eq!(calc.class, SignalClass::EpicsSignal);
        assert_eq!(calc.pvname, "9idcLAX:userCalc1");
        assert!(config.counters().all(|c| c.mne != "calc"));
    }

    #[test]
    fn test_unresolved_pv_counter_stays_counter() {
        let config = SpecConfig::parse("CNT000 = EPICS_PV 0 0 1 0x0 calc calc\n").unwrap();
        assert_eq!(config.counters().count(), 1);
        assert_eq!(config.signals().count(), 0);
    }

    #[test]
    fn test_devices_must_precede_channels() {
        let config = SpecConfig::parse(
            "MOT000 = EPICS_M2:0/1 2000 1 2000 200 50 125 0 0x003 m1 m1\n\
             VM_EPICS_M1 = 9idcLAX:m58:c0: 8\n",
        )
        .unwrap();
        assert_eq!(config.motors().next().unwrap().pvname(), None);
    }

    #[test]
    fn test_malformed_device_is_fatal() {
        let result = SpecConfig::parse(
            "VM_EPICS_M1 = 9idcLAX:m58:c0: 8\n\
             VM_EPICS_SC = 9idcLAX:scaler1 many\n",
        );
        match result {
            Err(SpecConfigError::MalformedDevice { line, source }) => {
                assert_eq!(line, 2);
                assert!(matches!(source, FieldError::NotInteger { .. }));
            }
            other => panic!("expected malformed device error, got {:?}", other),
        }
    }

    #[test]
    fn test_short_record_is_rejected_not_fatal() {
        let config = SpecConfig::parse(
            "MOT000 = NONE 0 0 0\n\
             MOTPAR:orphan = 1\n\
             CNT000 = NONE 0 0 1 0x0 x x\n",
        )
        .unwrap();
        assert_eq!(config.rejected.len(), 1);
        assert_eq!(config.rejected[0].line_number, 1);
        assert_eq!(config.rejected[0].reason, FieldError::Missing { field: "base" });
        assert_eq!(config.unhandled, vec!["MOTPAR:orphan = 1".to_string()]);
        assert_eq!(config.collection.len(), 1);
    }
}
