//! Motor channel records (`MOTnnn = ...` lines)

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::device::{Device, DeviceKind, DeviceRef, DeviceTable, NONE_TAG};
use crate::fields::{record_number, split_assignment, FieldError, Fields};

/// EPICS motor controller reference, `EPICS_M2:<unit>/<chan>`
pub const EPICS_MOTOR_TAG: &str = "EPICS_M2";
/// Macro motor reference, `MAC_MOT:<unit>/<chan>`
pub const MACRO_MOTOR_TAG: &str = "MAC_MOT";

/// Outcome of resolving a motor's controller reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MotorResolution {
    /// No known controller matched, or the referenced device is missing
    #[default]
    Unresolved,
    /// One EPICS motor record per channel
    Address { device: DeviceRef, pvname: String },
    /// Driven by a macro motor aggregator, no PV per channel
    MacroPrefix { device: DeviceRef, prefix: String },
    /// Controller is `NONE`
    Ignored,
}

/// One motor line from the SPEC config
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Motor {
    /// Number from the `MOTnnn` key
    pub config_line: u32,
    /// The line as read, trimmed
    pub raw: String,
    pub ctrl: String,
    pub steps: i64,
    pub sign: i64,
    pub slew: i64,
    pub base: i64,
    pub backl: i64,
    pub accel: i64,
    pub nada: i64,
    pub flags: String,
    pub mne: String,
    pub name: String,
    /// Text of the `MOTPAR:` lines that followed this motor
    pub motpar: Vec<String>,
    pub resolution: MotorResolution,
}

impl Motor {
    /// Parse a `MOTnnn = ctrl steps sign slew base backl accel nada flags mne name` line
    pub fn parse(line: &str) -> Result<Self, FieldError> {
        let (key, value) = split_assignment(line)?;
        let config_line = record_number(key, "MOT")?;

        let mut fields = Fields::new(value);
        let ctrl = fields.next_str("ctrl")?.to_string();
        let steps = fields.next_int("steps")?;
        let sign = fields.next_int("sign")?;
        let slew = fields.next_int("slew")?;
        let base = fields.next_int("base")?;
        let backl = fields.next_int("backl")?;
        let accel = fields.next_int("accel")?;
        let nada = fields.next_int("nada")?;
        let flags = fields.next_str("flags")?.to_string();
        let mne = fields.next_str("mne")?.to_string();
        let name = match fields.remainder() {
            "" => mne.clone(),
            name => name.to_string(),
        };

        Ok(Self {
            config_line,
            raw: line.to_string(),
            ctrl,
            steps,
            sign,
            slew,
            base,
            backl,
            accel,
            nada,
            flags,
            mne,
            name,
            motpar: Vec::new(),
            resolution: MotorResolution::Unresolved,
        })
    }

    /// Resolve the controller reference against the devices declared so far
    pub fn resolve(&mut self, devices: &DeviceTable) {
        self.resolution = if self.ctrl.starts_with(EPICS_MOTOR_TAG) {
            self.lookup(devices, EPICS_MOTOR_TAG, DeviceKind::EpicsMotor)
                .map(|(device, chan)| MotorResolution::Address {
                    device: device.reference(),
                    pvname: format!("{}m{}", device.prefix, chan),
                })
                .unwrap_or_default()
        } else if self.ctrl.starts_with(MACRO_MOTOR_TAG) {
            self.lookup(devices, MACRO_MOTOR_TAG, DeviceKind::MacroMotor)
                .map(|(device, _)| MotorResolution::MacroPrefix {
                    device: device.reference(),
                    prefix: device.prefix.clone(),
                })
                .unwrap_or_default()
        } else if self.ctrl.starts_with(NONE_TAG) {
            MotorResolution::Ignored
        } else {
            MotorResolution::Unresolved
        };

        match &self.resolution {
            MotorResolution::Unresolved => warn!(
                motor = %self.mne,
                ctrl = %self.ctrl,
                "Motor controller not resolved"
            ),
            resolution => debug!(motor = %self.mne, ?resolution, "Motor resolved"),
        }
    }

    fn lookup<'d>(
        &self,
        devices: &'d DeviceTable,
        tag: &str,
        kind: DeviceKind,
    ) -> Option<(&'d Device, u32)> {
        let (unit, chan) = unit_channel(&self.ctrl, tag)?;
        devices.get(kind, unit).map(|device| (device, chan))
    }

    pub fn pvname(&self) -> Option<&str> {
        match &self.resolution {
            MotorResolution::Address { pvname, .. } => Some(pvname),
            _ => None,
        }
    }

    pub fn macro_prefix(&self) -> Option<&str> {
        match &self.resolution {
            MotorResolution::MacroPrefix { prefix, .. } => Some(prefix),
            _ => None,
        }
    }

    pub fn is_ignorable(&self) -> bool {
        self.resolution == MotorResolution::Ignored
    }
}

/// `<tag>:<unit>/<chan>` -> (unit, chan)
fn unit_channel(ctrl: &str, tag: &str) -> Option<(usize, u32)> {
    let (unit, chan) = ctrl.strip_prefix(tag)?.strip_prefix(':')?.split_once('/')?;
    Some((unit.trim().parse().ok()?, chan.trim().parse().ok()?))
}

impl fmt::Display for Motor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SpecMotor(mne='{}', config_line='{}', name='{}'",
            self.mne, self.config_line, self.name
        )?;
        if let Some(prefix) = self.macro_prefix() {
            write!(f, ", macro_prefix='{}'", prefix)?;
        }
        match self.pvname() {
            Some(pvname) => write!(f, ", pvname={})", pvname),
            None => write!(f, ", ctrl={})", self.ctrl),
        }
    }
}
