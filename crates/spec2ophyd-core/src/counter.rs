//! Counter channel records (`CNTnnn = ...` lines)

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::device::{DeviceKind, DeviceRef, DeviceTable, NONE_TAG};
use crate::fields::{record_number, split_assignment, FieldError, Fields};

/// EPICS scaler channel
pub const SCALER_TAG: &str = "EPICS_SC";
/// Single EPICS PV read as a counter
pub const PV_TAG: &str = "EPICS_PV";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CounterResolution {
    #[default]
    Unresolved,
    Address { device: DeviceRef, pvname: String },
    Ignored,
}

/// One counter line from the SPEC config
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counter {
    /// Number from the `CNTnnn` key
    pub config_line: u32,
    pub raw: String,
    pub ctrl: String,
    pub unit: u32,
    /// 0-based, as SPEC numbers scaler channels
    pub chan: u32,
    pub scale: i64,
    pub flags: String,
    pub mne: String,
    pub name: String,
    pub reported_pvs: Vec<String>,
    pub resolution: CounterResolution,
}

impl Counter {
    /// Parse a `CNTnnn = ctrl unit chan scale flags mne name` line
    pub fn parse(line: &str) -> Result<Self, FieldError> {
        let (key, value) = split_assignment(line)?;
        let config_line = record_number(key, "CNT")?;

        let mut fields = Fields::new(value);
        let ctrl = fields.next_str("ctrl")?.to_string();
        let unit = fields.next_int("unit")?;
        let chan = fields.next_int("chan")?;
        let scale = fields.next_int("scale")?;
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
            unit,
            chan,
            scale,
            flags,
            mne,
            name,
            reported_pvs: Vec::new(),
            resolution: CounterResolution::Unresolved,
        })
    }

    /// Resolve the controller reference against the devices declared so far
    pub fn resolve(&mut self, devices: &DeviceTable) {
        let unit = self.unit as usize;
        self.resolution = if self.ctrl.starts_with(SCALER_TAG) {
            devices
                .get(DeviceKind::EpicsScaler, unit)
                .map(|device| CounterResolution::Address {
                    device: device.reference(),
                    // scaler PVs count channels from 1
                    pvname: format!("{}.S{}", device.prefix, u64::from(self.chan) + 1),
                })
                .unwrap_or_default()
        } else if self.ctrl.starts_with(PV_TAG) {
            devices
                .get(DeviceKind::EpicsPv, unit)
                .map(|device| CounterResolution::Address {
                    device: device.reference(),
                    pvname: device.prefix.clone(),
                })
                .unwrap_or_default()
        } else if self.ctrl.starts_with(NONE_TAG) {
            CounterResolution::Ignored
        } else {
            CounterResolution::Unresolved
        };

        match &self.resolution {
            CounterResolution::Unresolved => warn!(
                counter = %self.mne,
                ctrl = %self.ctrl,
                unit = self.unit,
                "Counter controller not resolved"
            ),
            resolution => debug!(counter = %self.mne, ?resolution, "Counter resolved"),
        }
    }

    pub fn pvname(&self) -> Option<&str> {
        match &self.resolution {
            CounterResolution::Address { pvname, .. } => Some(pvname),
            _ => None,
        }
    }

    pub fn device(&self) -> Option<DeviceRef> {
        match &self.resolution {
            CounterResolution::Address { device, .. } => Some(*device),
            _ => None,
        }
    }

    pub fn is_ignorable(&self) -> bool {
        self.resolution == CounterResolution::Ignored
    }

    /// PV prefix of the scaler card behind this channel, if it resolved to one
    pub fn scaler_prefix(&self) -> Option<&str> {
        match &self.resolution {
            CounterResolution::Address { device, pvname }
                if device.kind == DeviceKind::EpicsScaler =>
            {
                pvname.split('.').next()
            }
            _ => None,
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SpecCounter(mne='{}', config_line='{}', name='{}', unit='{}', chan='{}'",
            self.mne, self.config_line, self.name, self.unit, self.chan
        )?;
        match self.pvname() {
            Some(pvname) => write!(f, ", pvname={})", pvname),
            None => write!(f, ", ctrl={})", self.ctrl),
        }
    }
}
