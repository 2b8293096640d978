//! SPEC controller devices and the table that channels resolve against
//!
//! A SPEC "device" is a controller line such as `VM_EPICS_M1 = 9idcLAX:m58:c0: 8`.
//! Motor and counter channels refer to devices by type and by the order in
//! which devices of that type were declared.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::fields::{split_assignment, FieldError, Fields};

/// Controller reference meaning "no hardware behind this channel"
pub const NONE_TAG: &str = "NONE";

/// Known SPEC controller types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DeviceKind {
    /// Macro motor aggregator, one prefix for many pseudo-channels
    #[serde(rename = "PSE_MAC_MOT")]
    MacroMotor,
    /// EPICS motor record controller, one PV per channel
    #[serde(rename = "VM_EPICS_M1")]
    EpicsMotor,
    /// Single EPICS process variable
    #[serde(rename = "VM_EPICS_PV")]
    EpicsPv,
    /// EPICS scaler card
    #[serde(rename = "VM_EPICS_SC")]
    EpicsScaler,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 4] = [
        DeviceKind::MacroMotor,
        DeviceKind::EpicsMotor,
        DeviceKind::EpicsPv,
        DeviceKind::EpicsScaler,
    ];

    /// Key used on the left of `=` in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacroMotor => "PSE_MAC_MOT",
            Self::EpicsMotor => "VM_EPICS_M1",
            Self::EpicsPv => "VM_EPICS_PV",
            Self::EpicsScaler => "VM_EPICS_SC",
        }
    }

    /// Match a config key exactly (case-sensitive)
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub kind: DeviceKind,
    /// Name as written in the file
    pub name: String,
    /// EPICS PV prefix
    pub prefix: String,
    pub num_channels: u32,
    /// 0-based position among devices of the same kind
    pub index: usize,
    /// 1-based line in the source file
    pub line_number: usize,
}

impl Device {
    /// Parse `<NAME> = <prefix> <channel-count>`
    pub fn parse(
        kind: DeviceKind,
        line: &str,
        line_number: usize,
        index: usize,
    ) -> Result<Self, FieldError> {
        let (name, value) = split_assignment(line)?;
        let mut fields = Fields::new(value);
        let prefix = fields.next_str("prefix")?.to_string();
        let num_channels = fields.next_int("channel count")?;
        fields.finish()?;

        Ok(Self {
            kind,
            name: name.to_string(),
            prefix,
            num_channels,
            index,
            line_number,
        })
    }

    pub fn reference(&self) -> DeviceRef {
        DeviceRef {
            kind: self.kind,
            index: self.index,
        }
    }
}

/// Pointer from a channel back to the device it resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceRef {
    pub kind: DeviceKind,
    pub index: usize,
}

/// Devices grouped by kind, each list in declaration order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DeviceTable {
    devices: BTreeMap<DeviceKind, Vec<Device>>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a device line and append it under its kind
    pub fn declare(
        &mut self,
        kind: DeviceKind,
        line: &str,
        line_number: usize,
    ) -> Result<&Device, FieldError> {
        let list = self.devices.entry(kind).or_default();
        let device = Device::parse(kind, line, line_number, list.len())?;
        list.push(device);
        Ok(&list[list.len() - 1])
    }

    /// Look up the `unit`-th device of a kind
    pub fn get(&self, kind: DeviceKind, unit: usize) -> Option<&Device> {
        self.devices.get(&kind).and_then(|list| list.get(unit))
    }

    pub fn len(&self) -> usize {
        self.devices.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
