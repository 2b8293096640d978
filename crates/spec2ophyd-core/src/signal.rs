//! Plain EPICS signals: PV-backed counters and scaler cards

use serde::Serialize;
use std::fmt;

use crate::counter::Counter;

/// ophyd class used for a signal declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalClass {
    EpicsSignal,
    ScalerCH,
}

impl SignalClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EpicsSignal => "EpicsSignal",
            Self::ScalerCH => "ScalerCH",
        }
    }
}

impl fmt::Display for SignalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub mne: String,
    pub name: String,
    pub pvname: String,
    pub class: SignalClass,
    /// Config line that produced this signal
    pub raw: String,
    pub ignore: bool,
}

impl Signal {
    /// Signal standing in for a counter read straight from one PV
    pub fn from_counter(counter: &Counter, pvname: &str) -> Self {
        Self {
            mne: counter.mne.clone(),
            name: counter.name.clone(),
            pvname: pvname.to_string(),
            class: SignalClass::EpicsSignal,
            raw: counter.raw.clone(),
            ignore: false,
        }
    }

    /// Whole scaler card, named after the last `:` segment of its lowercased prefix
    pub fn scaler(prefix: &str, raw: &str) -> Self {
        let lowered = prefix.to_lowercase();
        let mne = lowered.rsplit(':').next().unwrap_or(&lowered).to_string();
        Self {
            name: mne.clone(),
            mne,
            pvname: prefix.to_string(),
            class: SignalClass::ScalerCH,
            raw: raw.to_string(),
            ignore: false,
        }
    }
}
