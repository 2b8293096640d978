//! ophyd setup text generation
//!
//! Every collected record becomes exactly one line: a live ophyd declaration
//! or a `#` comment that keeps enough context to finish the job by hand.

use std::io::{self, Write};

use crate::config::{Entry, SpecConfig};
use crate::counter::Counter;
use crate::motor::Motor;
use crate::signal::Signal;

/// Renders a record as one line of ophyd setup
pub trait OphydConfig {
    fn ophyd_config(&self) -> String;
}

impl OphydConfig for Signal {
    fn ophyd_config(&self) -> String {
        let mut s = format!(
            "{} = {}('{}', name='{}')",
            self.mne, self.class, self.pvname, self.mne
        );
        if self.mne != self.name {
            s.push_str(&format!("  # {}", self.name));
        }
        if self.ignore {
            s.insert_str(0, "# NONE: ");
        }
        s
    }
}

impl OphydConfig for Motor {
    fn ophyd_config(&self) -> String {
        let mut s = match (self.pvname(), self.macro_prefix()) {
            (Some(pvname), _) => {
                format!("{} = EpicsMotor('{}', name='{}')", self.mne, pvname, self.mne)
            }
            (None, Some(_)) => format!("# Macro Motor: {}", self),
            (None, None) => format!("# line {}: {}", self.config_line, self.raw),
        };
        if self.mne != self.name {
            s.push_str(&format!("  # {}", self.name));
        }
        if !self.motpar.is_empty() {
            s.push_str(&format!(" # {}", self.motpar.join(", ")));
        }
        s
    }
}

impl OphydConfig for Counter {
    fn ophyd_config(&self) -> String {
        if self.is_ignorable() {
            format!("# line {}: {}", self.config_line, self.raw)
        } else {
            format!("# counter: {} = {}", self.mne, self)
        }
    }
}

impl OphydConfig for Entry {
    fn ophyd_config(&self) -> String {
        match self {
            Entry::Signal(signal) => signal.ophyd_config(),
            Entry::Motor(motor) => motor.ophyd_config(),
            Entry::Counter(counter) => counter.ophyd_config(),
        }
    }
}

/// ophyd setup lines for the whole collection, in file order
pub fn ophyd_setup(config: &SpecConfig) -> Vec<String> {
    config
        .collection
        .iter()
        .map(OphydConfig::ophyd_config)
        .collect()
}

/// Write the ophyd setup, one line per record
pub fn write_setup<W: Write>(config: &SpecConfig, out: &mut W) -> io::Result<()> {
    for entry in &config.collection {
        writeln!(out, "{}", entry.ophyd_config())?;
    }
    Ok(())
}
