//! spec2ophyd core - SPEC config parsing and ophyd setup generation
//!
//! This crate provides the pieces of the SPEC to ophyd conversion:
//! - Line classification and fixed-field parsing of SPEC `config` files
//! - Device table for resolving motor and counter controller references
//! - Emission of one ophyd setup line per motor, counter or signal

pub mod classify;
pub mod config;
pub mod counter;
pub mod device;
pub mod emit;
mod fields;
pub mod motor;
pub mod signal;

pub use config::{Entry, RejectedLine, SpecConfig, SpecConfigError, DEFAULT_CONFIG_FILE};
pub use counter::{Counter, CounterResolution};
pub use device::{Device, DeviceKind, DeviceRef, DeviceTable};
pub use emit::{ophyd_setup, write_setup, OphydConfig};
pub use fields::FieldError;
pub use motor::{Motor, MotorResolution};
pub use signal::{Signal, SignalClass};
