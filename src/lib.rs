//! Battery monitoring for battery-operated boards.
//!
//! Two sensing strategies are supported: an AXP192 power-management chip on
//! the shared I2C bus, or a raw ADC channel behind a voltage divider. Either
//! one (or neither) is plugged into a [`BatteryMonitor`], which reduces the
//! measured voltage to one of four [`BatteryLevel`] codes.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod drivers;
pub mod error;
pub mod hal;
pub mod power;

pub use error::Error;
pub use power::{
    AdcSense, BatteryLevel, BatteryMonitor, NoSense, PmuSense, PowerSource, VoltageSource,
};
