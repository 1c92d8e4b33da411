//! Battery level reporting
//!
//! A [`BatteryMonitor`] owns exactly one [`VoltageSource`]: the AXP192 PMU
//! ([`PmuSense`]), a raw ADC channel ([`AdcSense`]) or nothing at all
//! ([`NoSense`]). Whatever goes wrong underneath is logged and the reported
//! level falls back to [`BatteryLevel::Unknown`].

mod adc;
mod pmu;

pub use adc::AdcSense;
pub use pmu::PmuSense;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use crate::config::{EXTERNAL_POWER_MV, MIN_BATTERY_MV};
use crate::error::{Error, Result};

/// Battery status byte, as carried in a LoRaWAN DevStatusAns
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BatteryLevel {
    ExternalPower = 0x00,
    Min = 0x01,
    Max = 0xFE,
    Unknown = 0xFF,
}

impl BatteryLevel {
    /// Classify a reading in millivolts. The threshold itself counts as low.
    pub fn from_voltage(mv: u16, threshold_mv: u16) -> Self {
        match mv {
            0 => BatteryLevel::Unknown,
            EXTERNAL_POWER_MV => BatteryLevel::ExternalPower,
            mv if mv > threshold_mv => BatteryLevel::Max,
            _ => BatteryLevel::Min,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BatteryLevel::ExternalPower => "external power",
            BatteryLevel::Min => "low",
            BatteryLevel::Max => "high",
            BatteryLevel::Unknown => "unknown",
        }
    }
}

impl uDisplay for BatteryLevel {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

/// What the board is currently running from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSource {
    Battery { charging: bool },
    External,
    Unknown,
}

mod sealed {
    pub trait Sealed {}
}

/// Battery voltage sensing strategy
///
/// Implemented only by [`PmuSense`], [`AdcSense`] and [`NoSense`].
pub trait VoltageSource: sealed::Sealed {
    /// One-time hardware bring-up
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Configure and characterize the measurement path
    fn calibrate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Battery voltage in millivolts, `0xFFFF` when on external power
    fn read_voltage(&mut self) -> Result<u16>;

    fn power_source(&mut self) -> Result<PowerSource> {
        Ok(PowerSource::Unknown)
    }
}

/// Board without battery sensing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSense;

impl sealed::Sealed for NoSense {}

impl VoltageSource for NoSense {
    fn read_voltage(&mut self) -> Result<u16> {
        Ok(0)
    }
}

pub struct BatteryMonitor<S> {
    source: S,
    min_battery_mv: u16,
}

impl<S: VoltageSource> BatteryMonitor<S> {
    pub fn new(source: S) -> Self {
        Self::with_threshold(source, MIN_BATTERY_MV)
    }

    pub fn with_threshold(source: S, min_battery_mv: u16) -> Self {
        Self {
            source,
            min_battery_mv,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn release(self) -> S {
        self.source
    }

    /// Bring up the power management chip, if there is one
    pub fn init_power_chip(&mut self) {
        match self.source.init() {
            Ok(()) => {}
            Err(Error::BusBusy) => log::error!("i2c bus busy - PMU initialization error"),
            Err(e) => log::error!("PMU initialization failed: {}", e),
        }
    }

    /// Configure the ADC and load its calibration, if there is one
    pub fn calibrate_voltage(&mut self) {
        if let Err(e) = self.source.calibrate() {
            log::error!("ADC calibration failed: {}", e);
        }
    }

    pub fn try_read_voltage(&mut self) -> Result<u16> {
        self.source.read_voltage()
    }

    /// Battery voltage in millivolts; `0` if it could not be measured
    pub fn read_voltage(&mut self) -> u16 {
        self.try_read_voltage().unwrap_or_else(|e| {
            log::warn!("battery voltage read failed: {}", e);
            0
        })
    }

    pub fn battery_level(&mut self) -> BatteryLevel {
        BatteryLevel::from_voltage(self.read_voltage(), self.min_battery_mv)
    }

    pub fn power_source(&mut self) -> PowerSource {
        self.source.power_source().unwrap_or_else(|e| {
            log::warn!("power source query failed: {}", e);
            PowerSource::Unknown
        })
    }

    /// Write a one-line battery summary, e.g. to the serial console
    pub fn write_status<W>(&mut self, w: &mut W) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let mv = self.read_voltage();
        let level = BatteryLevel::from_voltage(mv, self.min_battery_mv);
        match level {
            BatteryLevel::ExternalPower | BatteryLevel::Unknown => uwrite!(w, "battery: {}", level),
            _ => uwrite!(w, "battery: {} mV ({})", mv, level),
        }
    }
}
