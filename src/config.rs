//! Configuration constants for battery sensing

use crate::hal::adc::{AdcUnit, AdcWidth, Attenuation};

/// Voltage above which the battery is reported as full, in millivolts
pub const MIN_BATTERY_MV: u16 = 3600;

/// Number of ADC samples averaged per voltage reading
pub const ADC_SAMPLES: u16 = 64;

/// Reference voltage used when no eFuse calibration is present, in millivolts
pub const DEFAULT_VREF_MV: u16 = 1100;

/// DCDC1 output voltage set during PMU bring-up, in millivolts
pub const PMU_DCDC1_MV: u16 = 3300;

/// Reading reported when the board runs from external power
pub const EXTERNAL_POWER_MV: u16 = 0xFFFF;

/// Resistor divider in front of the ADC pin: battery = pin * num / den
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VoltageDivider {
    pub num: u16,
    pub den: u16,
}

impl VoltageDivider {
    /// `den` of zero is treated as one
    pub const fn new(num: u16, den: u16) -> Self {
        Self { num, den }
    }

    /// Scale a pin voltage back up to the battery voltage
    pub fn scale(self, mv: u32) -> u32 {
        let scaled = mv as u64 * self.num as u64 / self.den.max(1) as u64;
        scaled.min(u32::MAX as u64) as u32
    }
}

/// ADC sensing setup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdcConfig {
    pub unit: AdcUnit,
    pub attenuation: Attenuation,
    pub width: AdcWidth,
    pub samples: u16,
    pub default_vref_mv: u16,
    pub voltage_divider: Option<VoltageDivider>,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            unit: AdcUnit::Adc1,
            attenuation: Attenuation::Db11,
            width: AdcWidth::Bits12,
            samples: ADC_SAMPLES,
            default_vref_mv: DEFAULT_VREF_MV,
            voltage_divider: None,
        }
    }
}

impl AdcConfig {
    /// Compensate a divider scaling the battery voltage by `den / num`
    pub fn with_divider(mut self, num: u16, den: u16) -> Self {
        self.voltage_divider = Some(VoltageDivider::new(num, den));
        self
    }

    pub fn with_unit(mut self, unit: AdcUnit) -> Self {
        self.unit = unit;
        self
    }
}
