pub mod axp192;
pub mod calibration;

pub use axp192::{Adc1Channel, Axp192, ChargeLed, PowerRail};
pub use calibration::{AdcCharacteristics, CalibrationSource};
