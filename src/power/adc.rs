use super::{sealed, VoltageSource};
use crate::config::{AdcConfig, EXTERNAL_POWER_MV};
use crate::drivers::calibration::{AdcCharacteristics, CalibrationSource};
use crate::error::{adc_error, Error, Result};
use crate::hal::adc::{AdcControl, AdcUnit, Sampler};

// Largest reading that cannot be mistaken for external power
const MAX_READING_MV: u32 = EXTERNAL_POWER_MV as u32 - 1;

/// Battery sensing on a raw ADC channel, optionally behind a voltage divider
pub struct AdcSense<S, C> {
    sampler: S,
    control: C,
    config: AdcConfig,
    characteristics: Option<AdcCharacteristics>,
}

impl<S, C> AdcSense<S, C>
where
    S: Sampler,
    C: AdcControl,
{
    pub fn new(sampler: S, control: C, config: AdcConfig) -> Self {
        Self {
            sampler,
            control,
            config,
            characteristics: None,
        }
    }

    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    /// Calibration record, once [`VoltageSource::calibrate`] has run
    pub fn characteristics(&self) -> Option<&AdcCharacteristics> {
        self.characteristics.as_ref()
    }

    pub fn release(self) -> (S, C) {
        (self.sampler, self.control)
    }

    /// Mean of the configured number of raw samples
    fn average_raw(&mut self) -> Result<u32> {
        let samples = self.config.samples.max(1) as u32;
        let mut sum = 0u32;
        for _ in 0..samples {
            let raw = nb::block!(self.sampler.sample()).map_err(adc_error)?;
            sum += raw as u32;
        }
        Ok(sum / samples)
    }
}

impl<S, C> sealed::Sealed for AdcSense<S, C> {}

impl<S, C> VoltageSource for AdcSense<S, C>
where
    S: Sampler,
    C: AdcControl,
{
    fn calibrate(&mut self) -> Result<()> {
        let AdcConfig {
            unit,
            attenuation,
            width,
            default_vref_mv,
            ..
        } = self.config;

        if unit == AdcUnit::Adc1 {
            self.control.config_width(width).map_err(adc_error)?;
        }
        self.control
            .config_attenuation(attenuation)
            .map_err(adc_error)?;

        let chars = AdcCharacteristics::characterize(
            &self.control,
            unit,
            attenuation,
            width,
            default_vref_mv,
        );
        match chars.source {
            CalibrationSource::EfuseTwoPoint => {
                log::info!("ADC characterization based on Two Point values stored in eFuse")
            }
            CalibrationSource::EfuseVref => {
                log::info!("ADC characterization based on reference voltage stored in eFuse")
            }
            CalibrationSource::DefaultVref => {
                log::info!("ADC characterization based on default reference voltage")
            }
        }
        self.characteristics = Some(chars);
        Ok(())
    }

    fn read_voltage(&mut self) -> Result<u16> {
        let chars = self.characteristics.ok_or(Error::Uncalibrated)?;
        let raw = self.average_raw()?;

        let mut mv = chars.raw_to_voltage(raw);
        if let Some(divider) = self.config.voltage_divider {
            mv = divider.scale(mv);
        }
        Ok(mv.min(MAX_READING_MV) as u16)
    }
}
