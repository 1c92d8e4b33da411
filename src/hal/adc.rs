use core::fmt::Debug;
use core::marker::PhantomData;

use embedded_hal::adc::{Channel, OneShot};

/// ADC peripheral instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcUnit {
    Adc1,
    /// Shared with the radio; has no width register of its own
    Adc2,
}

/// Conversion resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdcWidth {
    Bits9 = 9,
    Bits10 = 10,
    Bits11 = 11,
    Bits12 = 12,
}

impl AdcWidth {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Shift that brings a reading of this width to 12-bit scale
    pub fn shift_to_12bit(self) -> u8 {
        12 - self.bits()
    }
}

/// Input attenuation, selects the measurable voltage range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Attenuation {
    Db0 = 0,   // ~100-950 mV
    Db2_5 = 1, // ~100-1250 mV
    Db6 = 2,   // ~150-1750 mV
    Db11 = 3,  // ~150-2450 mV
}

impl Attenuation {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Factory two-point calibration: raw readings taken at 150 mV and 850 mV
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwoPoint {
    pub low: u32,
    pub high: u32,
}

/// Channel configuration and factory calibration access for the sense channel
pub trait AdcControl {
    type Error: Debug;

    fn config_width(&mut self, width: AdcWidth) -> Result<(), Self::Error>;

    fn config_attenuation(&mut self, atten: Attenuation) -> Result<(), Self::Error>;

    /// Two-point values burned into eFuse, if any
    fn efuse_two_point(&self, unit: AdcUnit, atten: Attenuation) -> Option<TwoPoint>;

    /// Reference voltage burned into eFuse, if any
    fn efuse_vref(&self) -> Option<u16>;
}

/// Source of raw conversions for one channel
pub trait Sampler {
    type Error: Debug;

    fn sample(&mut self) -> nb::Result<u16, Self::Error>;
}

/// [`Sampler`] over an `embedded-hal` one-shot ADC and its pin
pub struct OneShotChannel<A, ADC, PIN> {
    adc: ADC,
    pin: PIN,
    _unit: PhantomData<A>,
}

impl<A, ADC, PIN> OneShotChannel<A, ADC, PIN>
where
    ADC: OneShot<A, u16, PIN>,
    PIN: Channel<A>,
{
    pub fn new(adc: ADC, pin: PIN) -> Self {
        Self {
            adc,
            pin,
            _unit: PhantomData,
        }
    }

    pub fn release(self) -> (ADC, PIN) {
        (self.adc, self.pin)
    }
}

impl<A, ADC, PIN> Sampler for OneShotChannel<A, ADC, PIN>
where
    ADC: OneShot<A, u16, PIN>,
    ADC::Error: Debug,
    PIN: Channel<A>,
{
    type Error = ADC::Error;

    fn sample(&mut self) -> nb::Result<u16, Self::Error> {
        self.adc.read(&mut self.pin)
    }
}
