//! ADC characterization
//!
//! Maps raw conversions to millivolts with a linear model
//! `mV = (coeff_a * raw + 0.5) / 65536 + coeff_b`, the raw value first
//! brought to 12-bit scale. The coefficients come from factory eFuse data
//! when present, otherwise from a nominal reference voltage.

use crate::hal::adc::{AdcControl, AdcUnit, AdcWidth, Attenuation, TwoPoint};

const LIN_COEFF_A_SCALE: u32 = 65536;
const LIN_COEFF_A_ROUND: u32 = LIN_COEFF_A_SCALE / 2;
const ADC_12_BIT_RES: u32 = 4096;

// Voltages at which the two-point eFuse readings were taken
const TP_LOW_MV: u32 = 150;
const TP_HIGH_MV: u32 = 850;

// Per attenuation gain and offset, indexed by `Attenuation::index`
const ADC1_TP_ATTEN_SCALE: [u32; 4] = [65504, 86975, 120389, 224310];
const ADC2_TP_ATTEN_SCALE: [u32; 4] = [65467, 86861, 120416, 224708];
const ADC1_TP_ATTEN_OFFSET: [u32; 4] = [0, 1, 27, 54];
const ADC2_TP_ATTEN_OFFSET: [u32; 4] = [0, 9, 26, 66];
const ADC1_VREF_ATTEN_SCALE: [u32; 4] = [57431, 76236, 105481, 196602];
const ADC2_VREF_ATTEN_SCALE: [u32; 4] = [57236, 76175, 105678, 197170];
const ADC1_VREF_ATTEN_OFFSET: [u32; 4] = [75, 78, 107, 142];
const ADC2_VREF_ATTEN_OFFSET: [u32; 4] = [63, 66, 89, 128];

/// Where the characterization coefficients came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationSource {
    EfuseTwoPoint,
    EfuseVref,
    DefaultVref,
}

/// Calibration record for one ADC unit and attenuation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcCharacteristics {
    pub unit: AdcUnit,
    pub atten: Attenuation,
    pub width: AdcWidth,
    pub coeff_a: u32,
    pub coeff_b: u32,
    pub vref: u16,
    pub source: CalibrationSource,
}

impl AdcCharacteristics {
    /// Characterize from the best available source: eFuse two-point,
    /// then eFuse reference voltage, then `default_vref`.
    pub fn characterize<C: AdcControl>(
        control: &C,
        unit: AdcUnit,
        atten: Attenuation,
        width: AdcWidth,
        default_vref: u16,
    ) -> Self {
        if let Some(tp) = control.efuse_two_point(unit, atten) {
            if tp.high > tp.low {
                let (coeff_a, coeff_b) = two_point_coefficients(unit, atten, tp);
                return Self {
                    unit,
                    atten,
                    width,
                    coeff_a,
                    coeff_b,
                    vref: default_vref,
                    source: CalibrationSource::EfuseTwoPoint,
                };
            }
            log::warn!("ignoring inconsistent two point eFuse values {:?}", tp);
        }

        let (vref, source) = match control.efuse_vref() {
            Some(vref) => (vref, CalibrationSource::EfuseVref),
            None => (default_vref, CalibrationSource::DefaultVref),
        };
        let (coeff_a, coeff_b) = vref_coefficients(unit, atten, vref);
        Self {
            unit,
            atten,
            width,
            coeff_a,
            coeff_b,
            vref,
            source,
        }
    }

    /// Convert a raw reading at the characterized width to millivolts
    pub fn raw_to_voltage(&self, raw: u32) -> u32 {
        let raw = (raw as u64) << self.width.shift_to_12bit();
        let mv = (self.coeff_a as u64 * raw + LIN_COEFF_A_ROUND as u64)
            / LIN_COEFF_A_SCALE as u64;
        clamp_u32(mv).saturating_add(self.coeff_b)
    }
}

fn two_point_coefficients(unit: AdcUnit, atten: Attenuation, tp: TwoPoint) -> (u32, u32) {
    let (scales, offsets) = match unit {
        AdcUnit::Adc1 => (&ADC1_TP_ATTEN_SCALE, &ADC1_TP_ATTEN_OFFSET),
        AdcUnit::Adc2 => (&ADC2_TP_ATTEN_SCALE, &ADC2_TP_ATTEN_OFFSET),
    };
    let delta_x = (tp.high - tp.low) as u64;
    let delta_v = (TP_HIGH_MV - TP_LOW_MV) as u64;
    let coeff_a = (delta_v * scales[atten.index()] as u64 + delta_x / 2) / delta_x;
    // coeff_b = high_v - (delta_v / delta_x) * high_x + offset, kept non-negative
    let coeff_b = ((TP_HIGH_MV + offsets[atten.index()]) as u64)
        .saturating_sub((delta_v * tp.high as u64 + delta_x / 2) / delta_x);
    (clamp_u32(coeff_a), clamp_u32(coeff_b))
}

fn vref_coefficients(unit: AdcUnit, atten: Attenuation, vref: u16) -> (u32, u32) {
    let (scales, offsets) = match unit {
        AdcUnit::Adc1 => (&ADC1_VREF_ATTEN_SCALE, &ADC1_VREF_ATTEN_OFFSET),
        AdcUnit::Adc2 => (&ADC2_VREF_ATTEN_SCALE, &ADC2_VREF_ATTEN_OFFSET),
    };
    let coeff_a = (vref as u64 * scales[atten.index()] as u64) / ADC_12_BIT_RES as u64;
    (clamp_u32(coeff_a), offsets[atten.index()])
}

fn clamp_u32(v: u64) -> u32 {
    v.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Efuse {
        two_point: Option<TwoPoint>,
        vref: Option<u16>,
    }

    impl AdcControl for Efuse {
        type Error = ();

        fn config_width(&mut self, _: AdcWidth) -> Result<(), ()> {
            Ok(())
        }

        fn config_attenuation(&mut self, _: Attenuation) -> Result<(), ()> {
            Ok(())
        }

        fn efuse_two_point(&self, _: AdcUnit, _: Attenuation) -> Option<TwoPoint> {
            self.two_point
        }

        fn efuse_vref(&self) -> Option<u16> {
            self.vref
        }
    }

    fn characterize(efuse: &Efuse) -> AdcCharacteristics {
        characterize_with(efuse, AdcWidth::Bits12, 1100)
    }

    fn characterize_with(efuse: &Efuse, width: AdcWidth, vref: u16) -> AdcCharacteristics {
        AdcCharacteristics::characterize(efuse, AdcUnit::Adc1, Attenuation::Db11, width, vref)
    }

    #[test]
    fn prefers_two_point() {
        let efuse = Efuse {
            two_point: Some(TwoPoint { low: 300, high: 1300 }),
            vref: Some(1121),
        };
        assert_eq!(characterize(&efuse).source, CalibrationSource::EfuseTwoPoint);
    }

    #[test]
    fn falls_back_to_efuse_vref() {
        let efuse = Efuse { two_point: None, vref: Some(1121) };
        let chars = characterize(&efuse);
        assert_eq!(chars.source, CalibrationSource::EfuseVref);
        assert_eq!(chars.vref, 1121);
    }

    #[test]
    fn falls_back_to_default_vref() {
        let efuse = Efuse { two_point: None, vref: None };
        let chars = characterize(&efuse);
        assert_eq!(chars.source, CalibrationSource::DefaultVref);
        assert_eq!(chars.vref, 1100);
        // 1100 * 196602 / 4096
        assert_eq!(chars.coeff_a, 52798);
        assert_eq!(chars.coeff_b, 142);
    }

    #[test]
    fn inconsistent_two_point_is_ignored() {
        let efuse = Efuse {
            two_point: Some(TwoPoint { low: 1300, high: 1300 }),
            vref: None,
        };
        assert_eq!(characterize(&efuse).source, CalibrationSource::DefaultVref);
    }

    #[test]
    fn default_vref_conversion() {
        let chars = characterize(&Efuse { two_point: None, vref: None });
        assert_eq!(chars.raw_to_voltage(0), 142);
        // (52798 * 2048 + 32768) / 65536 + 142
        assert_eq!(chars.raw_to_voltage(2048), 1792);
    }

    #[test]
    fn narrower_width_is_scaled_up() {
        let efuse = Efuse { two_point: None, vref: None };
        let wide = characterize(&efuse);
        let narrow = characterize_with(&efuse, AdcWidth::Bits10, 1100);
        assert_eq!(narrow.raw_to_voltage(512), wide.raw_to_voltage(2048));
    }

    #[test]
    fn large_reference_voltage_does_not_overflow() {
        let efuse = Efuse { two_point: None, vref: None };
        let chars = characterize_with(&efuse, AdcWidth::Bits12, 30000);
        // 30000 * 196602 / 4096
        assert_eq!(chars.coeff_a, 1_439_956);
        assert_eq!(chars.raw_to_voltage(4095), 90117);

        let efuse = Efuse { two_point: None, vref: Some(u16::MAX) };
        let chars = characterize(&efuse);
        assert_eq!(chars.source, CalibrationSource::EfuseVref);
        assert!(chars.raw_to_voltage(4095) > chars.raw_to_voltage(0));
    }

    #[test]
    fn extreme_two_point_values_do_not_overflow() {
        let efuse = Efuse {
            two_point: Some(TwoPoint { low: 0, high: u32::MAX }),
            vref: None,
        };
        let chars = characterize(&efuse);
        assert_eq!(chars.source, CalibrationSource::EfuseTwoPoint);
        assert_eq!(chars.coeff_a, 0);
        assert_eq!(chars.coeff_b, 204);
    }
}
