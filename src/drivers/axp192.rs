//! AXP192 power management unit driver

use embedded_hal::blocking::i2c::{Write, WriteRead};

use crate::error::{bus_error, Error, Result};

pub const AXP192_ADDR: u8 = 0x34;
const AXP192_CHIP_ID: u8 = 0x03;

// AXP192 registers
const REG_POWER_STATUS: u8 = 0x00;
const REG_CHARGE_STATUS: u8 = 0x01;
const REG_CHIP_ID: u8 = 0x03;
const REG_OUTPUT_CTL: u8 = 0x12;
const REG_DCDC1_VOLTAGE: u8 = 0x26;
const REG_OFF_CTL: u8 = 0x32;
const REG_BAT_VOLTAGE_H8: u8 = 0x78;
const REG_ADC_EN1: u8 = 0x82;

const VBUS_PRESENT: u8 = 1 << 5;
const BATTERY_PRESENT: u8 = 1 << 5;
const CHARGING: u8 = 1 << 6;
const CHG_LED_MANUAL: u8 = 1 << 3;
const CHG_LED_MASK: u8 = 0b0011_0000;

const DCDC1_MIN_MV: u16 = 700;
const DCDC1_MAX_MV: u16 = 3500;
const DCDC1_STEP_MV: u16 = 25;

/// Switchable output rails, by bit in the output control register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerRail {
    Dcdc1 = 0,
    Dcdc3 = 1,
    Ldo2 = 2,
    Ldo3 = 3,
    Dcdc2 = 4,
    Exten = 6,
}

/// Charge indicator LED behaviour
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChargeLed {
    Off = 0,
    Blink1Hz = 1,
    Blink4Hz = 2,
    LowLevel = 3,
}

/// Channels of the first ADC enable register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Adc1Channel {
    BatteryVoltage = 7,
    BatteryCurrent = 6,
    AcinVoltage = 5,
    AcinCurrent = 4,
    VbusVoltage = 3,
    VbusCurrent = 2,
}

/// AXP192 driver borrowing the bus for the duration of one transaction sequence
pub struct Axp192<'a, I2C> {
    i2c: &'a mut I2C,
}

impl<'a, I2C, E> Axp192<'a, I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: core::fmt::Debug,
{
    pub fn new(i2c: &'a mut I2C) -> Self {
        Self { i2c }
    }

    /// Check the chip answers with the expected id
    pub fn begin(&mut self) -> Result<()> {
        let id = self.read_reg(REG_CHIP_ID)?;
        if id != AXP192_CHIP_ID {
            return Err(Error::ChipNotFound { id });
        }
        Ok(())
    }

    pub fn set_power_output(&mut self, rail: PowerRail, on: bool) -> Result<()> {
        let bit = 1 << rail as u8;
        self.modify_reg(REG_OUTPUT_CTL, |r| if on { r | bit } else { r & !bit })
    }

    pub fn set_dcdc1_voltage(&mut self, mv: u16) -> Result<()> {
        if !(DCDC1_MIN_MV..=DCDC1_MAX_MV).contains(&mv) {
            return Err(Error::InvalidVoltage(mv));
        }
        let val = ((mv - DCDC1_MIN_MV) / DCDC1_STEP_MV) as u8;
        self.write_reg(REG_DCDC1_VOLTAGE, val & 0x7F)
    }

    pub fn set_charge_led(&mut self, mode: ChargeLed) -> Result<()> {
        self.modify_reg(REG_OFF_CTL, |r| {
            (r & !CHG_LED_MASK) | CHG_LED_MANUAL | ((mode as u8) << 4)
        })
    }

    pub fn enable_adc1(&mut self, channel: Adc1Channel, on: bool) -> Result<()> {
        let bit = 1 << channel as u8;
        self.modify_reg(REG_ADC_EN1, |r| if on { r | bit } else { r & !bit })
    }

    pub fn is_vbus_present(&mut self) -> Result<bool> {
        Ok(self.read_reg(REG_POWER_STATUS)? & VBUS_PRESENT != 0)
    }

    pub fn is_battery_connected(&mut self) -> Result<bool> {
        Ok(self.read_reg(REG_CHARGE_STATUS)? & BATTERY_PRESENT != 0)
    }

    pub fn is_charging(&mut self) -> Result<bool> {
        Ok(self.read_reg(REG_CHARGE_STATUS)? & CHARGING != 0)
    }

    /// Battery voltage in millivolts, 1.1 mV per LSB
    pub fn battery_voltage(&mut self) -> Result<u16> {
        let mut data = [0u8; 2];
        self.read_regs(REG_BAT_VOLTAGE_H8, &mut data)?;
        let raw = (data[0] as u32) << 4 | (data[1] & 0x0F) as u32;
        Ok((raw * 11 / 10) as u16)
    }

    fn modify_reg<F>(&mut self, reg: u8, f: F) -> Result<()>
    where
        F: FnOnce(u8) -> u8,
    {
        let val = self.read_reg(reg)?;
        self.write_reg(reg, f(val))
    }

    fn write_reg(&mut self, reg: u8, val: u8) -> Result<()> {
        self.i2c.write(AXP192_ADDR, &[reg, val]).map_err(bus_error)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8> {
        let mut data = [0u8; 1];
        self.read_regs(reg, &mut data)?;
        Ok(data[0])
    }

    fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<()> {
        self.i2c
            .write_read(AXP192_ADDR, &[reg], buffer)
            .map_err(bus_error)
    }
}
