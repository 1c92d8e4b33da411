use embedded_hal::blocking::i2c::{Write, WriteRead};

use super::{sealed, PowerSource, VoltageSource};
use crate::config::{EXTERNAL_POWER_MV, PMU_DCDC1_MV};
use crate::drivers::axp192::{Adc1Channel, Axp192, ChargeLed, PowerRail};
use crate::error::{Error, Result};
use crate::hal::twi::SharedBus;

// Rails the board needs, in switch-on order
const BOARD_RAILS: [PowerRail; 5] = [
    PowerRail::Ldo2,
    PowerRail::Ldo3,
    PowerRail::Dcdc2,
    PowerRail::Exten,
    PowerRail::Dcdc1,
];

/// Battery sensing through an AXP192 on the shared sensor bus
///
/// Every access, reads included, holds the bus lock and fails fast when
/// another driver has it.
pub struct PmuSense<'a, I2C> {
    bus: &'a SharedBus<I2C>,
    ready: bool,
}

impl<'a, I2C, E> PmuSense<'a, I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: core::fmt::Debug,
{
    pub fn new(bus: &'a SharedBus<I2C>) -> Self {
        Self { bus, ready: false }
    }

    /// Whether the chip answered during [`VoltageSource::init`]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn configure(pmu: &mut Axp192<'_, I2C>) -> Result<()> {
        for rail in BOARD_RAILS {
            pmu.set_power_output(rail, true)?;
        }
        pmu.set_dcdc1_voltage(PMU_DCDC1_MV)?;
        pmu.set_charge_led(ChargeLed::LowLevel)?;
        pmu.enable_adc1(Adc1Channel::BatteryCurrent, true)
    }

    fn detect_source(pmu: &mut Axp192<'_, I2C>) -> Result<PowerSource> {
        if pmu.is_battery_connected()? {
            Ok(PowerSource::Battery {
                charging: pmu.is_charging()?,
            })
        } else if pmu.is_vbus_present()? {
            Ok(PowerSource::External)
        } else {
            Ok(PowerSource::Unknown)
        }
    }
}

impl<I2C> sealed::Sealed for PmuSense<'_, I2C> {}

impl<'a, I2C, E> VoltageSource for PmuSense<'a, I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: core::fmt::Debug,
{
    fn init(&mut self) -> Result<()> {
        let bus = self.bus;
        let mut guard = bus.try_lock()?;
        let mut pmu = Axp192::new(&mut *guard);

        pmu.begin()?;
        self.ready = true;
        Self::configure(&mut pmu)?;
        log::info!("AXP192 PMU initialized");

        match Self::detect_source(&mut pmu)? {
            PowerSource::Battery { charging: true } => log::info!("Running on battery, charging"),
            PowerSource::Battery { charging: false } => {
                log::info!("Running on battery, not charging")
            }
            PowerSource::External => log::info!("Running on USB power"),
            PowerSource::Unknown => {}
        }
        Ok(())
    }

    fn read_voltage(&mut self) -> Result<u16> {
        if !self.ready {
            return Err(Error::NotInitialized);
        }
        let mut guard = self.bus.try_lock()?;
        let mut pmu = Axp192::new(&mut *guard);

        if pmu.is_vbus_present()? {
            Ok(EXTERNAL_POWER_MV)
        } else {
            pmu.battery_voltage()
        }
    }

    fn power_source(&mut self) -> Result<PowerSource> {
        if !self.ready {
            return Err(Error::NotInitialized);
        }
        let mut guard = self.bus.try_lock()?;
        Self::detect_source(&mut Axp192::new(&mut *guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::axp192::AXP192_ADDR;
    use crate::power::{BatteryLevel, BatteryMonitor};
    use embedded_hal_mock::i2c::{Mock, Transaction};

    fn read(reg: u8, val: u8) -> Transaction {
        Transaction::write_read(AXP192_ADDR, vec![reg], vec![val])
    }

    fn write(reg: u8, val: u8) -> Transaction {
        Transaction::write(AXP192_ADDR, vec![reg, val])
    }

    // Chip id check, rail and LED setup, then the power source reads
    fn bring_up(source_reads: &[Transaction]) -> Vec<Transaction> {
        let mut expectations = vec![
            read(0x03, 0x03),
            read(0x12, 0x00),
            write(0x12, 0b0000_0100),
            read(0x12, 0b0000_0100),
            write(0x12, 0b0000_1100),
            read(0x12, 0b0000_1100),
            write(0x12, 0b0001_1100),
            read(0x12, 0b0001_1100),
            write(0x12, 0b0101_1100),
            read(0x12, 0b0101_1100),
            write(0x12, 0b0101_1101),
            write(0x26, 104),
            read(0x32, 0x00),
            write(0x32, 0b0011_1000),
            read(0x82, 0x83),
            write(0x82, 0xC3),
        ];
        expectations.extend_from_slice(source_reads);
        expectations
    }

    #[test]
    fn init_configures_rails_and_reads_battery() {
        let mut expectations = bring_up(&[read(0x01, 0x60), read(0x01, 0x60)]);
        expectations.push(read(0x00, 0x00));
        expectations.push(Transaction::write_read(AXP192_ADDR, vec![0x78], vec![0xE1, 0x0A]));
        let bus = SharedBus::new(Mock::new(&expectations));

        let mut monitor = BatteryMonitor::new(PmuSense::new(&bus));
        monitor.init_power_chip();
        assert!(monitor.source().is_ready());
        // 0xE1A = 3610 counts -> 3971 mV
        assert_eq!(monitor.battery_level(), BatteryLevel::Max);
        assert!(!bus.is_locked());

        drop(monitor);
        bus.into_inner().done();
    }

    #[test]
    fn usb_power_reports_external() {
        let mut expectations = bring_up(&[read(0x01, 0x00), read(0x00, 0x20)]);
        expectations.push(read(0x00, 0x20));
        expectations.push(read(0x00, 0x20));
        let bus = SharedBus::new(Mock::new(&expectations));

        let mut monitor = BatteryMonitor::new(PmuSense::new(&bus));
        monitor.init_power_chip();
        assert_eq!(monitor.read_voltage(), 0xFFFF);
        assert_eq!(monitor.battery_level(), BatteryLevel::ExternalPower);

        drop(monitor);
        bus.into_inner().done();
    }

    #[test]
    fn busy_bus_skips_init() {
        let expectations: [Transaction; 0] = [];
        let bus = SharedBus::new(Mock::new(&expectations));
        let mut monitor = BatteryMonitor::new(PmuSense::new(&bus));

        let guard = bus.try_lock().unwrap();
        monitor.init_power_chip();
        drop(guard);

        assert!(!monitor.source().is_ready());
        assert_eq!(monitor.battery_level(), BatteryLevel::Unknown);

        drop(monitor);
        bus.into_inner().done();
    }

    #[test]
    fn wrong_chip_leaves_pmu_unconfigured() {
        let expectations = [read(0x03, 0x47)];
        let bus = SharedBus::new(Mock::new(&expectations));

        let mut monitor = BatteryMonitor::new(PmuSense::new(&bus));
        monitor.init_power_chip();
        assert!(!monitor.source().is_ready());
        assert!(!bus.is_locked());
        assert_eq!(monitor.try_read_voltage(), Err(Error::NotInitialized));
        assert_eq!(monitor.battery_level(), BatteryLevel::Unknown);

        drop(monitor);
        bus.into_inner().done();
    }

    #[test]
    fn read_while_bus_busy_is_unknown() {
        let expectations = bring_up(&[read(0x01, 0x20), read(0x01, 0x20)]);
        let bus = SharedBus::new(Mock::new(&expectations));

        let mut monitor = BatteryMonitor::new(PmuSense::new(&bus));
        monitor.init_power_chip();

        let guard = bus.try_lock().unwrap();
        assert_eq!(monitor.try_read_voltage(), Err(Error::BusBusy));
        assert_eq!(monitor.battery_level(), BatteryLevel::Unknown);
        drop(guard);

        drop(monitor);
        bus.into_inner().done();
    }
}
