use thiserror::Error;

/// Battery sensing errors
///
/// Driver error values are logged where they occur; only the category is
/// carried upwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("i2c bus busy")]
    BusBusy,
    #[error("no AXP192 found, chip id {id:#04x}")]
    ChipNotFound { id: u8 },
    #[error("voltage {0} mV out of range")]
    InvalidVoltage(u16),
    #[error("i2c transfer failed")]
    Bus,
    #[error("adc driver error")]
    Adc,
    #[error("power chip not initialized")]
    NotInitialized,
    #[error("adc not calibrated")]
    Uncalibrated,
}

pub type Result<T> = core::result::Result<T, Error>;

pub(crate) fn bus_error<E: core::fmt::Debug>(err: E) -> Error {
    log::debug!("i2c error: {:?}", err);
    Error::Bus
}

pub(crate) fn adc_error<E: core::fmt::Debug>(err: E) -> Error {
    log::debug!("adc error: {:?}", err);
    Error::Adc
}
