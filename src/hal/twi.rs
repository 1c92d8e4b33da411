//! Shared TWI (I2C) bus access
//!
//! Several drivers sit on the same sensor bus. Access goes through
//! [`SharedBus::try_lock`], which never waits: a busy bus is reported to the
//! caller straight away. The returned [`BusGuard`] releases the bus when it
//! is dropped, including on early returns.

use core::cell::{RefCell, RefMut};
use core::ops::{Deref, DerefMut};

use crate::error::Error;

/// I2C bus shared between drivers on one execution context
pub struct SharedBus<I2C> {
    bus: RefCell<I2C>,
}

impl<I2C> SharedBus<I2C> {
    pub const fn new(bus: I2C) -> Self {
        Self {
            bus: RefCell::new(bus),
        }
    }

    /// Take the bus without blocking
    pub fn try_lock(&self) -> Result<BusGuard<'_, I2C>, Error> {
        self.bus
            .try_borrow_mut()
            .map(|bus| BusGuard { bus })
            .map_err(|_| Error::BusBusy)
    }

    pub fn is_locked(&self) -> bool {
        self.bus.try_borrow_mut().is_err()
    }

    /// Give back the underlying bus
    pub fn into_inner(self) -> I2C {
        self.bus.into_inner()
    }
}

/// Exclusive access to a [`SharedBus`] for the guard's lifetime
pub struct BusGuard<'a, I2C> {
    bus: RefMut<'a, I2C>,
}

impl<I2C> Deref for BusGuard<'_, I2C> {
    type Target = I2C;

    fn deref(&self) -> &I2C {
        &self.bus
    }
}

impl<I2C> DerefMut for BusGuard<'_, I2C> {
    fn deref_mut(&mut self) -> &mut I2C {
        &mut self.bus
    }
}
