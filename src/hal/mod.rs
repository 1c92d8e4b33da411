pub mod adc;
pub mod twi;

// Re-export commonly used types
pub use adc::{AdcControl, AdcUnit, AdcWidth, Attenuation, OneShotChannel, Sampler, TwoPoint};
pub use twi::{BusGuard, SharedBus};
