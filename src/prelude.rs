//! Commonly used types, re-exported in one place.

pub use crate::config::{
    DenoiseConfig, FilterConfig, FsmMode, MeasureConfig, ProximityConfig, SleepChannelConfig,
    SoftFilterConfig, TouchIntr, TouchRole, VoltageConfig, WaterproofConfig,
};
pub use crate::dispatch::{RegistrationId, TouchEvent};
pub use crate::driver::{FilterReading, TouchDriver};
pub use crate::errors::{Result, TouchError};
pub use crate::fsm::FsmState;
pub use crate::port::{InterruptAllocator, PeriodicTimer, TouchHw};
