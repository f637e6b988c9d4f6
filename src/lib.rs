#![cfg_attr(not(feature = "std"), no_std)]

//! Capacitive touch sensor driver for Espressif-style touch peripherals.
//!
//! The driver implements the measurement state machine, software IIR
//! filtering, denoise/waterproof/proximity/sleep-channel composition and
//! interrupt demultiplexing on top of an abstract register-access port
//! ([`port::TouchHw`]). One port implementation exists per chip
//! generation; generation differences are capability constants on the
//! port, not conditional compilation.
//!
//! ```no_run
//! # fn example<H, A, T, D>(hw: H, intr: A, timer: T, delay: D) -> esp_touch_driver::Result<()>
//! # where
//! #     H: esp_touch_driver::port::TouchHw + 'static,
//! #     A: esp_touch_driver::port::InterruptAllocator,
//! #     T: esp_touch_driver::port::PeriodicTimer,
//! #     D: embedded_hal::delay::DelayNs,
//! # {
//! use esp_touch_driver::config::FsmMode;
//! use esp_touch_driver::TouchDriver;
//!
//! let mut touch = TouchDriver::new(hw, intr, timer, delay)?;
//! touch.configure(3)?;
//! touch.set_threshold(3, 500)?;
//! touch.set_fsm_mode(FsmMode::Timer);
//! let raw = touch.read_raw(3)?;
//! # let _ = raw;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod errors;
pub mod port;
pub mod prelude;
pub mod sync;

mod features;
mod filter;
mod fsm;
mod registry;

#[cfg(test)]
pub(crate) mod mock;

pub use driver::TouchDriver;
pub use errors::{Result, TouchError};
pub use fsm::FsmState;
