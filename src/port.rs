//! External interfaces consumed by the driver: the register-access port,
//! the interrupt allocator and the periodic software timer.
//!
//! One [`TouchHw`] implementation exists per chip generation; generation
//! differences (native smoothing circuit, timeout detection, the optional
//! feature blocks) are expressed as associated constants instead of
//! per-target source files.

extern crate alloc;

use alloc::boxed::Box;

use enumset::EnumSet;

use crate::config::{
    DenoiseCap, DenoiseGrade, FilterConfig, FsmMode, IdleConnection, ShieldDriver, TouchIntr,
    VoltageConfig,
};
use crate::errors::Result;

/// Register-level access to one touch peripheral.
///
/// Implementations are plain register readers/writers; all sequencing,
/// validation and bookkeeping live in the driver. Mask-taking operations
/// OR into (`set_channel_mask`) or AND out of (`clear_channel_mask`) the
/// current scan group.
pub trait TouchHw: Send {
    /// Number of touch channels on this generation
    const CHANNEL_COUNT: u8;
    /// Whether the hardware maintains its own benchmark/smoothed values
    const HAS_NATIVE_FILTER: bool;
    const HAS_DENOISE: bool;
    const HAS_WATERPROOF: bool;
    const HAS_PROXIMITY: bool;
    const HAS_SLEEP_CHANNEL: bool;
    /// Whether the sequencer can detect a channel that never completes
    const HAS_TIMEOUT: bool;
    /// Channel id that disables optional slots (proximity, sleep)
    const UNUSED_CHANNEL: u8;
    /// Internal reference channel measured alongside the active one
    const DENOISE_CHANNEL: u8;
    /// Channel wired to the waterproof shield driver
    const SHIELD_CHANNEL: u8;
    /// Frequency of the sleep-interval clock
    const SLOW_CLK_HZ: u32;
    /// Frequency of the measurement clock
    const FAST_CLK_HZ: u32;
    const THRESHOLD_MAX: u32;
    const TIMEOUT_MAX: u32;

    fn reset_module(&mut self);
    fn enable_clock_gate(&mut self, enable: bool);

    /// Prepare a pad for analog use: disable pull-up/down and digital IO.
    fn io_init(&mut self, channel: u8);

    fn set_fsm_mode(&mut self, mode: FsmMode);
    fn fsm_mode(&self) -> FsmMode;
    fn start_fsm(&mut self);
    fn stop_fsm(&mut self);
    /// Abort the measurement currently in flight. The done signal must be
    /// asserted long enough for the sequencer to observe it.
    fn force_done(&mut self);
    fn start_sw_measurement(&mut self);
    fn meas_is_done(&self) -> bool;
    fn current_meas_channel(&self) -> u8;

    fn read_raw(&self, channel: u8) -> u32;
    /// Native smoothed value; meaningful only when `HAS_NATIVE_FILTER`.
    fn read_smoothed(&self, channel: u8) -> u32;
    fn read_benchmark(&self, channel: u8) -> u32;
    /// Reset the benchmark of one channel, or of all channels for `None`.
    fn reset_benchmark(&mut self, channel: Option<u8>);

    fn set_threshold(&mut self, channel: u8, value: u32);
    fn threshold(&self, channel: u8) -> u32;

    fn set_channel_mask(&mut self, mask: u16);
    fn clear_channel_mask(&mut self, mask: u16);
    fn channel_mask(&self) -> u16;
    /// Bitmask of channels currently in the touched state.
    fn active_status_mask(&self) -> u16;
    fn clear_active_status(&mut self);

    fn set_meas_times(&mut self, times: u16);
    fn set_sleep_time(&mut self, interval_ticks: u16);
    fn set_voltage(&mut self, config: &VoltageConfig);
    fn set_idle_connection(&mut self, connection: IdleConnection);

    fn intr_enable(&mut self, mask: EnumSet<TouchIntr>);
    fn intr_disable(&mut self, mask: EnumSet<TouchIntr>);
    fn intr_clear(&mut self, mask: EnumSet<TouchIntr>);
    fn intr_status(&self) -> EnumSet<TouchIntr>;

    /// Measurement timeout in cycles; 0 disables the check.
    fn set_timeout(&mut self, cycles: u32);
    /// Resume the sequencer after a timeout event.
    fn timeout_resume(&mut self);

    fn denoise_enable(&mut self, enable: bool);
    fn denoise_set_config(&mut self, grade: DenoiseGrade, cap_level: DenoiseCap);
    fn denoise_read_data(&self) -> u32;

    fn waterproof_enable(&mut self, enable: bool);
    fn waterproof_set_config(&mut self, guard_channel: u8, shield_driver: ShieldDriver);

    fn proximity_set_channel(&mut self, slot: u8, channel: u8);
    fn proximity_set_count(&mut self, count: u32);
    fn proximity_meas_count(&self, slot: u8) -> u32;

    /// Native filter circuit control; meaningful only when
    /// `HAS_NATIVE_FILTER`.
    fn filter_enable(&mut self, enable: bool);
    fn filter_set_config(&mut self, config: &FilterConfig);

    fn sleep_channel_set(&mut self, channel: u8, enable: bool);
    fn sleep_set_threshold(&mut self, threshold: u32);
    fn sleep_threshold(&self) -> u32;
    fn sleep_read_data(&self) -> u32;
    fn sleep_read_benchmark(&self) -> u32;
    fn sleep_read_smoothed(&self) -> u32;
    fn sleep_read_proximity_count(&self) -> u32;
    fn sleep_enable_proximity(&mut self, enable: bool);
}

/// Callback invoked from interrupt context.
pub type IsrCallback = Box<dyn FnMut() + Send>;

/// Registers a callback to be invoked when the touch interrupt source
/// fires. The driver installs exactly one handler for its lifetime.
pub trait InterruptAllocator {
    type Handle;

    fn register(&mut self, handler: IsrCallback) -> Result<Self::Handle>;
    fn deregister(&mut self, handle: Self::Handle) -> Result<()>;
}

/// A recurring software timer, consumed by the legacy software filter.
pub trait PeriodicTimer {
    fn start(&mut self, period_ms: u32, callback: Box<dyn FnMut() + Send>) -> Result<()>;
    fn set_period(&mut self, period_ms: u32) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}
