//! In-memory ports for unit tests: two `TouchHw` generations plus mock
//! interrupt allocator, periodic timer and delay providers.

extern crate alloc;

use alloc::boxed::Box;

use std::sync::{Arc, Mutex};

use enumset::EnumSet;

use crate::config::{
    DenoiseCap, DenoiseGrade, FilterConfig, FsmMode, IdleConnection, ShieldDriver, TouchIntr,
    VoltageConfig, MAX_TOUCH_CHANNELS, PROXIMITY_SLOT_COUNT,
};
use crate::errors::{Result, TouchError};
use crate::port::{InterruptAllocator, IsrCallback, PeriodicTimer, TouchHw};

/// Register shadow of one mock peripheral. Tests poke fields directly
/// through the handle returned by `regs()`.
pub(crate) struct MockRegs {
    pub(crate) fsm_mode: FsmMode,
    pub(crate) fsm_running: bool,
    pub(crate) clock_gate: bool,
    pub(crate) module_resets: u32,
    pub(crate) sw_measurements: u32,
    /// When set, a software trigger completes immediately.
    pub(crate) auto_complete_sw: bool,
    pub(crate) meas_done: bool,
    pub(crate) force_done_count: u32,
    pub(crate) current_channel: u8,
    pub(crate) raw: [u32; MAX_TOUCH_CHANNELS],
    pub(crate) smoothed: [u32; MAX_TOUCH_CHANNELS],
    pub(crate) benchmark: [u32; MAX_TOUCH_CHANNELS],
    pub(crate) thresholds: [u32; MAX_TOUCH_CHANNELS],
    pub(crate) channel_mask: u16,
    pub(crate) active_mask: u16,
    pub(crate) io_inited: u16,
    pub(crate) meas_times: u16,
    pub(crate) sleep_ticks: u16,
    pub(crate) voltage: VoltageConfig,
    pub(crate) idle_connection: IdleConnection,
    pub(crate) intr_enabled: EnumSet<TouchIntr>,
    pub(crate) intr_status: EnumSet<TouchIntr>,
    pub(crate) timeout_cycles: u32,
    pub(crate) timeout_resumes: u32,
    pub(crate) denoise_enabled: bool,
    pub(crate) denoise_grade: Option<DenoiseGrade>,
    pub(crate) denoise_cap: Option<DenoiseCap>,
    pub(crate) denoise_data: u32,
    pub(crate) waterproof_enabled: bool,
    pub(crate) waterproof_guard: Option<u8>,
    pub(crate) waterproof_shield: Option<ShieldDriver>,
    pub(crate) proximity_channels: [u8; PROXIMITY_SLOT_COUNT],
    pub(crate) proximity_count: u32,
    pub(crate) proximity_meas_cnt: [u32; PROXIMITY_SLOT_COUNT],
    pub(crate) filter_enabled: bool,
    pub(crate) filter_config: Option<FilterConfig>,
    pub(crate) sleep_channel: Option<u8>,
    pub(crate) sleep_threshold: u32,
    pub(crate) sleep_proximity: bool,
    pub(crate) sleep_data: u32,
    pub(crate) sleep_benchmark: u32,
    pub(crate) sleep_smoothed: u32,
    pub(crate) sleep_proximity_cnt: u32,
}

impl Default for MockRegs {
    fn default() -> Self {
        Self {
            fsm_mode: FsmMode::Timer,
            fsm_running: false,
            clock_gate: false,
            module_resets: 0,
            sw_measurements: 0,
            auto_complete_sw: true,
            meas_done: false,
            force_done_count: 0,
            current_channel: 0,
            raw: [0; MAX_TOUCH_CHANNELS],
            smoothed: [0; MAX_TOUCH_CHANNELS],
            benchmark: [0; MAX_TOUCH_CHANNELS],
            thresholds: [0; MAX_TOUCH_CHANNELS],
            channel_mask: 0,
            active_mask: 0,
            io_inited: 0,
            meas_times: 0,
            sleep_ticks: 0,
            voltage: VoltageConfig::default(),
            idle_connection: IdleConnection::default(),
            intr_enabled: EnumSet::empty(),
            intr_status: EnumSet::empty(),
            timeout_cycles: 0,
            timeout_resumes: 0,
            denoise_enabled: false,
            denoise_grade: None,
            denoise_cap: None,
            denoise_data: 0,
            waterproof_enabled: false,
            waterproof_guard: None,
            waterproof_shield: None,
            proximity_channels: [0; PROXIMITY_SLOT_COUNT],
            proximity_count: 0,
            proximity_meas_cnt: [0; PROXIMITY_SLOT_COUNT],
            filter_enabled: false,
            filter_config: None,
            sleep_channel: None,
            sleep_threshold: 0,
            sleep_proximity: false,
            sleep_data: 0,
            sleep_benchmark: 0,
            sleep_smoothed: 0,
            sleep_proximity_cnt: 0,
        }
    }
}

macro_rules! impl_mock_hw {
    ($name:ident, channels: $count:expr, native: $native:expr, timeout: $timeout:expr,
     slow_hz: $slow:expr, threshold_max: $thr:expr) => {
        pub(crate) struct $name {
            regs: Arc<Mutex<MockRegs>>,
        }

        impl $name {
            pub(crate) fn new() -> Self {
                Self {
                    regs: Arc::new(Mutex::new(MockRegs::default())),
                }
            }

            pub(crate) fn regs(&self) -> Arc<Mutex<MockRegs>> {
                self.regs.clone()
            }

            fn with<R>(&self, f: impl FnOnce(&mut MockRegs) -> R) -> R {
                f(&mut self.regs.lock().unwrap())
            }
        }

        impl TouchHw for $name {
            const CHANNEL_COUNT: u8 = $count;
            const HAS_NATIVE_FILTER: bool = $native;
            const HAS_DENOISE: bool = $native;
            const HAS_WATERPROOF: bool = $native;
            const HAS_PROXIMITY: bool = $native;
            const HAS_SLEEP_CHANNEL: bool = $native;
            const HAS_TIMEOUT: bool = $timeout;
            const UNUSED_CHANNEL: u8 = 0;
            const DENOISE_CHANNEL: u8 = 0;
            const SHIELD_CHANNEL: u8 = $count - 1;
            const SLOW_CLK_HZ: u32 = $slow;
            const FAST_CLK_HZ: u32 = 8_000_000;
            const THRESHOLD_MAX: u32 = $thr;
            const TIMEOUT_MAX: u32 = 0x3f_ffff;

            fn reset_module(&mut self) {
                self.with(|r| r.module_resets += 1);
            }

            fn enable_clock_gate(&mut self, enable: bool) {
                self.with(|r| r.clock_gate = enable);
            }

            fn io_init(&mut self, channel: u8) {
                self.with(|r| r.io_inited |= 1 << channel);
            }

            fn set_fsm_mode(&mut self, mode: FsmMode) {
                self.with(|r| r.fsm_mode = mode);
            }

            fn fsm_mode(&self) -> FsmMode {
                self.with(|r| r.fsm_mode)
            }

            fn start_fsm(&mut self) {
                self.with(|r| r.fsm_running = true);
            }

            fn stop_fsm(&mut self) {
                self.with(|r| r.fsm_running = false);
            }

            fn force_done(&mut self) {
                self.with(|r| {
                    r.force_done_count += 1;
                    r.meas_done = true;
                });
            }

            fn start_sw_measurement(&mut self) {
                self.with(|r| {
                    r.sw_measurements += 1;
                    r.meas_done = r.auto_complete_sw;
                });
            }

            fn meas_is_done(&self) -> bool {
                self.with(|r| r.meas_done)
            }

            fn current_meas_channel(&self) -> u8 {
                self.with(|r| r.current_channel)
            }

            fn read_raw(&self, channel: u8) -> u32 {
                self.with(|r| r.raw[channel as usize])
            }

            fn read_smoothed(&self, channel: u8) -> u32 {
                self.with(|r| r.smoothed[channel as usize])
            }

            fn read_benchmark(&self, channel: u8) -> u32 {
                self.with(|r| r.benchmark[channel as usize])
            }

            fn reset_benchmark(&mut self, channel: Option<u8>) {
                self.with(|r| match channel {
                    Some(ch) => r.benchmark[ch as usize] = 0,
                    None => r.benchmark = [0; MAX_TOUCH_CHANNELS],
                });
            }

            fn set_threshold(&mut self, channel: u8, value: u32) {
                self.with(|r| r.thresholds[channel as usize] = value);
            }

            fn threshold(&self, channel: u8) -> u32 {
                self.with(|r| r.thresholds[channel as usize])
            }

            fn set_channel_mask(&mut self, mask: u16) {
                self.with(|r| r.channel_mask |= mask);
            }

            fn clear_channel_mask(&mut self, mask: u16) {
                self.with(|r| r.channel_mask &= !mask);
            }

            fn channel_mask(&self) -> u16 {
                self.with(|r| r.channel_mask)
            }

            fn active_status_mask(&self) -> u16 {
                self.with(|r| r.active_mask)
            }

            fn clear_active_status(&mut self) {
                self.with(|r| r.active_mask = 0);
            }

            fn set_meas_times(&mut self, times: u16) {
                self.with(|r| r.meas_times = times);
            }

            fn set_sleep_time(&mut self, interval_ticks: u16) {
                self.with(|r| r.sleep_ticks = interval_ticks);
            }

            fn set_voltage(&mut self, config: &VoltageConfig) {
                self.with(|r| r.voltage = *config);
            }

            fn set_idle_connection(&mut self, connection: IdleConnection) {
                self.with(|r| r.idle_connection = connection);
            }

            fn intr_enable(&mut self, mask: EnumSet<TouchIntr>) {
                self.with(|r| r.intr_enabled |= mask);
            }

            fn intr_disable(&mut self, mask: EnumSet<TouchIntr>) {
                self.with(|r| r.intr_enabled -= mask);
            }

            fn intr_clear(&mut self, mask: EnumSet<TouchIntr>) {
                self.with(|r| r.intr_status -= mask);
            }

            fn intr_status(&self) -> EnumSet<TouchIntr> {
                self.with(|r| r.intr_status)
            }

            fn set_timeout(&mut self, cycles: u32) {
                self.with(|r| r.timeout_cycles = cycles);
            }

            fn timeout_resume(&mut self) {
                self.with(|r| r.timeout_resumes += 1);
            }

            fn denoise_enable(&mut self, enable: bool) {
                self.with(|r| r.denoise_enabled = enable);
            }

            fn denoise_set_config(&mut self, grade: DenoiseGrade, cap_level: DenoiseCap) {
                self.with(|r| {
                    r.denoise_grade = Some(grade);
                    r.denoise_cap = Some(cap_level);
                });
            }

            fn denoise_read_data(&self) -> u32 {
                self.with(|r| r.denoise_data)
            }

            fn waterproof_enable(&mut self, enable: bool) {
                self.with(|r| r.waterproof_enabled = enable);
            }

            fn waterproof_set_config(&mut self, guard_channel: u8, shield_driver: ShieldDriver) {
                self.with(|r| {
                    r.waterproof_guard = Some(guard_channel);
                    r.waterproof_shield = Some(shield_driver);
                });
            }

            fn proximity_set_channel(&mut self, slot: u8, channel: u8) {
                self.with(|r| r.proximity_channels[slot as usize] = channel);
            }

            fn proximity_set_count(&mut self, count: u32) {
                self.with(|r| r.proximity_count = count);
            }

            fn proximity_meas_count(&self, slot: u8) -> u32 {
                self.with(|r| r.proximity_meas_cnt[slot as usize])
            }

            fn filter_enable(&mut self, enable: bool) {
                self.with(|r| r.filter_enabled = enable);
            }

            fn filter_set_config(&mut self, config: &FilterConfig) {
                self.with(|r| r.filter_config = Some(*config));
            }

            fn sleep_channel_set(&mut self, channel: u8, enable: bool) {
                self.with(|r| r.sleep_channel = enable.then_some(channel));
            }

            fn sleep_set_threshold(&mut self, threshold: u32) {
                self.with(|r| r.sleep_threshold = threshold);
            }

            fn sleep_threshold(&self) -> u32 {
                self.with(|r| r.sleep_threshold)
            }

            fn sleep_read_data(&self) -> u32 {
                self.with(|r| r.sleep_data)
            }

            fn sleep_read_benchmark(&self) -> u32 {
                self.with(|r| r.sleep_benchmark)
            }

            fn sleep_read_smoothed(&self) -> u32 {
                self.with(|r| r.sleep_smoothed)
            }

            fn sleep_read_proximity_count(&self) -> u32 {
                self.with(|r| r.sleep_proximity_cnt)
            }

            fn sleep_enable_proximity(&mut self, enable: bool) {
                self.with(|r| r.sleep_proximity = enable);
            }
        }
    };
}

impl_mock_hw!(ModernHw, channels: 15, native: true, timeout: true,
    slow_hz: 90_000, threshold_max: 0x3f_ffff);
impl_mock_hw!(LegacyHw, channels: 10, native: false, timeout: false,
    slow_hz: 150_000, threshold_max: 0xffff);

/// Mock interrupt allocator holding at most one handler. Clones share the
/// slot so a test can keep one to fire the interrupt.
#[derive(Clone)]
pub(crate) struct MockIntr {
    slot: Arc<Mutex<Option<IsrCallback>>>,
}

impl MockIntr {
    pub(crate) fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn registered(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }

    /// Invoke the registered handler as the hardware would.
    pub(crate) fn fire(&self) {
        let callback = self.slot.lock().unwrap().take();
        if let Some(mut callback) = callback {
            callback();
            let mut slot = self.slot.lock().unwrap();
            if slot.is_none() {
                *slot = Some(callback);
            }
        }
    }
}

impl InterruptAllocator for MockIntr {
    type Handle = ();

    fn register(&mut self, handler: IsrCallback) -> Result<()> {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_some() {
            return Err(TouchError::AllocationFailure);
        }

        *slot = Some(handler);
        Ok(())
    }

    fn deregister(&mut self, _handle: ()) -> Result<()> {
        let mut slot = self.slot.lock().unwrap();
        if slot.take().is_none() {
            return Err(TouchError::NotFound);
        }

        Ok(())
    }
}

struct TimerInner {
    period_ms: Option<u32>,
    callback: Option<Box<dyn FnMut() + Send>>,
    running: bool,
}

/// Mock periodic timer; `tick` stands in for period expiry.
#[derive(Clone)]
pub(crate) struct MockTimer {
    inner: Arc<Mutex<TimerInner>>,
}

impl MockTimer {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimerInner {
                period_ms: None,
                callback: None,
                running: false,
            })),
        }
    }

    pub(crate) fn running(&self) -> bool {
        self.inner.lock().unwrap().running
    }

    pub(crate) fn period_ms(&self) -> Option<u32> {
        self.inner.lock().unwrap().period_ms
    }

    pub(crate) fn tick(&self, times: u32) {
        for _ in 0..times {
            let callback = {
                let mut inner = self.inner.lock().unwrap();
                if !inner.running {
                    return;
                }
                inner.callback.take()
            };

            if let Some(mut callback) = callback {
                callback();
                let mut inner = self.inner.lock().unwrap();
                if inner.running && inner.callback.is_none() {
                    inner.callback = Some(callback);
                }
            }
        }
    }
}

impl PeriodicTimer for MockTimer {
    fn start(&mut self, period_ms: u32, callback: Box<dyn FnMut() + Send>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.period_ms = Some(period_ms);
        inner.callback = Some(callback);
        inner.running = true;
        Ok(())
    }

    fn set_period(&mut self, period_ms: u32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.callback.is_none() {
            return Err(TouchError::InvalidState);
        }

        inner.period_ms = Some(period_ms);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.running = false;
        inner.callback = None;
        Ok(())
    }
}

/// Delay provider recording the total requested sleep time.
#[derive(Clone)]
pub(crate) struct MockDelay {
    slept_ns: Arc<Mutex<u64>>,
}

impl MockDelay {
    pub(crate) fn new() -> Self {
        Self {
            slept_ns: Arc::new(Mutex::new(0)),
        }
    }

    pub(crate) fn slept_ms(&self) -> u64 {
        *self.slept_ns.lock().unwrap() / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.slept_ns.lock().unwrap() += ns as u64;
    }
}
