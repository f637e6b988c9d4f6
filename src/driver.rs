//! The touch driver facade: owns the hardware port, the channel registry,
//! the software state machine, the interrupt dispatcher and the optional
//! software filter, and exposes the public operation set.
//!
//! Configuration requires `&mut self`, so concurrent reconfiguration from
//! several tasks is serialized by ownership; the state shared with the
//! interrupt path sits behind a critical-section mutex.

extern crate alloc;

use alloc::boxed::Box;
use alloc::sync::Arc;

use embedded_hal::delay::DelayNs;
use enumset::EnumSet;
use log::debug;

use crate::config::{
    DenoiseConfig, FilterConfig, FsmMode, IdleConnection, MeasureConfig, ProximityConfig,
    SleepChannelConfig, SoftFilterConfig, TouchIntr, TouchRole, VoltageConfig, WaterproofConfig,
    MAX_TOUCH_CHANNELS,
};
use crate::dispatch::{Dispatcher, EventCallback, RegistrationId};
use crate::errors::{Result, TouchError};
use crate::features::FeatureState;
use crate::filter::{validate_filter_config, SoftFilter};
use crate::fsm::{FsmController, FsmState};
use crate::port::{InterruptAllocator, PeriodicTimer, TouchHw};
use crate::registry::ChannelRegistry;
use crate::sync::IsrMutex;

/// Iteration bound for the software-trigger measurement wait. The
/// reference behavior spins forever; a wedged sequencer surfaces
/// [`TouchError::Timeout`] here instead.
const SW_MEAS_POLL_LIMIT: u32 = 100_000;

/// One channel's readings delivered by the software filter refresh.
#[derive(Copy, Clone, Debug)]
pub struct FilterReading {
    pub channel: u8,
    pub raw: u32,
    pub filtered: u32,
}

/// Callback invoked after every software filter refresh, outside the
/// driver's internal lock.
pub type FilterReadCallback = Box<dyn FnMut(&[FilterReading]) + Send>;

struct DriverState<H: TouchHw> {
    hw: H,
    registry: ChannelRegistry,
    fsm: FsmController,
    dispatcher: Dispatcher,
    filter: Option<SoftFilter>,
    filter_running: bool,
    filter_cb: Option<FilterReadCallback>,
    hw_filter: Option<FilterConfig>,
    features: FeatureState,
}

/// Driver for one touch peripheral.
///
/// Created with [`TouchDriver::new`]; dropping it (or calling
/// [`deinit`](TouchDriver::deinit)) stops the sequencer, disables and
/// deregisters the interrupt and resets the module.
pub struct TouchDriver<H, A, T, D>
where
    H: TouchHw + 'static,
    A: InterruptAllocator,
    T: PeriodicTimer,
    D: DelayNs,
{
    shared: Arc<IsrMutex<DriverState<H>>>,
    intr: A,
    timer: T,
    delay: D,
    isr_handle: Option<A::Handle>,
}

impl<H, A, T, D> TouchDriver<H, A, T, D>
where
    H: TouchHw + 'static,
    A: InterruptAllocator,
    T: PeriodicTimer,
    D: DelayNs,
{
    /// Initialize the peripheral: program the default measurement,
    /// voltage and connection parameters and install the interrupt
    /// handler. The sequencer is left idle.
    pub fn new(mut hw: H, mut intr: A, timer: T, delay: D) -> Result<Self> {
        hw.reset_module();
        hw.intr_disable(EnumSet::all());
        hw.intr_clear(EnumSet::all());

        let mut fsm = FsmController::new();
        fsm.apply_measure_config(&mut hw, &MeasureConfig::default());
        hw.set_voltage(&VoltageConfig::default());
        hw.set_idle_connection(IdleConnection::default());
        hw.set_fsm_mode(fsm.mode());

        let shared = Arc::new(IsrMutex::new(DriverState {
            hw,
            registry: ChannelRegistry::new(H::CHANNEL_COUNT),
            fsm,
            dispatcher: Dispatcher::new(),
            filter: None,
            filter_running: false,
            filter_cb: None,
            hw_filter: None,
            features: FeatureState::new(),
        }));

        let isr_shared = shared.clone();
        let handle = intr.register(Box::new(move || {
            isr_shared.lock(|state| {
                let DriverState { hw, dispatcher, .. } = state;
                dispatcher.dispatch(hw);
            });
        }))?;

        debug!("touch driver initialized, {} channels", H::CHANNEL_COUNT);
        Ok(Self {
            shared,
            intr,
            timer,
            delay,
            isr_handle: Some(handle),
        })
    }

    /// Tear the driver down. Equivalent to dropping it.
    pub fn deinit(self) {}

    // ------------------------------------------------------------------
    // Channel configuration

    /// Enroll a channel in the normal scan group.
    pub fn configure(&mut self, channel: u8) -> Result<()> {
        self.configure_role(channel, TouchRole::Normal)
    }

    /// Enroll a channel with an explicit role. The sequencer timer is
    /// stopped around the scan-mask mutation and restarted afterwards,
    /// followed by a one-measurement-cycle wait.
    pub fn configure_role(&mut self, channel: u8, role: TouchRole) -> Result<()> {
        let restarted = self.with_fsm_paused(|state| {
            let DriverState { hw, registry, .. } = state;
            registry.configure(hw, channel, role)
        })?;

        if restarted {
            self.measure_wait();
        }
        Ok(())
    }

    /// Remove a channel from the scan group and drop its role.
    pub fn clear_channel(&mut self, channel: u8) -> Result<()> {
        self.with_fsm_paused(|state| {
            let DriverState { hw, registry, .. } = state;
            registry.clear(hw, channel)
        })?;
        Ok(())
    }

    pub fn clear_all_channels(&mut self) {
        let _ = self.with_fsm_paused(|state| {
            let DriverState { hw, registry, .. } = state;
            registry.clear_all(hw);
            Ok(())
        });
    }

    pub fn channel_role(&self, channel: u8) -> Result<TouchRole> {
        self.shared.lock(|state| {
            state.registry.check_channel(channel)?;
            Ok(state.registry.role(channel))
        })
    }

    pub fn set_threshold(&mut self, channel: u8, value: u32) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState { hw, registry, .. } = state;
            registry.set_threshold(hw, channel, value)
        })
    }

    pub fn threshold(&self, channel: u8) -> Result<u32> {
        self.shared.lock(|state| {
            let DriverState { hw, registry, .. } = state;
            registry.threshold(hw, channel)
        })
    }

    /// Bitmask of channels currently in the scan group.
    pub fn channel_mask(&self) -> u16 {
        self.shared.lock(|state| state.hw.channel_mask())
    }

    /// Add channels to the scan group by mask, without touching roles.
    pub fn set_group_mask(&mut self, mask: u16) -> Result<()> {
        self.shared.lock(|state| {
            if mask & !state.registry.full_mask() != 0 {
                return Err(TouchError::InvalidArg);
            }
            state.hw.set_channel_mask(mask);
            Ok(())
        })
    }

    /// Remove channels from the scan group by mask.
    pub fn clear_group_mask(&mut self, mask: u16) -> Result<()> {
        self.shared.lock(|state| {
            if mask & !state.registry.full_mask() != 0 {
                return Err(TouchError::InvalidArg);
            }
            state.hw.clear_channel_mask(mask);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Measurement parameters

    pub fn set_measurement(&mut self, config: MeasureConfig) -> Result<()> {
        let restarted = self.with_fsm_paused(|state| {
            let DriverState { hw, fsm, .. } = state;
            fsm.apply_measure_config(hw, &config);
            Ok(())
        })?;

        if restarted {
            self.measure_wait();
        }
        Ok(())
    }

    pub fn set_voltage(&mut self, config: VoltageConfig) {
        self.shared.lock(|state| state.hw.set_voltage(&config));
    }

    pub fn set_idle_connection(&mut self, connection: IdleConnection) {
        self.shared
            .lock(|state| state.hw.set_idle_connection(connection));
    }

    /// Per-channel measurement timeout in cycles; 0 disables the check.
    pub fn set_timeout(&mut self, cycles: u32) -> Result<()> {
        if !H::HAS_TIMEOUT {
            return Err(TouchError::NotSupported);
        }
        if cycles > H::TIMEOUT_MAX {
            return Err(TouchError::InvalidArg);
        }

        self.shared.lock(|state| state.hw.set_timeout(cycles));
        Ok(())
    }

    /// Resume the sequencer after a timeout event. Without this call the
    /// sequencer stays parked on the timed-out channel.
    pub fn timeout_resume(&mut self) -> Result<()> {
        if !H::HAS_TIMEOUT {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| state.hw.timeout_resume());
        Ok(())
    }

    // ------------------------------------------------------------------
    // FSM control

    /// Change the trigger mode. Timer mode restarts automatically;
    /// software mode stays idle until [`start`](Self::start).
    pub fn set_fsm_mode(&mut self, mode: FsmMode) {
        self.shared.lock(|state| {
            let DriverState { hw, fsm, .. } = state;
            fsm.set_mode(hw, mode);
        });

        if mode == FsmMode::Timer {
            self.measure_wait();
        }
    }

    pub fn fsm_mode(&self) -> FsmMode {
        self.shared.lock(|state| state.fsm.mode())
    }

    pub fn fsm_state(&self) -> FsmState {
        self.shared.lock(|state| state.fsm.state())
    }

    pub fn start(&mut self) -> Result<()> {
        let timer_mode = self.shared.lock(|state| {
            if state.fsm.state() != FsmState::Idle {
                return Err(TouchError::InvalidState);
            }

            let DriverState { hw, fsm, .. } = state;
            fsm.start(hw);
            Ok(fsm.state() == FsmState::TimerDriven)
        })?;

        if timer_mode {
            self.measure_wait();
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.shared.lock(|state| {
            let DriverState { hw, fsm, .. } = state;
            fsm.stop(hw);
        });
    }

    /// Kick off one software-triggered scan pass. Fails with
    /// `InvalidState` unless the driver is started in software mode.
    pub fn trigger_once(&mut self) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState { hw, fsm, .. } = state;
            fsm.trigger_once(hw)
        })
    }

    /// Raw counter value of a channel.
    ///
    /// In software mode this waits (bounded) for the in-flight scan pass
    /// to complete; in timer mode it returns the last completed
    /// measurement without blocking. A zero reading is the reserved
    /// measurement-fault value and surfaces `HardwareFault`.
    pub fn read_raw(&mut self, channel: u8) -> Result<u32> {
        let software = self.shared.lock(|state| {
            state.registry.check_channel(channel)?;
            if state.registry.role(channel) == TouchRole::Denoise {
                // The reference channel is not application readable.
                return Err(TouchError::InvalidArg);
            }

            match state.fsm.state() {
                FsmState::Idle => Err(TouchError::InvalidState),
                FsmState::TimerDriven => Ok(false),
                FsmState::SoftwareTriggered => Ok(true),
            }
        })?;

        if software {
            // Poll in short critical sections so the interrupt path is
            // never starved by the wait.
            let mut done = false;
            for _ in 0..SW_MEAS_POLL_LIMIT {
                if self.shared.lock(|state| state.hw.meas_is_done()) {
                    done = true;
                    break;
                }
                core::hint::spin_loop();
            }

            if !done {
                return Err(TouchError::Timeout);
            }
        }

        let raw = self.shared.lock(|state| {
            state.fsm.measurement_done();
            state.hw.read_raw(channel)
        });

        if raw == 0 {
            return Err(TouchError::HardwareFault);
        }
        Ok(raw)
    }

    /// Hardware benchmark (running baseline) of a channel.
    pub fn read_benchmark(&self, channel: u8) -> Result<u32> {
        if !H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| {
            state.registry.check_channel(channel)?;
            Ok(state.hw.read_benchmark(channel))
        })
    }

    /// Hardware smoothed value of a channel.
    pub fn read_smoothed(&self, channel: u8) -> Result<u32> {
        if !H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| {
            state.registry.check_channel(channel)?;
            Ok(state.hw.read_smoothed(channel))
        })
    }

    /// Reset the benchmark of one channel, or of all channels.
    pub fn reset_benchmark(&mut self, channel: Option<u8>) -> Result<()> {
        if !H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| {
            if let Some(channel) = channel {
                state.registry.check_channel(channel)?;
            }
            state.hw.reset_benchmark(channel);
            Ok(())
        })
    }

    /// Bitmask of channels currently in the touched state.
    pub fn status(&self) -> u16 {
        self.shared.lock(|state| state.hw.active_status_mask())
    }

    pub fn clear_status(&mut self) {
        self.shared.lock(|state| state.hw.clear_active_status());
    }

    pub fn current_meas_channel(&self) -> u8 {
        self.shared.lock(|state| state.hw.current_meas_channel())
    }

    // ------------------------------------------------------------------
    // Interrupt callbacks

    /// Register a callback for the given interrupt categories and enable
    /// the matching hardware interrupts.
    pub fn isr_register(
        &mut self,
        mask: EnumSet<TouchIntr>,
        callback: EventCallback,
    ) -> Result<RegistrationId> {
        self.shared.lock(|state| {
            let id = state.dispatcher.register(mask, callback)?;
            state.hw.intr_clear(mask);
            state.hw.intr_enable(mask);
            Ok(id)
        })
    }

    /// Remove a registration; interrupt categories no longer referenced
    /// by any registration are disabled in hardware.
    pub fn isr_deregister(&mut self, id: RegistrationId) -> Result<()> {
        self.shared.lock(|state| {
            state.dispatcher.deregister(id)?;
            let unused = EnumSet::all() - state.dispatcher.enabled_union();
            state.hw.intr_disable(unused);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Software filter (generations without a native smoothing circuit)

    /// Start the periodic software IIR filter.
    pub fn filter_start(&mut self, config: SoftFilterConfig) -> Result<()> {
        if H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }

        let period_ms = self.shared.lock(|state| {
            if state.filter.is_some() {
                return Err(TouchError::InvalidState);
            }

            let mut filter = SoftFilter::new(config)?;

            // Seed from the current readings so the first refresh does
            // not start cold.
            let DriverState { hw, registry, .. } = state;
            let mut mask = registry.enabled_scan_mask();
            while mask != 0 {
                let channel = mask.trailing_zeros() as u8;
                mask &= mask - 1;
                filter.update(channel, hw.read_raw(channel));
            }

            let period_ms = filter.period_ms();
            state.filter = Some(filter);
            Ok(period_ms)
        })?;

        let tick_shared = self.shared.clone();
        self.timer
            .start(period_ms, Box::new(move || Self::filter_tick(&tick_shared)))
            .map_err(|_| TouchError::AllocationFailure)?;

        self.shared.lock(|state| state.filter_running = true);
        Ok(())
    }

    /// Pause the filter timer; filter state is retained.
    pub fn filter_stop(&mut self) -> Result<()> {
        self.shared.lock(|state| {
            if state.filter.is_none() {
                return Err(TouchError::NotInitialized);
            }
            state.filter_running = false;
            Ok(())
        })?;

        self.timer.stop()
    }

    /// Stop the filter and discard its state and callback.
    pub fn filter_delete(&mut self) -> Result<()> {
        self.shared.lock(|state| {
            if state.filter.take().is_none() {
                return Err(TouchError::NotInitialized);
            }
            state.filter_running = false;
            state.filter_cb = None;
            Ok(())
        })?;

        self.timer.stop()
    }

    /// Last raw and filtered values of a channel.
    pub fn filter_read(&self, channel: u8) -> Result<(u32, u32)> {
        self.shared.lock(|state| {
            state.registry.check_channel(channel)?;
            let filter = state.filter.as_ref().ok_or(TouchError::NotInitialized)?;
            filter.value(channel).ok_or(TouchError::NotInitialized)
        })
    }

    pub fn set_filter_period(&mut self, period_ms: u32) -> Result<()> {
        let running = self.shared.lock(|state| {
            let filter = state.filter.as_mut().ok_or(TouchError::NotInitialized)?;
            filter.set_period_ms(period_ms)?;
            Ok::<bool, TouchError>(state.filter_running)
        })?;

        if running {
            self.timer.set_period(period_ms)?;
        }
        Ok(())
    }

    pub fn filter_period(&self) -> Result<u32> {
        self.shared.lock(|state| {
            let filter = state.filter.as_ref().ok_or(TouchError::NotInitialized)?;
            Ok(filter.period_ms())
        })
    }

    /// Install a callback invoked after each filter refresh with the
    /// readings of every scanned channel.
    pub fn filter_set_read_cb(&mut self, callback: FilterReadCallback) -> Result<()> {
        if H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| state.filter_cb = Some(callback));
        Ok(())
    }

    fn filter_tick(shared: &Arc<IsrMutex<DriverState<H>>>) {
        let (readings, callback) = shared.lock(|state| {
            let DriverState {
                hw,
                registry,
                filter,
                filter_cb,
                ..
            } = state;

            let mut readings: heapless::Vec<FilterReading, MAX_TOUCH_CHANNELS> =
                heapless::Vec::new();

            if let Some(filter) = filter.as_mut() {
                let mut mask = registry.enabled_scan_mask();
                while mask != 0 {
                    let channel = mask.trailing_zeros() as u8;
                    mask &= mask - 1;
                    filter.update(channel, hw.read_raw(channel));
                    if let Some((raw, filtered)) = filter.value(channel) {
                        let _ = readings.push(FilterReading {
                            channel,
                            raw,
                            filtered,
                        });
                    }
                }
            }

            (readings, filter_cb.take())
        });

        // The user callback runs outside the critical section.
        if let Some(mut callback) = callback {
            callback(&readings);
            shared.lock(|state| {
                if state.filter_cb.is_none() {
                    state.filter_cb = Some(callback);
                }
            });
        }
    }

    // ------------------------------------------------------------------
    // Native filter circuit

    pub fn filter_set_config(&mut self, config: FilterConfig) -> Result<()> {
        if !H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }
        validate_filter_config(&config)?;

        self.shared.lock(|state| {
            state.hw.filter_set_config(&config);
            state.hw_filter = Some(config);
        });
        Ok(())
    }

    pub fn filter_config(&self) -> Result<Option<FilterConfig>> {
        if !H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }

        Ok(self.shared.lock(|state| state.hw_filter))
    }

    pub fn filter_enable(&mut self) -> Result<()> {
        if !H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| state.hw.filter_enable(true));
        Ok(())
    }

    pub fn filter_disable(&mut self) -> Result<()> {
        if !H::HAS_NATIVE_FILTER {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| state.hw.filter_enable(false));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Feature blocks

    pub fn denoise_enable(&mut self, config: DenoiseConfig) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState {
                hw,
                registry,
                features,
                ..
            } = state;
            features.denoise_enable(hw, registry, config)
        })
    }

    pub fn denoise_disable(&mut self) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState { hw, features, .. } = state;
            features.denoise_disable(hw)
        })
    }

    pub fn denoise_config(&self) -> Option<DenoiseConfig> {
        self.shared.lock(|state| state.features.denoise_config())
    }

    /// Raw reading of the internal reference channel.
    pub fn denoise_read_data(&self) -> Result<u32> {
        if !H::HAS_DENOISE {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| Ok(state.hw.denoise_read_data()))
    }

    pub fn waterproof_enable(&mut self, config: WaterproofConfig) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState {
                hw,
                registry,
                features,
                ..
            } = state;
            features.waterproof_enable(hw, registry, config)
        })
    }

    pub fn waterproof_disable(&mut self) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState { hw, features, .. } = state;
            features.waterproof_disable(hw)
        })
    }

    pub fn waterproof_config(&self) -> Option<WaterproofConfig> {
        self.shared.lock(|state| state.features.waterproof_config())
    }

    pub fn proximity_set_config(&mut self, config: ProximityConfig) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState {
                hw,
                registry,
                features,
                ..
            } = state;
            features.proximity_set_config(hw, registry, config)
        })
    }

    pub fn proximity_config(&self) -> Option<ProximityConfig> {
        self.shared.lock(|state| state.features.proximity_config())
    }

    /// Accumulated measurement count of a proximity slot.
    pub fn proximity_meas_count(&self, slot: u8) -> Result<u32> {
        self.shared.lock(|state| {
            let DriverState { hw, features, .. } = state;
            features.proximity_meas_count(hw, slot)
        })
    }

    pub fn sleep_channel_configure(&mut self, config: SleepChannelConfig) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState {
                hw,
                registry,
                features,
                ..
            } = state;
            features.sleep_channel_configure(hw, registry, config)
        })
    }

    pub fn sleep_channel_disable(&mut self) -> Result<()> {
        self.shared.lock(|state| {
            let DriverState {
                hw,
                registry,
                features,
                ..
            } = state;
            features.sleep_channel_disable(hw, registry)
        })
    }

    pub fn sleep_channel_config(&self) -> Option<SleepChannelConfig> {
        self.shared
            .lock(|state| state.features.sleep_channel_config())
    }

    pub fn sleep_read_data(&self) -> Result<u32> {
        self.sleep_read(|hw| hw.sleep_read_data())
    }

    pub fn sleep_read_benchmark(&self) -> Result<u32> {
        self.sleep_read(|hw| hw.sleep_read_benchmark())
    }

    pub fn sleep_read_smoothed(&self) -> Result<u32> {
        self.sleep_read(|hw| hw.sleep_read_smoothed())
    }

    pub fn sleep_read_proximity_count(&self) -> Result<u32> {
        self.sleep_read(|hw| hw.sleep_read_proximity_count())
    }

    pub fn sleep_threshold(&self) -> Result<u32> {
        self.sleep_read(|hw| hw.sleep_threshold())
    }

    fn sleep_read(&self, f: impl FnOnce(&H) -> u32) -> Result<u32> {
        if !H::HAS_SLEEP_CHANNEL {
            return Err(TouchError::NotSupported);
        }

        self.shared.lock(|state| {
            if state.features.sleep_channel_config().is_none() {
                return Err(TouchError::NotInitialized);
            }
            Ok(f(&state.hw))
        })
    }

    // ------------------------------------------------------------------
    // Internals

    /// Run a scan-group mutation with the sequencer timer stopped, then
    /// restart it if it was running. Returns whether a restart happened.
    fn with_fsm_paused(
        &mut self,
        f: impl FnOnce(&mut DriverState<H>) -> Result<()>,
    ) -> Result<bool> {
        self.shared.lock(|state| {
            let was_running = state.fsm.state() == FsmState::TimerDriven;
            if was_running {
                let DriverState { hw, fsm, .. } = state;
                fsm.stop(hw);
            }

            let result = f(state);

            if was_running {
                let DriverState { hw, fsm, .. } = state;
                fsm.start(hw);
            }

            result.map(|_| was_running)
        })
    }

    /// Block for one full measurement cycle so the next reading is
    /// meaningful. Never called with the internal lock held.
    fn measure_wait(&mut self) {
        let ms = self.shared.lock(|state| state.fsm.measure_cycle_ms::<H>());
        self.delay.delay_ms(ms);
    }
}

impl<H, A, T, D> Drop for TouchDriver<H, A, T, D>
where
    H: TouchHw + 'static,
    A: InterruptAllocator,
    T: PeriodicTimer,
    D: DelayNs,
{
    fn drop(&mut self) {
        let _ = self.timer.stop();

        self.shared.lock(|state| {
            let DriverState {
                hw,
                registry,
                fsm,
                filter,
                filter_cb,
                ..
            } = state;

            fsm.stop(hw);
            hw.intr_disable(EnumSet::all());
            hw.intr_clear(EnumSet::all());
            registry.clear_all(hw);
            hw.reset_module();
            *filter = None;
            *filter_cb = None;
        });

        if let Some(handle) = self.isr_handle.take() {
            let _ = self.intr.deregister(handle);
        }
    }
}
