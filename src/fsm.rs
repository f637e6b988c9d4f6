//! Software state machine wrapped around the hardware measurement
//! sequencer: start/stop ordering, trigger mode changes and the
//! measurement-cycle wait arithmetic.

use log::debug;

use crate::config::{FsmMode, MeasureConfig};
use crate::errors::{Result, TouchError};
use crate::port::TouchHw;

/// Driver-side view of the sequencer.
///
/// `SoftwareTriggered` carries a transient measuring flag set by
/// `trigger_once` and cleared when the measurement-done signal is
/// consumed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FsmState {
    Idle,
    SoftwareTriggered,
    TimerDriven,
}

pub(crate) struct FsmController {
    state: FsmState,
    mode: FsmMode,
    measuring: bool,
    charge_times: u16,
    interval_ticks: u16,
}

impl FsmController {
    pub(crate) fn new() -> Self {
        let defaults = MeasureConfig::default();

        Self {
            state: FsmState::Idle,
            mode: FsmMode::default(),
            measuring: false,
            charge_times: defaults.charge_times,
            interval_ticks: defaults.interval_ticks,
        }
    }

    pub(crate) fn state(&self) -> FsmState {
        self.state
    }

    pub(crate) fn mode(&self) -> FsmMode {
        self.mode
    }

    pub(crate) fn apply_measure_config<H: TouchHw>(
        &mut self,
        hw: &mut H,
        config: &MeasureConfig,
    ) {
        self.charge_times = config.charge_times;
        self.interval_ticks = config.interval_ticks;
        hw.set_meas_times(config.charge_times);
        hw.set_sleep_time(config.interval_ticks);
    }

    /// Change the trigger mode. Any running sequencer is stopped first;
    /// only timer mode restarts automatically.
    pub(crate) fn set_mode<H: TouchHw>(&mut self, hw: &mut H, mode: FsmMode) {
        if self.state != FsmState::Idle {
            self.stop(hw);
        }

        self.mode = mode;
        hw.set_fsm_mode(mode);

        if mode == FsmMode::Timer {
            self.start(hw);
        }
    }

    pub(crate) fn start<H: TouchHw>(&mut self, hw: &mut H) {
        hw.enable_clock_gate(true);
        hw.clear_active_status();

        self.state = match self.mode {
            FsmMode::Timer => {
                hw.start_fsm();
                FsmState::TimerDriven
            }
            FsmMode::Software => FsmState::SoftwareTriggered,
        };

        debug!("touch fsm started in {:?}", self.state);
    }

    /// Stop the sequencer. The in-flight measurement is forced to
    /// completion so the timer never wedges waiting for a done signal.
    pub(crate) fn stop<H: TouchHw>(&mut self, hw: &mut H) {
        hw.stop_fsm();
        hw.force_done();
        hw.enable_clock_gate(false);
        self.state = FsmState::Idle;
        self.measuring = false;
    }

    /// Kick off one software-triggered scan pass.
    pub(crate) fn trigger_once<H: TouchHw>(&mut self, hw: &mut H) -> Result<()> {
        if self.state != FsmState::SoftwareTriggered {
            return Err(TouchError::InvalidState);
        }

        hw.start_sw_measurement();
        self.measuring = true;
        Ok(())
    }

    pub(crate) fn measuring(&self) -> bool {
        self.measuring
    }

    /// Consume the measurement-done signal after a software trigger.
    pub(crate) fn measurement_done(&mut self) {
        self.measuring = false;
    }

    /// Duration of one full measurement cycle (sleep interval plus the
    /// charge/discharge phase), rounded up to at least one millisecond.
    /// Timer-mode reads are not meaningful before this has elapsed once.
    pub(crate) fn measure_cycle_ms<H: TouchHw>(&self) -> u32 {
        let sleep_ms = self.interval_ticks as u64 * 1000 / H::SLOW_CLK_HZ as u64;
        let meas_ms = self.charge_times as u64 * 1000 / H::FAST_CLK_HZ as u64;

        (sleep_ms + meas_ms).max(1) as u32
    }
}
