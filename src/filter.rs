//! Software IIR filtering for hardware generations without a native
//! smoothing/benchmark circuit, and validation of the native filter
//! configuration for generations that have one.
//!
//! The software filter is a single-pole IIR in fixed point. Values are kept
//! left-shifted by [`FILTER_SHIFT`] bits internally so repeated averaging
//! keeps a fractional part; the exposed value adds half an LSB before
//! shifting back down.

use crate::config::{
    FilterConfig, SoftFilterConfig, FILTER_DEBOUNCE_MAX, FILTER_JITTER_STEP_MAX,
    FILTER_NOISE_THRESHOLD_MAX, MAX_TOUCH_CHANNELS,
};
use crate::errors::{Result, TouchError};

/// Fixed-point shift of the internal accumulator.
pub(crate) const FILTER_SHIFT: u32 = 4;

const FILTER_ROUND: u64 = 1 << (FILTER_SHIFT - 1);

/// One IIR step: `(in_now + (k - 1) * out_last) / k`, operating on
/// already-shifted values. `k == 0` bypasses the filter.
pub(crate) fn iir_update(in_now: u32, out_last: u32, k: u32) -> u32 {
    if k == 0 {
        return in_now;
    }

    let sum = in_now as u64 + (k as u64 - 1) * out_last as u64;
    (sum / k as u64) as u32
}

#[derive(Copy, Clone, Default)]
struct ChannelFilter {
    raw: u32,
    /// Accumulator, left-shifted by `FILTER_SHIFT`
    shifted: u32,
    seeded: bool,
}

/// Per-channel software filter state for one device.
pub(crate) struct SoftFilter {
    factor: u32,
    period_ms: u32,
    channels: [ChannelFilter; MAX_TOUCH_CHANNELS],
}

impl SoftFilter {
    pub(crate) fn new(config: SoftFilterConfig) -> Result<Self> {
        if config.period_ms == 0 || config.period_ms > u16::MAX as u32 {
            return Err(TouchError::InvalidArg);
        }

        Ok(Self {
            factor: config.factor,
            period_ms: config.period_ms,
            channels: [ChannelFilter::default(); MAX_TOUCH_CHANNELS],
        })
    }

    pub(crate) fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub(crate) fn set_period_ms(&mut self, period_ms: u32) -> Result<()> {
        if period_ms == 0 || period_ms > u16::MAX as u32 {
            return Err(TouchError::InvalidArg);
        }

        self.period_ms = period_ms;
        Ok(())
    }

    /// Feed one raw reading into the channel's filter.
    ///
    /// A raw value of zero is the reserved measurement-fault marker and is
    /// dropped without touching the filter state. The first valid sample
    /// seeds the accumulator directly so the output does not ramp up from
    /// zero.
    pub(crate) fn update(&mut self, channel: u8, raw: u32) {
        if raw == 0 {
            return;
        }

        let slot = &mut self.channels[channel as usize];
        slot.raw = raw;

        let shifted_in = raw << FILTER_SHIFT;
        if !slot.seeded {
            slot.shifted = shifted_in;
            slot.seeded = true;
        } else {
            slot.shifted = iir_update(shifted_in, slot.shifted, self.factor);
        }
    }

    /// Last raw and filtered values of a channel, or `None` if the filter
    /// has never run for it.
    pub(crate) fn value(&self, channel: u8) -> Option<(u32, u32)> {
        let slot = &self.channels[channel as usize];
        if !slot.seeded {
            return None;
        }

        let filtered = ((slot.shifted as u64 + FILTER_ROUND) >> FILTER_SHIFT) as u32;
        Some((slot.raw, filtered))
    }
}

/// Range-check a native filter configuration against the register field
/// widths.
pub(crate) fn validate_filter_config(config: &FilterConfig) -> Result<()> {
    if config.debounce_count > FILTER_DEBOUNCE_MAX
        || config.noise_threshold > FILTER_NOISE_THRESHOLD_MAX
        || config.jitter_step > FILTER_JITTER_STEP_MAX
    {
        return Err(TouchError::InvalidArg);
    }

    Ok(())
}
