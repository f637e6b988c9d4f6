//! Shared data model: FSM modes, channel roles, interrupt categories and
//! the configuration structs applied through the driver.

use enumset::EnumSetType;

/// Upper bound on the per-generation channel count, used to size the
/// driver's channel tables. Concrete ports report their real count through
/// [`TouchHw::CHANNEL_COUNT`](crate::port::TouchHw::CHANNEL_COUNT).
pub const MAX_TOUCH_CHANNELS: usize = 16;

/// How the hardware measurement sequencer is triggered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum FsmMode {
    /// Scanning repeats under the control of the hardware sleep timer
    #[default]
    Timer,
    /// Each scan pass is started explicitly by software
    Software,
}

/// Interrupt categories delivered by the touch peripheral.
#[derive(Debug, EnumSetType)]
pub enum TouchIntr {
    /// Measurement of the current channel completed
    Done,
    /// A channel crossed its threshold into the touched state
    Active,
    /// A channel returned below its threshold
    Inactive,
    /// The sequencer finished one pass over the scan group
    ScanDone,
    /// A channel exceeded the measurement timeout
    Timeout,
    /// A proximity channel completed its accumulated measurement
    ProximityDone,
}

/// Special function a channel can be assigned.
///
/// Denoise and shield channels are measured by the hardware alongside the
/// active channel and are therefore excluded from the normal scan group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TouchRole {
    #[default]
    Normal,
    Denoise,
    WaterproofGuard,
    WaterproofShield,
    /// Proximity accumulator, slot index 0..=2
    Proximity(u8),
    /// Low-power wake channel
    Sleep,
}

impl TouchRole {
    /// Roles that may be held by at most one channel at a time.
    pub(crate) fn is_exclusive(&self) -> bool {
        !matches!(self, TouchRole::Normal)
    }

    /// Whether a channel with this role takes part in the normal scan group.
    pub(crate) fn scans_normally(&self) -> bool {
        !matches!(self, TouchRole::Denoise | TouchRole::WaterproofShield)
    }
}

/// Charge/discharge cycle counts and the sleep interval between scan passes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeasureConfig {
    /// Charge and discharge cycles per measurement, in fast-clock ticks
    pub charge_times: u16,
    /// Sleep interval between measurements, in slow-clock ticks
    pub interval_ticks: u16,
}

impl MeasureConfig {
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn charge_times(mut self, charge_times: u16) -> Self {
        self.charge_times = charge_times;
        self
    }

    #[must_use]
    pub fn interval_ticks(mut self, interval_ticks: u16) -> Self {
        self.interval_ticks = interval_ticks;
        self
    }
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            charge_times: 500,
            interval_ticks: 0xf,
        }
    }
}

/// Upper limit of the channel voltage while charging.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum VoltageHigh {
    V2p4,
    V2p5,
    V2p6,
    #[default]
    V2p7,
}

/// Lower limit of the channel voltage while discharging.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum VoltageLow {
    #[default]
    V0p5,
    V0p6,
    V0p7,
    V0p8,
}

/// Attenuation applied to the high voltage limit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum VoltageAtten {
    #[default]
    A0p5,
    A1p0,
    A1p5,
    None,
}

/// Charge/discharge voltage window of the measurement circuit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct VoltageConfig {
    pub high: VoltageHigh,
    pub low: VoltageLow,
    pub atten: VoltageAtten,
}

impl VoltageConfig {
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn high(mut self, high: VoltageHigh) -> Self {
        self.high = high;
        self
    }

    #[must_use]
    pub fn low(mut self, low: VoltageLow) -> Self {
        self.low = low;
        self
    }

    #[must_use]
    pub fn atten(mut self, atten: VoltageAtten) -> Self {
        self.atten = atten;
        self
    }
}

/// Connection of enabled-but-idle channels during another channel's
/// measurement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum IdleConnection {
    HighZ,
    #[default]
    Gnd,
}

/// Filter mode of the native smoothing/benchmark circuit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Iir4,
    Iir8,
    Iir16,
    Iir32,
    Iir64,
    Iir128,
    Iir256,
    Jitter,
}

/// Smoothed-data filter level of the native circuit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SmoothMode {
    Off,
    Iir2,
    Iir4,
    Iir8,
}

pub(crate) const FILTER_DEBOUNCE_MAX: u8 = 7;
pub(crate) const FILTER_NOISE_THRESHOLD_MAX: u8 = 3;
pub(crate) const FILTER_JITTER_STEP_MAX: u8 = 15;

/// Configuration of the native hardware filter (generations with a
/// smoothing/benchmark circuit).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    pub mode: FilterMode,
    /// Benchmark update debounce, 0..=7 consecutive readings
    pub debounce_count: u8,
    /// Noise threshold coefficient, 0..=3
    pub noise_threshold: u8,
    /// Jitter filter step size, 0..=15 (jitter mode only)
    pub jitter_step: u8,
    pub smooth_mode: SmoothMode,
}

impl FilterConfig {
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn debounce_count(mut self, debounce_count: u8) -> Self {
        self.debounce_count = debounce_count;
        self
    }

    #[must_use]
    pub fn noise_threshold(mut self, noise_threshold: u8) -> Self {
        self.noise_threshold = noise_threshold;
        self
    }

    #[must_use]
    pub fn jitter_step(mut self, jitter_step: u8) -> Self {
        self.jitter_step = jitter_step;
        self
    }

    #[must_use]
    pub fn smooth_mode(mut self, smooth_mode: SmoothMode) -> Self {
        self.smooth_mode = smooth_mode;
        self
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            mode: FilterMode::Iir16,
            debounce_count: 1,
            noise_threshold: 0,
            jitter_step: 4,
            smooth_mode: SmoothMode::Iir2,
        }
    }
}

/// Configuration of the legacy software IIR filter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SoftFilterConfig {
    /// Refresh period of the filter timer, in milliseconds
    pub period_ms: u32,
    /// IIR weight; 0 bypasses the filter entirely
    pub factor: u32,
}

impl SoftFilterConfig {
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn period_ms(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms;
        self
    }

    #[must_use]
    pub fn factor(mut self, factor: u32) -> Self {
        self.factor = factor;
        self
    }
}

impl Default for SoftFilterConfig {
    fn default() -> Self {
        Self {
            period_ms: 10,
            factor: 4,
        }
    }
}

/// Bit-cancellation depth of the denoise channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DenoiseGrade {
    Bit12,
    Bit10,
    Bit8,
    #[default]
    Bit4,
}

/// Internal reference capacitance of the denoise channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DenoiseCap {
    #[default]
    L0,
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
    L7,
}

/// Denoise (internal reference channel) configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct DenoiseConfig {
    pub grade: DenoiseGrade,
    pub cap_level: DenoiseCap,
}

impl DenoiseConfig {
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn grade(mut self, grade: DenoiseGrade) -> Self {
        self.grade = grade;
        self
    }

    #[must_use]
    pub fn cap_level(mut self, cap_level: DenoiseCap) -> Self {
        self.cap_level = cap_level;
        self
    }
}

/// Drive strength of the waterproof shield channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ShieldDriver {
    #[default]
    L0,
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
    L7,
}

/// Waterproof guard-ring and shield configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WaterproofConfig {
    /// Channel used as the guard ring
    pub guard_channel: u8,
    pub shield_driver: ShieldDriver,
}

impl WaterproofConfig {
    pub fn new(guard_channel: u8) -> Self {
        Self {
            guard_channel,
            shield_driver: ShieldDriver::L0,
        }
    }

    #[must_use]
    pub fn shield_driver(mut self, shield_driver: ShieldDriver) -> Self {
        self.shield_driver = shield_driver;
        self
    }
}

/// Number of proximity accumulator slots.
pub const PROXIMITY_SLOT_COUNT: usize = 3;

pub(crate) const PROXIMITY_COUNT_MAX: u32 = 0xff;

/// Proximity sensing configuration: up to three channels accumulating
/// `count` measurement cycles each. Slots holding the port's unused-channel
/// sentinel are disabled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProximityConfig {
    pub channels: [u8; PROXIMITY_SLOT_COUNT],
    pub count: u32,
}

impl ProximityConfig {
    pub fn new(channels: [u8; PROXIMITY_SLOT_COUNT]) -> Self {
        Self {
            channels,
            count: 32,
        }
    }

    #[must_use]
    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}

/// Wake channel configuration for low-power modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SleepChannelConfig {
    pub channel: u8,
    pub threshold: u32,
    /// Link the wake channel to the proximity accumulator
    pub proximity: bool,
}

impl SleepChannelConfig {
    pub fn new(channel: u8, threshold: u32) -> Self {
        Self {
            channel,
            threshold,
            proximity: false,
        }
    }

    #[must_use]
    pub fn proximity(mut self, proximity: bool) -> Self {
        self.proximity = proximity;
        self
    }
}
