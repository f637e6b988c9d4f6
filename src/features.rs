//! Composition of the cross-cutting feature blocks: denoise channel,
//! waterproof guard/shield, proximity accumulation and the low-power wake
//! channel. Each setter validates against the generation capabilities,
//! programs the hardware and updates the channel registry; each getter is
//! an exact round-trip of the last applied configuration.

use log::debug;

use crate::config::{
    DenoiseConfig, ProximityConfig, SleepChannelConfig, TouchRole, WaterproofConfig,
    PROXIMITY_COUNT_MAX, PROXIMITY_SLOT_COUNT,
};
use crate::errors::{Result, TouchError};
use crate::port::TouchHw;
use crate::registry::ChannelRegistry;

#[derive(Default)]
pub(crate) struct FeatureState {
    denoise: Option<DenoiseConfig>,
    denoise_enabled: bool,
    waterproof: Option<WaterproofConfig>,
    waterproof_enabled: bool,
    proximity: Option<ProximityConfig>,
    sleep: Option<SleepChannelConfig>,
}

impl FeatureState {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Enable the internal reference channel. The denoise channel is
    /// measured automatically alongside the active channel and never joins
    /// the normal scan group.
    pub(crate) fn denoise_enable<H: TouchHw>(
        &mut self,
        hw: &mut H,
        registry: &mut ChannelRegistry,
        config: DenoiseConfig,
    ) -> Result<()> {
        if !H::HAS_DENOISE {
            return Err(TouchError::NotSupported);
        }

        registry.configure(hw, H::DENOISE_CHANNEL, TouchRole::Denoise)?;
        hw.denoise_set_config(config.grade, config.cap_level);
        hw.denoise_enable(true);

        self.denoise = Some(config);
        self.denoise_enabled = true;
        debug!("denoise enabled: {config:?}");
        Ok(())
    }

    pub(crate) fn denoise_disable<H: TouchHw>(&mut self, hw: &mut H) -> Result<()> {
        if !H::HAS_DENOISE {
            return Err(TouchError::NotSupported);
        }

        hw.denoise_enable(false);
        self.denoise_enabled = false;
        Ok(())
    }

    pub(crate) fn denoise_config(&self) -> Option<DenoiseConfig> {
        self.denoise
    }

    /// Enable the guard ring and shield drivers. The shield channel is IO
    /// initialized but excluded from the scan group; the guard ring is a
    /// normally scanned channel.
    pub(crate) fn waterproof_enable<H: TouchHw>(
        &mut self,
        hw: &mut H,
        registry: &mut ChannelRegistry,
        config: WaterproofConfig,
    ) -> Result<()> {
        if !H::HAS_WATERPROOF {
            return Err(TouchError::NotSupported);
        }

        registry.check_channel(config.guard_channel)?;
        if config.guard_channel == H::SHIELD_CHANNEL {
            return Err(TouchError::InvalidArg);
        }

        registry.configure(hw, config.guard_channel, TouchRole::WaterproofGuard)?;
        registry.configure(hw, H::SHIELD_CHANNEL, TouchRole::WaterproofShield)?;

        hw.waterproof_set_config(config.guard_channel, config.shield_driver);
        hw.waterproof_enable(true);

        self.waterproof = Some(config);
        self.waterproof_enabled = true;
        debug!("waterproof enabled: {config:?}");
        Ok(())
    }

    pub(crate) fn waterproof_disable<H: TouchHw>(&mut self, hw: &mut H) -> Result<()> {
        if !H::HAS_WATERPROOF {
            return Err(TouchError::NotSupported);
        }

        hw.waterproof_enable(false);
        self.waterproof_enabled = false;
        Ok(())
    }

    pub(crate) fn waterproof_config(&self) -> Option<WaterproofConfig> {
        self.waterproof
    }

    /// Program the proximity accumulator slots. A slot holding the port's
    /// unused-channel sentinel is disabled; re-assigning a slot releases
    /// the previous owner back to a normal scan role.
    pub(crate) fn proximity_set_config<H: TouchHw>(
        &mut self,
        hw: &mut H,
        registry: &mut ChannelRegistry,
        config: ProximityConfig,
    ) -> Result<()> {
        if !H::HAS_PROXIMITY {
            return Err(TouchError::NotSupported);
        }

        if config.count > PROXIMITY_COUNT_MAX {
            return Err(TouchError::InvalidArg);
        }
        for &channel in &config.channels {
            if channel != H::UNUSED_CHANNEL {
                registry.check_channel(channel)?;
            }
        }

        for (slot, &channel) in config.channels.iter().enumerate() {
            let role = TouchRole::Proximity(slot as u8);
            if let Some(owner) = registry.role_owner(role) {
                if owner != channel {
                    registry.reset_role(owner);
                }
            }

            if channel == H::UNUSED_CHANNEL {
                hw.proximity_set_channel(slot as u8, H::UNUSED_CHANNEL);
            } else {
                registry.configure(hw, channel, role)?;
                hw.proximity_set_channel(slot as u8, channel);
            }
        }

        hw.proximity_set_count(config.count);
        self.proximity = Some(config);
        Ok(())
    }

    pub(crate) fn proximity_config(&self) -> Option<ProximityConfig> {
        self.proximity
    }

    pub(crate) fn proximity_meas_count<H: TouchHw>(&self, hw: &H, slot: u8) -> Result<u32> {
        if !H::HAS_PROXIMITY {
            return Err(TouchError::NotSupported);
        }
        if slot as usize >= PROXIMITY_SLOT_COUNT {
            return Err(TouchError::InvalidArg);
        }

        Ok(hw.proximity_meas_count(slot))
    }

    /// Designate the wake channel used in low-power modes, with its own
    /// threshold and optional proximity linkage. Only one wake channel may
    /// exist; disable it before moving the role.
    pub(crate) fn sleep_channel_configure<H: TouchHw>(
        &mut self,
        hw: &mut H,
        registry: &mut ChannelRegistry,
        config: SleepChannelConfig,
    ) -> Result<()> {
        if !H::HAS_SLEEP_CHANNEL {
            return Err(TouchError::NotSupported);
        }
        if config.proximity && !H::HAS_PROXIMITY {
            return Err(TouchError::NotSupported);
        }
        if config.threshold > H::THRESHOLD_MAX {
            return Err(TouchError::InvalidArg);
        }

        registry.configure(hw, config.channel, TouchRole::Sleep)?;
        hw.sleep_channel_set(config.channel, true);
        hw.sleep_set_threshold(config.threshold);
        hw.sleep_enable_proximity(config.proximity);

        self.sleep = Some(config);
        debug!("sleep channel configured: {config:?}");
        Ok(())
    }

    pub(crate) fn sleep_channel_disable<H: TouchHw>(
        &mut self,
        hw: &mut H,
        registry: &mut ChannelRegistry,
    ) -> Result<()> {
        if !H::HAS_SLEEP_CHANNEL {
            return Err(TouchError::NotSupported);
        }

        if let Some(config) = self.sleep.take() {
            hw.sleep_channel_set(config.channel, false);
            hw.sleep_enable_proximity(false);
            registry.reset_role(config.channel);
        }

        Ok(())
    }

    pub(crate) fn sleep_channel_config(&self) -> Option<SleepChannelConfig> {
        self.sleep
    }

    pub(crate) fn denoise_enabled(&self) -> bool {
        self.denoise_enabled
    }

    pub(crate) fn waterproof_enabled(&self) -> bool {
        self.waterproof_enabled
    }
}
