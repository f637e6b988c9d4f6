//! Single source of truth for channel configuration and role exclusivity.
//!
//! The registry owns the bookkeeping; hardware side effects are issued
//! through the port passed into each mutating call so the two can never
//! drift apart.

use log::debug;

use crate::config::{TouchRole, MAX_TOUCH_CHANNELS};
use crate::errors::{Result, TouchError};
use crate::port::TouchHw;

#[derive(Copy, Clone, Default)]
struct ChannelSlot {
    enabled: bool,
    role: TouchRole,
}

pub(crate) struct ChannelRegistry {
    channels: [ChannelSlot; MAX_TOUCH_CHANNELS],
    count: u8,
}

impl ChannelRegistry {
    pub(crate) fn new(count: u8) -> Self {
        debug_assert!(count as usize <= MAX_TOUCH_CHANNELS);

        Self {
            channels: [ChannelSlot::default(); MAX_TOUCH_CHANNELS],
            count,
        }
    }

    pub(crate) fn check_channel(&self, channel: u8) -> Result<()> {
        if channel >= self.count {
            return Err(TouchError::InvalidArg);
        }

        Ok(())
    }

    /// Enroll a channel with the given role.
    ///
    /// Exclusive roles may be re-asserted on their current owner but
    /// conflict when claimed by a different channel. Channels whose role
    /// forbids normal scanning (denoise, shield) are kept out of the scan
    /// group mask.
    pub(crate) fn configure<H: TouchHw>(
        &mut self,
        hw: &mut H,
        channel: u8,
        role: TouchRole,
    ) -> Result<()> {
        self.check_channel(channel)?;

        if role.is_exclusive() {
            if let Some(owner) = self.role_owner(role) {
                if owner != channel {
                    return Err(TouchError::RoleConflict);
                }
            }
        }

        hw.io_init(channel);

        let slot = &mut self.channels[channel as usize];
        slot.enabled = true;
        slot.role = role;

        if role.scans_normally() {
            hw.set_channel_mask(1 << channel);
        } else {
            hw.clear_channel_mask(1 << channel);
        }

        debug!("touch channel {channel} configured as {role:?}");
        Ok(())
    }

    /// Remove a channel from the scan group and drop its role.
    pub(crate) fn clear<H: TouchHw>(&mut self, hw: &mut H, channel: u8) -> Result<()> {
        self.check_channel(channel)?;

        self.channels[channel as usize] = ChannelSlot::default();
        hw.clear_channel_mask(1 << channel);
        Ok(())
    }

    pub(crate) fn clear_all<H: TouchHw>(&mut self, hw: &mut H) {
        for channel in 0..self.count {
            self.channels[channel as usize] = ChannelSlot::default();
        }

        hw.clear_channel_mask(self.full_mask());
    }

    pub(crate) fn set_threshold<H: TouchHw>(
        &self,
        hw: &mut H,
        channel: u8,
        value: u32,
    ) -> Result<()> {
        self.check_channel(channel)?;
        if value > H::THRESHOLD_MAX {
            return Err(TouchError::InvalidArg);
        }

        hw.set_threshold(channel, value);
        Ok(())
    }

    pub(crate) fn threshold<H: TouchHw>(&self, hw: &H, channel: u8) -> Result<u32> {
        self.check_channel(channel)?;
        Ok(hw.threshold(channel))
    }

    /// Return a channel's role to `Normal` without touching its scan-group
    /// membership.
    pub(crate) fn reset_role(&mut self, channel: u8) {
        if (channel as usize) < MAX_TOUCH_CHANNELS {
            self.channels[channel as usize].role = TouchRole::Normal;
        }
    }

    pub(crate) fn role(&self, channel: u8) -> TouchRole {
        self.channels[channel as usize].role
    }

    pub(crate) fn role_owner(&self, role: TouchRole) -> Option<u8> {
        (0..self.count).find(|&ch| {
            let slot = &self.channels[ch as usize];
            slot.enabled && slot.role == role
        })
    }

    /// Mask of enabled channels that take part in the normal scan group.
    pub(crate) fn enabled_scan_mask(&self) -> u16 {
        let mut mask = 0;
        for channel in 0..self.count {
            let slot = &self.channels[channel as usize];
            if slot.enabled && slot.role.scans_normally() {
                mask |= 1 << channel;
            }
        }

        mask
    }

    pub(crate) fn full_mask(&self) -> u16 {
        ((1u32 << self.count) - 1) as u16
    }
}
