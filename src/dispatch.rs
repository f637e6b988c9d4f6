//! Demultiplexes hardware interrupt status bits into channel-level events
//! delivered to registered callbacks.
//!
//! The hardware can raise the scan-done interrupt while a trailing channel
//! of the scan group is still being measured. Dispatch therefore checks the
//! channel currently under measurement against the last channel of the
//! active scan mask and swallows the stray signal instead of forwarding it.

extern crate alloc;

use alloc::boxed::Box;

use enumset::EnumSet;
use log::{debug, warn};

use crate::config::TouchIntr;
use crate::errors::{Result, TouchError};
use crate::port::TouchHw;

/// Maximum number of simultaneously registered callbacks.
pub const MAX_ISR_HANDLERS: usize = 8;

/// A channel-level event delivered to a registered callback.
///
/// `value` carries the relevant raw reading for `Done` and `ScanDone`
/// events.
#[derive(Copy, Clone, Debug)]
pub struct TouchEvent {
    pub intr: TouchIntr,
    pub channel: u8,
    /// Snapshot of the touched-channel bitmask at dispatch time
    pub status_mask: u16,
    pub value: Option<u32>,
}

/// Callback invoked from interrupt context for each matching event.
/// Must not block and must not call back into the driver.
pub type EventCallback = Box<dyn FnMut(&TouchEvent) + Send>;

/// Token identifying one callback registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegistrationId(u32);

struct Registration {
    id: u32,
    mask: EnumSet<TouchIntr>,
    callback: EventCallback,
}

pub(crate) struct Dispatcher {
    slots: heapless::Vec<Registration, MAX_ISR_HANDLERS>,
    next_id: u32,
    prev_active: u16,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self {
            slots: heapless::Vec::new(),
            next_id: 0,
            prev_active: 0,
        }
    }

    pub(crate) fn register(
        &mut self,
        mask: EnumSet<TouchIntr>,
        callback: EventCallback,
    ) -> Result<RegistrationId> {
        if mask.is_empty() {
            return Err(TouchError::InvalidArg);
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        self.slots
            .push(Registration { id, mask, callback })
            .map_err(|_| TouchError::AllocationFailure)?;

        Ok(RegistrationId(id))
    }

    pub(crate) fn deregister(&mut self, id: RegistrationId) -> Result<()> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.id == id.0)
            .ok_or(TouchError::NotFound)?;

        self.slots.remove(index);
        Ok(())
    }

    /// Union of all registered category masks; the hardware interrupt
    /// enable set is kept in sync with this.
    pub(crate) fn enabled_union(&self) -> EnumSet<TouchIntr> {
        self.slots
            .iter()
            .fold(EnumSet::empty(), |acc, slot| acc | slot.mask)
    }

    /// Read, clear and demultiplex the pending interrupt status.
    ///
    /// Safe for ISR context: no blocking waits, no allocation. Active and
    /// inactive events are edge-detected against the previous touched-mask
    /// snapshot so one threshold crossing produces exactly one event even
    /// if the hardware re-raises the interrupt while the pad is held.
    pub(crate) fn dispatch<H: TouchHw>(&mut self, hw: &mut H) {
        let mut status = hw.intr_status();
        if status.is_empty() {
            return;
        }

        hw.intr_clear(status);

        let scan_mask = hw.channel_mask();
        let scan_last = if scan_mask == 0 {
            None
        } else {
            Some((15 - scan_mask.leading_zeros()) as u8)
        };

        if status.contains(TouchIntr::ScanDone) {
            let current = hw.current_meas_channel();
            if scan_last != Some(current) {
                // Stray scan-done raised before the true last channel
                // finished; drop it.
                debug!("swallowing stray scan-done on channel {current}");
                status.remove(TouchIntr::ScanDone);
            }
        }

        let active = hw.active_status_mask();

        for intr in status {
            match intr {
                TouchIntr::Done => {
                    let channel = hw.current_meas_channel();
                    let value = hw.read_raw(channel);
                    self.emit(&TouchEvent {
                        intr,
                        channel,
                        status_mask: active,
                        value: Some(value),
                    });
                }
                TouchIntr::Active => {
                    let mut rising = active & !self.prev_active;
                    while rising != 0 {
                        let channel = rising.trailing_zeros() as u8;
                        rising &= rising - 1;
                        self.emit(&TouchEvent {
                            intr,
                            channel,
                            status_mask: active,
                            value: None,
                        });
                    }
                }
                TouchIntr::Inactive => {
                    let mut falling = self.prev_active & !active;
                    while falling != 0 {
                        let channel = falling.trailing_zeros() as u8;
                        falling &= falling - 1;
                        self.emit(&TouchEvent {
                            intr,
                            channel,
                            status_mask: active,
                            value: None,
                        });
                    }
                }
                TouchIntr::ScanDone => {
                    if let Some(channel) = scan_last {
                        let value = hw.read_raw(channel);
                        self.emit(&TouchEvent {
                            intr,
                            channel,
                            status_mask: active,
                            value: Some(value),
                        });
                    }
                }
                TouchIntr::Timeout => {
                    let channel = hw.current_meas_channel();
                    warn!("touch measurement timeout on channel {channel}");
                    self.emit(&TouchEvent {
                        intr,
                        channel,
                        status_mask: active,
                        value: None,
                    });
                }
                TouchIntr::ProximityDone => {
                    let channel = hw.current_meas_channel();
                    self.emit(&TouchEvent {
                        intr,
                        channel,
                        status_mask: active,
                        value: None,
                    });
                }
            }
        }

        self.prev_active = active;
    }

    fn emit(&mut self, event: &TouchEvent) {
        for slot in self.slots.iter_mut() {
            if slot.mask.contains(event.intr) {
                (slot.callback)(event);
            }
        }
    }
}
