use core::fmt;

/// Error kinds surfaced by the touch driver.
///
/// Configuration-path errors are always returned synchronously to the
/// caller; the interrupt dispatch path never propagates errors outward
/// (timeouts are delivered as events instead).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchError {
    /// Out-of-range channel, threshold, mask or config field
    InvalidArg,
    /// Operation not valid for the current FSM state
    InvalidState,
    /// An exclusive channel role is already assigned to another channel
    RoleConflict,
    /// Operation before the subsystem (or the software filter) was started
    NotInitialized,
    /// An underlying resource (interrupt slot, timer) could not be created
    AllocationFailure,
    /// Measurement returned the reserved-invalid zero value
    HardwareFault,
    /// Feature not present on this hardware generation
    NotSupported,
    /// Requested registration not found
    NotFound,
    /// Bounded wait for the hardware expired
    Timeout,
}

pub type Result<T, E = TouchError> = core::result::Result<T, E>;

impl fmt::Display for TouchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match self {
            TouchError::InvalidArg => "invalid argument",
            TouchError::InvalidState => "invalid state",
            TouchError::RoleConflict => "channel role already assigned",
            TouchError::NotInitialized => "not initialized",
            TouchError::AllocationFailure => "resource allocation failed",
            TouchError::HardwareFault => "hardware returned an invalid measurement",
            TouchError::NotSupported => "not supported on this hardware generation",
            TouchError::NotFound => "registration not found",
            TouchError::Timeout => "timed out waiting for hardware",
        };

        write!(f, "{desc}")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TouchError {}
